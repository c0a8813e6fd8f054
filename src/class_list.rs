use indexmap::IndexSet;

/// Ordered set of CSS class tokens backing an element's `class` attribute.
///
/// Tokens keep first-insertion order so the rendered attribute stays stable,
/// and adding a token that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: IndexSet<String>,
}

impl ClassList {
    /// Split a `class` attribute on ASCII whitespace.  Duplicate tokens already
    /// present in the attribute collapse into one.
    pub fn parse(attr: &str) -> Self {
        Self {
            tokens: attr.split_ascii_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Returns `true` if the token was not present before.
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.tokens.contains(token) {
            return false;
        }
        self.tokens.insert(token.to_owned())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl std::fmt::Display for ClassList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_if_absent() {
        let mut list = ClassList::parse("js no-touch");
        assert!(list.add("overflow-support"));
        assert!(!list.add("overflow-support"));
        assert!(!list.add("js"));
        assert_eq!(list.to_string(), "js no-touch overflow-support");
    }

    #[test]
    fn parse_collapses_whitespace_and_duplicates() {
        let list = ClassList::parse("  a\tb  a\n");
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "a b");
    }

    #[test]
    fn empty_token_is_ignored() {
        let mut list = ClassList::default();
        assert!(!list.add(""));
        assert!(list.is_empty());
    }
}

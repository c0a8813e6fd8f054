/// Simple semver-ish comparison: is `a < b`?  Compares dot-separated numeric
/// components left to right (missing components treated as 0).
pub(crate) fn version_lt(a: &str, b: &str) -> bool {
    let mut ai = a.split('.');
    let mut bi = b.split('.');
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return false,
            (None, Some(bv)) => return bv.parse::<u32>().unwrap_or(0) > 0,
            (Some(_), None) => return false,
            (Some(av), Some(bv)) => {
                let an = av.parse::<u32>().unwrap_or(0);
                let bn = bv.parse::<u32>().unwrap_or(0);
                if an < bn {
                    return true;
                }
                if an > bn {
                    return false;
                }
            }
        }
    }
}

/// Does the OS version string begin with `prefix`?  `"unknown"` never matches
/// a digit prefix, so unknown versions fall through every blacklist check.
pub(crate) fn version_starts_with(version: &str, prefix: &str) -> bool {
    version.starts_with(prefix)
}

/// First character of the version string, or `'0'` when it is empty.
pub(crate) fn major_version_char(version: &str) -> char {
    version.chars().next().unwrap_or('0')
}

/// Take `n` characters of `s` starting at byte offset `start`, clamped to the
/// end of the string.
pub(crate) fn take_chars(s: &str, start: usize, n: usize) -> &str {
    let Some(rest) = s.get(start..) else {
        return "";
    };
    let end = rest
        .char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lt_compares_numerically() {
        assert!(version_lt("27", "28"));
        assert!(version_lt("9.5", "28"));
        assert!(!version_lt("28", "28"));
        assert!(!version_lt("100", "28"));
    }

    #[test]
    fn major_char_of_empty_is_zero() {
        assert_eq!(major_version_char(""), '0');
        assert_eq!(major_version_char("4.4"), '4');
        assert_eq!(major_version_char("unknown"), 'u');
    }

    #[test]
    fn take_chars_clamps() {
        assert_eq!(take_chars("OS 7_1 like", 3, 3), "7_1");
        assert_eq!(take_chars("Android 4", 8, 3), "4");
        assert_eq!(take_chars("abc", 10, 3), "");
    }
}

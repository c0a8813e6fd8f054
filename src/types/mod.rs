mod operating_system;
mod viewport;

pub use operating_system::*;
pub use viewport::*;

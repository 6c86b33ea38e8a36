pub mod attribute;
pub mod extent;

// Foundation crate: small, well-tested primitives only.
pub use attribute::*;
pub use extent::*;

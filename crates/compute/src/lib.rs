pub mod analysis;

pub use analysis::coerce::*;
pub use analysis::summary::*;

pub mod legend;
pub mod popup;
pub mod sequence;
pub mod symbology;
pub mod symbols;

pub use legend::*;
pub use popup::*;
pub use sequence::*;
pub use symbology::*;
pub use symbols::*;

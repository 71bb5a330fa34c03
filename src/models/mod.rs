pub mod analysis;
pub mod enums;

pub use analysis::*;
pub use enums::*;

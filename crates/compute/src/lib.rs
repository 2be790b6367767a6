pub mod analysis;
pub mod measure;

pub use analysis::*;
pub use measure::*;

pub mod group;
pub mod mode;
pub mod preview;
pub mod session;
pub mod style;

pub use group::*;
pub use mode::*;
pub use preview::*;
pub use session::*;
pub use style::*;

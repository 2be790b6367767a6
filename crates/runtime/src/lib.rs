pub mod clock;
pub mod event_bus;
pub mod watchdog;

pub use clock::*;
pub use event_bus::*;
pub use watchdog::*;

pub mod crs;
pub mod datum;
pub mod geodesy;
pub mod projection;

pub use crs::*;
pub use datum::*;
pub use geodesy::*;
pub use projection::*;

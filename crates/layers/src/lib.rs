pub mod annotation;
pub mod config;
pub mod fetch;
pub mod heatmap;
pub mod layer;
pub mod marker;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod surface;

pub use annotation::*;
pub use config::*;
pub use fetch::*;
pub use heatmap::*;
pub use layer::*;
pub use marker::*;
pub use orchestrator::*;
pub use registry::*;
pub use session::*;
pub use surface::*;

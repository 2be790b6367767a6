pub mod baidu;
pub mod ogc;
pub mod source;
pub mod template;
pub mod tile;

pub use baidu::*;
pub use ogc::*;
pub use source::*;
pub use template::*;
pub use tile::*;

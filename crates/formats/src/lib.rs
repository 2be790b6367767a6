pub mod drawing_feature;
pub mod map_config;
pub mod vector_chunk;

pub use drawing_feature::*;
pub use map_config::*;
pub use vector_chunk::*;

pub mod decoder;
pub mod files;

pub use decoder::*;
pub use files::*;

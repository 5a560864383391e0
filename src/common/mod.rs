//! Common module - seam traits and shared formatting helpers

pub mod traits;
pub mod utils;

pub use traits::*;
pub use utils::*;

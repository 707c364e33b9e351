//! Request/response bodies

mod error;
mod image;

pub use error::*;
pub use image::*;

//! Domain types and error taxonomy shared by the generation core and its front ends.

pub mod domain;
pub mod error;

pub use domain::{Description, GenerationResult, ImagePreview, MediaType, UploadedImage};
pub use error::{GenerationError, Stage};

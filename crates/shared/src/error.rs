use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FAILURE_PREFIX: &str = "Failed to create your memoji. Please try again. Details: ";
pub const UNKNOWN_FAILURE_DETAIL: &str = "An unknown error occurred.";
pub const INTERNAL_CONSISTENCY_MESSAGE: &str =
    "Something went wrong displaying the result. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Describe,
    SynthesizeImage,
    SynthesizeBio,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Describe => "describe",
            Stage::SynthesizeImage => "image synthesis",
            Stage::SynthesizeBio => "bio synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Transport, auth, or quota failure reported by the generation service.
    #[error("{0}")]
    Service(String),
    #[error("The {stage} step returned no text.")]
    EmptyResponse { stage: Stage },
    #[error("Image generation failed or returned no images.")]
    NoImageReturned,
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("generation result is incomplete")]
    InternalConsistency,
}

impl GenerationError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    /// Single human-readable string shown in the error view.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::InternalConsistency => INTERNAL_CONSISTENCY_MESSAGE.to_string(),
            other => {
                let detail = other.to_string();
                let detail = detail.trim();
                if detail.is_empty() {
                    format!("{FAILURE_PREFIX}{UNKNOWN_FAILURE_DETAIL}")
                } else {
                    format!("{FAILURE_PREFIX}{detail}")
                }
            }
        }
    }
}

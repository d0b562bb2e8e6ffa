//! View-state machine for one generation attempt at a time.
//!
//! `Idle -> Loading -> (Success | Error) -> Idle`. Every variant carries only
//! the data valid for it, so a result can never be shown next to an error or
//! while a request is still in flight.

use std::mem;

use shared::{
    error::INTERNAL_CONSISTENCY_MESSAGE, GenerationError, GenerationResult, ImagePreview,
    UploadedImage,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Analyzing,
    Crafting,
}

impl Progress {
    pub fn label(self) -> &'static str {
        match self {
            Progress::Analyzing => "Analyzing your photo...",
            Progress::Crafting => "Crafting your memoji masterpiece...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Upload,
    Reset,
    DownloadImage,
    DownloadBio,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading {
        progress: Progress,
        preview: ImagePreview,
    },
    Success {
        result: GenerationResult,
        preview: ImagePreview,
    },
    Error {
        message: String,
    },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading { .. } => "loading",
            ViewState::Success { .. } => "success",
            ViewState::Error { .. } => "error",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ViewState::Idle)
    }

    pub fn actions(&self) -> &'static [ViewAction] {
        match self {
            ViewState::Idle => &[ViewAction::Upload],
            ViewState::Loading { .. } => &[],
            ViewState::Success { .. } => &[
                ViewAction::DownloadImage,
                ViewAction::DownloadBio,
                ViewAction::Reset,
            ],
            ViewState::Error { .. } => &[ViewAction::Reset],
        }
    }

    pub fn allows(&self, action: ViewAction) -> bool {
        self.actions().contains(&action)
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            ViewState::Success { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a new photo can only be uploaded from the start screen (currently {state})")]
    NotIdle { state: &'static str },
    #[error("reset is only available once an attempt has finished (currently {state})")]
    ResetUnavailable { state: &'static str },
}

/// Owner of the current [`ViewState`].
#[derive(Debug, Default)]
pub struct Session {
    state: ViewState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Starts an attempt for `upload`. Rejected unless the session is idle.
    pub fn begin(&mut self, upload: &UploadedImage) -> Result<(), SessionError> {
        if !self.state.is_idle() {
            warn!(state = self.state.name(), "rejecting upload while an attempt is active");
            return Err(SessionError::NotIdle {
                state: self.state.name(),
            });
        }

        info!(file = upload.file_name(), bytes = upload.len(), "starting generation attempt");
        self.state = ViewState::Loading {
            progress: Progress::Analyzing,
            preview: upload.preview(),
        };
        Ok(())
    }

    pub fn advance(&mut self, next: Progress) {
        match &mut self.state {
            ViewState::Loading { progress, .. } => *progress = next,
            other => warn!(state = other.name(), "ignoring progress update outside of loading"),
        }
    }

    /// Finishes the in-flight attempt. Outcomes arriving outside of loading are
    /// dropped.
    pub fn complete(&mut self, outcome: Result<GenerationResult, GenerationError>) {
        let preview = match mem::take(&mut self.state) {
            ViewState::Loading { preview, .. } => preview,
            other => {
                warn!(state = other.name(), "ignoring generation outcome outside of loading");
                self.state = other;
                return;
            }
        };

        self.state = match outcome {
            Ok(result) if result.is_complete() && !preview.is_empty() => {
                info!(avatar_bytes = result.avatar_image().len(), "generation attempt succeeded");
                ViewState::Success { result, preview }
            }
            Ok(_) => {
                warn!("generation finished with incomplete display data");
                internal_consistency_error()
            }
            Err(err) => {
                info!(error = %err, "generation attempt failed");
                ViewState::Error {
                    message: err.user_message(),
                }
            }
        };
    }

    /// Rejects an upload before any request was made, e.g. an unsupported file.
    pub fn reject_upload(&mut self, err: &GenerationError) -> Result<(), SessionError> {
        if !self.state.is_idle() {
            return Err(SessionError::NotIdle {
                state: self.state.name(),
            });
        }
        self.state = ViewState::Error {
            message: err.user_message(),
        };
        Ok(())
    }

    /// Replaces a success view whose data turned out to be unusable for display.
    pub fn invalidate_result(&mut self) {
        if matches!(self.state, ViewState::Success { .. }) {
            warn!("success view could not be rendered; switching to error");
            self.state = internal_consistency_error();
        }
    }

    /// Returns to idle and drops every attempt-scoped value.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state {
            ViewState::Success { .. } | ViewState::Error { .. } => {
                self.state = ViewState::Idle;
                Ok(())
            }
            ViewState::Idle => Ok(()),
            ViewState::Loading { .. } => Err(SessionError::ResetUnavailable {
                state: self.state.name(),
            }),
        }
    }
}

fn internal_consistency_error() -> ViewState {
    ViewState::Error {
        message: INTERNAL_CONSISTENCY_MESSAGE.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

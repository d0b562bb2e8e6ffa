//! Events sent from the backend worker to the UI thread.

use client_core::Progress;
use shared::{GenerationError, GenerationResult};

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Finished(Result<GenerationResult, GenerationError>),
    /// The worker could not start; every later attempt will fail too.
    BackendUnavailable(String),
}

//! Generation orchestration: describe, then image and bio side by side.

use std::sync::Arc;

use futures::future::try_join;
use shared::{GenerationError, GenerationResult, Stage, UploadedImage};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    session::{Progress, Session, SessionError, ViewState},
    GenerationService,
};

/// Runs the three-stage pipeline for one upload.
///
/// The image and bio stages run as separate tasks. The first failure is
/// returned as soon as it is known; the other task is left running to
/// completion and its outcome is discarded.
pub async fn run_generation<F>(
    service: Arc<dyn GenerationService>,
    image: &UploadedImage,
    mut on_progress: F,
) -> Result<GenerationResult, GenerationError>
where
    F: FnMut(Progress) + Send,
{
    on_progress(Progress::Analyzing);
    let description = service.describe(image).await?;
    debug!(chars = description.as_str().len(), "photo described");

    on_progress(Progress::Crafting);
    let image_task = tokio::spawn({
        let service = Arc::clone(&service);
        let description = description.clone();
        async move { service.synthesize_image(&description).await }
    });
    let bio_task = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.synthesize_bio(&description).await }
    });

    let (avatar_image, bio) = try_join(
        join_stage(image_task, Stage::SynthesizeImage),
        join_stage(bio_task, Stage::SynthesizeBio),
    )
    .await?;

    Ok(GenerationResult::new(avatar_image, bio))
}

async fn join_stage<T>(
    task: JoinHandle<Result<T, GenerationError>>,
    stage: Stage,
) -> Result<T, GenerationError> {
    task.await
        .map_err(|err| GenerationError::service(format!("{stage} task failed: {err}")))?
}

/// Drives a [`Session`] through complete attempts against one service.
pub struct Orchestrator {
    service: Arc<dyn GenerationService>,
    session: Session,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            session: Session::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        self.session.state()
    }

    /// Runs one attempt to completion and returns the resulting view state.
    pub async fn generate(&mut self, upload: UploadedImage) -> Result<&ViewState, SessionError> {
        self.session.begin(&upload)?;

        let service = Arc::clone(&self.service);
        let session = &mut self.session;
        let outcome = run_generation(service, &upload, |progress| {
            info!(progress = progress.label(), "generation progress");
            session.advance(progress);
        })
        .await;

        self.session.complete(outcome);
        Ok(self.session.state())
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.session.reset()
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;

use async_trait::async_trait;
use shared::{Description, GenerationError, UploadedImage};

pub mod config;
pub mod download;
pub mod gemini;
pub mod intake;
pub mod pipeline;
pub mod prompts;
pub mod session;

pub use config::{load_settings, Settings};
pub use download::{ArtifactKind, DownloadArtifact};
pub use gemini::GeminiClient;
pub use intake::{CandidateFile, FileSource, UploadIntake};
pub use pipeline::{run_generation, Orchestrator};
pub use session::{Progress, Session, SessionError, ViewAction, ViewState};

/// The three remote operations the generation pipeline depends on.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn describe(&self, image: &UploadedImage) -> Result<Description, GenerationError>;
    async fn synthesize_image(&self, description: &Description) -> Result<Vec<u8>, GenerationError>;
    async fn synthesize_bio(&self, description: &Description) -> Result<String, GenerationError>;
}

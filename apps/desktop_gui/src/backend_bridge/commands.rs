//! Backend commands queued from UI to backend worker.

use shared::UploadedImage;

#[derive(Debug)]
pub enum BackendCommand {
    Generate { upload: UploadedImage },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Generate { .. } => "generate",
        }
    }
}

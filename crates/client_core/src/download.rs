//! Downloadable artifacts of a successful attempt.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::info;

use crate::session::ViewState;

pub const AVATAR_FILE_NAME: &str = "memoji.png";
pub const BIO_FILE_NAME: &str = "memoji-bio.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Bio,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Image => AVATAR_FILE_NAME,
            ArtifactKind::Bio => BIO_FILE_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    kind: ArtifactKind,
    bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Artifact of `kind` for the displayed result. `None` unless the state is
    /// a success.
    pub fn from_state(state: &ViewState, kind: ArtifactKind) -> Option<Self> {
        let result = state.result()?;
        let bytes = match kind {
            ArtifactKind::Image => result.avatar_image().to_vec(),
            ArtifactKind::Bio => result.bio().as_bytes().to_vec(),
        };
        Some(Self { kind, bytes })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved download");
        Ok(())
    }

    /// Writes the artifact under its suggested file name inside `dir`.
    pub fn save_to_dir(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(self.file_name());
        self.save_to(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/download_tests.rs"]
mod tests;

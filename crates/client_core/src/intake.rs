//! Upload intake: turns picked or dropped files into a validated [`UploadedImage`].

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::{GenerationError, MediaType, UploadedImage};
use tracing::debug;

use crate::config::Settings;

#[derive(Debug, Clone)]
pub enum FileSource {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

/// A file handed over by a picker or a drag-and-drop event, not yet validated.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: String,
    declared_mime: Option<String>,
    source: FileSource,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, declared_mime: Option<String>, source: FileSource) -> Self {
        Self {
            name: name.into(),
            declared_mime: declared_mime.filter(|mime| !mime.trim().is_empty()),
            source,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, None, FileSource::Path(path))
    }

    pub fn from_bytes(
        name: impl Into<String>,
        declared_mime: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self::new(name, declared_mime, FileSource::Bytes(bytes.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadIntake {
    max_upload_bytes: usize,
}

impl UploadIntake {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_upload_bytes)
    }

    /// Validates the first of `files`. An empty selection is a no-op.
    pub fn accept(
        &self,
        files: impl IntoIterator<Item = CandidateFile>,
    ) -> Result<Option<UploadedImage>, GenerationError> {
        let mut files = files.into_iter();
        let Some(first) = files.next() else {
            return Ok(None);
        };
        let ignored = files.count();
        if ignored > 0 {
            debug!(ignored, "only the first dropped file is used");
        }
        self.validate(first).map(Some)
    }

    pub fn validate(&self, file: CandidateFile) -> Result<UploadedImage, GenerationError> {
        let CandidateFile {
            name,
            declared_mime,
            source,
        } = file;

        let claimed = claimed_media_type(&name, declared_mime.as_deref());
        if claimed.is_none() {
            return Err(unsupported(format!("{name} is not a PNG or JPEG image")));
        }

        let bytes = match source {
            FileSource::Bytes(bytes) => bytes,
            FileSource::Path(path) => self.read_limited(&name, &path)?,
        };
        if bytes.is_empty() {
            return Err(unsupported(format!("{name} is empty")));
        }
        self.check_size(&name, bytes.len() as u64)?;

        let Some(actual) = MediaType::sniff(&bytes) else {
            return Err(unsupported(format!("{name} does not contain PNG or JPEG data")));
        };
        if claimed != Some(actual) {
            debug!(
                file = %name,
                ?claimed,
                %actual,
                "file content disagrees with its declared type"
            );
        }

        Ok(UploadedImage::new(name, actual, bytes))
    }

    fn read_limited(&self, name: &str, path: &Path) -> Result<Arc<[u8]>, GenerationError> {
        let metadata = fs::metadata(path)
            .map_err(|err| unsupported(format!("{name} could not be read: {err}")))?;
        if !metadata.is_file() {
            return Err(unsupported(format!("{name} is not a regular file")));
        }
        self.check_size(name, metadata.len())?;

        fs::read(path)
            .map(Arc::from)
            .map_err(|err| unsupported(format!("{name} could not be read: {err}")))
    }

    fn check_size(&self, name: &str, len: u64) -> Result<(), GenerationError> {
        if len > self.max_upload_bytes as u64 {
            return Err(unsupported(format!(
                "{name} is {len} bytes; the limit is {} bytes",
                self.max_upload_bytes
            )));
        }
        Ok(())
    }
}

/// Type the file claims to be: the declared MIME type when present, otherwise
/// the one implied by its extension.
fn claimed_media_type(name: &str, declared_mime: Option<&str>) -> Option<MediaType> {
    match declared_mime {
        Some(mime) => MediaType::from_mime(mime),
        None => mime_guess::from_path(name)
            .iter()
            .find_map(|mime| MediaType::from_mime(mime.essence_str())),
    }
}

fn unsupported(reason: String) -> GenerationError {
    GenerationError::UnsupportedFile(reason)
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;

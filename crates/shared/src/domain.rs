use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(MediaType::Jpeg),
            _ => None,
        }
    }

    /// Identifies PNG and JPEG payloads by their leading signature bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(MediaType::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(MediaType::Jpeg)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A user-selected photo, held in memory for the duration of one attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    file_name: String,
    media_type: MediaType,
    bytes: Arc<[u8]>,
}

impl UploadedImage {
    pub fn new(
        file_name: impl Into<String>,
        media_type: MediaType,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type,
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn preview(&self) -> ImagePreview {
        ImagePreview(format!("data:{};base64,{}", self.media_type.mime(), self.base64()))
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// `data:` URL rendering of the original upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview(String);

impl ImagePreview {
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.payload().map(str::is_empty).unwrap_or(true)
    }

    pub fn media_type(&self) -> Option<MediaType> {
        let header = self.0.strip_prefix("data:")?.split(',').next()?;
        MediaType::from_mime(header.strip_suffix(";base64")?)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload().unwrap_or_default())
    }

    fn payload(&self) -> Option<&str> {
        self.0.split_once(";base64,").map(|(_, payload)| payload)
    }
}

/// Intermediate feature summary produced by the first pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The paired avatar image and bio of one successful attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationResult {
    avatar_image: Arc<[u8]>,
    bio: String,
}

impl GenerationResult {
    pub fn new(avatar_image: impl Into<Arc<[u8]>>, bio: impl Into<String>) -> Self {
        Self {
            avatar_image: avatar_image.into(),
            bio: bio.into(),
        }
    }

    pub fn avatar_image(&self) -> &[u8] {
        &self.avatar_image
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub fn is_complete(&self) -> bool {
        !self.avatar_image.is_empty() && !self.bio.trim().is_empty()
    }

    pub fn ensure_complete(self) -> Result<Self, GenerationError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(GenerationError::InternalConsistency)
        }
    }
}

impl fmt::Debug for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationResult")
            .field("avatar_len", &self.avatar_image.len())
            .field("bio", &self.bio)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_and_jpeg_signatures() {
        assert_eq!(MediaType::sniff(b"\x89PNG\r\n\x1a\nrest"), Some(MediaType::Png));
        assert_eq!(MediaType::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(MediaType::Jpeg));
        assert_eq!(MediaType::sniff(b"GIF89a"), None);
        assert_eq!(MediaType::sniff(&[]), None);
    }

    #[test]
    fn preview_is_a_data_url_that_decodes_back_to_the_upload() {
        let image =
            UploadedImage::new("photo.jpg", MediaType::Jpeg, vec![0xFFu8, 0xD8, 0xFF, 1, 2]);
        let preview = image.preview();

        assert!(preview.as_data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!(preview.media_type(), Some(MediaType::Jpeg));
        assert_eq!(preview.decode().expect("decode"), image.bytes());
        assert!(!preview.is_empty());
    }

    #[test]
    fn preview_without_payload_is_empty() {
        assert!(ImagePreview::from_data_url("data:image/png;base64,").is_empty());
        assert!(ImagePreview::from_data_url("").is_empty());
    }

    #[test]
    fn media_type_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&MediaType::Jpeg).expect("json"), "\"jpeg\"");
    }

    #[test]
    fn incomplete_result_is_an_internal_consistency_error() {
        let err = GenerationResult::new(Vec::<u8>::new(), "bio")
            .ensure_complete()
            .expect_err("empty avatar");
        assert!(matches!(err, GenerationError::InternalConsistency));

        let err = GenerationResult::new(vec![1u8], "  ")
            .ensure_complete()
            .expect_err("blank bio");
        assert!(matches!(err, GenerationError::InternalConsistency));
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "memoji.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Credential variables, checked in order. Later entries win.
const API_KEY_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "MEMOJI__API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_key: Option<String>,
    api_base_url: Option<String>,
    text_model: Option<String>,
    image_model: Option<String>,
    max_upload_bytes: Option<usize>,
    request_timeout_secs: Option<u64>,
}

/// Loads settings from `path` (or `memoji.toml` in the working directory when
/// present), then applies environment overrides.
///
/// An explicitly given file must exist and parse; the implicit default file is
/// optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    if let Some(file_path) = file_path {
        let raw = fs::read_to_string(&file_path)
            .with_context(|| format!("failed to read config file '{}'", file_path.display()))?;
        apply_file_settings(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", file_path.display()))?;
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    if !settings.has_api_key() {
        tracing::warn!(
            "API key is not configured (set GEMINI_API_KEY or API_KEY); generation requests will fail"
        );
    }

    Ok(settings)
}

fn apply_file_settings(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = non_empty(file_cfg.api_key) {
        settings.api_key = Some(v);
    }
    if let Some(v) = non_empty(file_cfg.api_base_url) {
        settings.api_base_url = v;
    }
    if let Some(v) = non_empty(file_cfg.text_model) {
        settings.text_model = v;
    }
    if let Some(v) = non_empty(file_cfg.image_model) {
        settings.image_model = v;
    }
    if let Some(v) = file_cfg.max_upload_bytes {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }

    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    for name in API_KEY_VARS {
        if let Some(v) = non_empty(lookup(name)) {
            settings.api_key = Some(v);
        }
    }

    if let Some(v) = non_empty(lookup("MEMOJI__API_BASE_URL")) {
        settings.api_base_url = v;
    }
    if let Some(v) = non_empty(lookup("MEMOJI__TEXT_MODEL")) {
        settings.text_model = v;
    }
    if let Some(v) = non_empty(lookup("MEMOJI__IMAGE_MODEL")) {
        settings.image_model = v;
    }

    if let Some(v) = lookup("MEMOJI__MAX_UPLOAD_BYTES") {
        match v.trim().parse::<usize>() {
            Ok(parsed) => settings.max_upload_bytes = parsed,
            Err(err) => tracing::warn!("ignoring MEMOJI__MAX_UPLOAD_BYTES={v:?}: {err}"),
        }
    }
    if let Some(v) = lookup("MEMOJI__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(err) => tracing::warn!("ignoring MEMOJI__REQUEST_TIMEOUT_SECS={v:?}: {err}"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

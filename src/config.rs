use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::predict::batch::DEFAULT_BATCH_SIZE;

pub const DEFAULT_ENDPOINT: &str = "marselferrys/indo_name-gender-prediction";
pub const DEFAULT_API_NAME: &str = "/predict_batch";
pub const DEFAULT_TIMEOUT_SECS: NonZeroU64 = match NonZeroU64::new(300) {
    Some(n) => n,
    None => unreachable!(),
};

/// Environment variable naming a JSON settings file.
pub const CONFIG_ENV: &str = "GENDER_PREDICT_CONFIG";
/// Settings file picked up from the working directory when present.
pub const CONFIG_FILE_NAME: &str = "gender-predict.json";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime settings for the inference endpoint and batching.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Space id (`owner/name`) or a full base URL.
    pub endpoint: String,
    /// Gradio endpoint name, with or without the leading slash.
    pub api_name: String,
    /// Names per inference call.
    pub batch_size: NonZeroUsize,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: NonZeroU64,
    /// Hugging Face token for private Spaces.
    pub hf_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_name: DEFAULT_API_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            hf_token: None,
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Apply `GENDER_PREDICT_*` / `HF_TOKEN` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GENDER_PREDICT_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("GENDER_PREDICT_API_NAME") {
            self.api_name = v;
        }
        if let Some(v) = lookup("GENDER_PREDICT_BATCH_SIZE") {
            self.batch_size = v
                .trim()
                .parse()
                .with_context(|| format!("GENDER_PREDICT_BATCH_SIZE must be a positive integer, got '{v}'"))?;
        }
        if let Some(v) = lookup("GENDER_PREDICT_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("GENDER_PREDICT_TIMEOUT_SECS must be a positive integer, got '{v}'"))?;
        }
        if let Some(v) = lookup("HF_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.hf_token = Some(v);
        }
        Ok(())
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    local.is_file().then_some(local)
}

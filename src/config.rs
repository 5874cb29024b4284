//! Runtime settings: optional TOML file, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::{Threshold, DEFAULT_THRESHOLD};
use crate::encode::{MaxLen, DEFAULT_MAX_LEN};
use crate::error::{Error, Result};

pub const DEFAULT_VOCAB_PATH: &str = "tokenizer/vocab.json";
pub const DEFAULT_MODEL_PATH: &str = "model/spam_detector.json";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub vocab_path: PathBuf,
    pub model_path: PathBuf,
    pub max_len: usize,
    pub threshold: f32,
    /// Listen address for `serve`
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vocab_path: PathBuf::from(DEFAULT_VOCAB_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            max_len: DEFAULT_MAX_LEN,
            threshold: DEFAULT_THRESHOLD,
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Values that may replace the file settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub vocab_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub max_len: Option<usize>,
    pub threshold: Option<f32>,
    pub bind: Option<String>,
}

impl Settings {
    /// Read settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(p) => {
                let text = fs::read_to_string(p).map_err(|e| {
                    Error::InvalidConfig(format!("cannot read {}: {}", p.display(), e))
                })?;
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        Ok(settings)
    }

    pub fn apply(mut self, o: Overrides) -> Self {
        if let Some(v) = o.vocab_path {
            self.vocab_path = v;
        }
        if let Some(v) = o.model_path {
            self.model_path = v;
        }
        if let Some(v) = o.max_len {
            self.max_len = v;
        }
        if let Some(v) = o.threshold {
            self.threshold = v;
        }
        if let Some(v) = o.bind {
            self.bind = v;
        }
        self
    }

    pub fn max_len(&self) -> Result<MaxLen> {
        MaxLen::new(self.max_len)
    }

    pub fn threshold(&self) -> Result<Threshold> {
        Threshold::new(self.threshold)
    }

    /// Fail fast on values that cannot be used.
    pub fn validate(&self) -> Result<()> {
        self.max_len()?;
        self.threshold()?;
        if self.bind.trim().is_empty() {
            return Err(Error::InvalidConfig("bind address is empty".into()));
        }
        Ok(())
    }
}

//! Spam probability from encoded sequences, and the SPAM/HAM decision on top of it.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encode::{preprocess_text, EncodedBatch, MaxLen};
use crate::error::{Error, Result};
use crate::vocab::{Vocabulary, PAD_ID};

/// Black-box sequence model: `[N, max_len]` IDs in, `N` probabilities in [0, 1] out.
pub trait Classifier: Send + Sync {
    fn predict(&self, batch: &EncodedBatch) -> Result<Vec<f32>>;
}

/// Serialized weights of [`EmbeddingModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelFile {
    pub embedding_dim: usize,
    /// One row per token ID; row 0 belongs to the pad ID and is never read.
    pub embeddings: Vec<Vec<f32>>,
    pub dense: Vec<f32>,
    pub bias: f32,
}

/// Mean-pooled token embeddings followed by one dense unit and a sigmoid.
/// Pad positions are masked out.
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    dim: usize,
    /// row-major, `vocab_size x dim`
    table: Vec<f32>,
    dense: Vec<f32>,
    bias: f32,
}

impl EmbeddingModel {
    pub fn from_file(file: EmbeddingModelFile) -> Result<Self> {
        let dim = file.embedding_dim;
        if dim == 0 {
            return Err(Error::Model("embedding_dim must be positive".into()));
        }
        if file.dense.len() != dim {
            return Err(Error::Model(format!(
                "dense layer has {} weights, expected {}",
                file.dense.len(),
                dim
            )));
        }
        let mut table = Vec::with_capacity(file.embeddings.len() * dim);
        for (id, row) in file.embeddings.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::Model(format!(
                    "embedding row {} has {} values, expected {}",
                    id,
                    row.len(),
                    dim
                )));
            }
            table.extend_from_slice(row);
        }
        Ok(Self {
            dim,
            table,
            dense: file.dense,
            bias: file.bias,
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.table.len() / self.dim
    }

    fn embedding(&self, id: u32) -> Option<&[f32]> {
        let start = (id as usize).checked_mul(self.dim)?;
        self.table.get(start..start + self.dim)
    }

    /// Probability for a single row.
    pub fn forward(&self, row: &[u32]) -> f32 {
        let mut pooled = vec![0.0_f32; self.dim];
        let mut count = 0usize;
        for &id in row.iter().filter(|&&id| id != PAD_ID) {
            if let Some(e) = self.embedding(id) {
                for (p, v) in pooled.iter_mut().zip(e) {
                    *p += v;
                }
                count += 1;
            }
        }
        if count > 0 {
            let n = count as f32;
            pooled.iter_mut().for_each(|p| *p /= n);
        }
        let logit: f32 = pooled
            .iter()
            .zip(&self.dense)
            .map(|(p, w)| p * w)
            .sum::<f32>()
            + self.bias;
        sigmoid(logit)
    }
}

impl Classifier for EmbeddingModel {
    fn predict(&self, batch: &EncodedBatch) -> Result<Vec<f32>> {
        Ok(batch.rows.iter().map(|row| self.forward(row)).collect())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Load [`EmbeddingModel`] weights from JSON.
pub fn load_model(path: &Path) -> Result<EmbeddingModel> {
    let json = fs::read_to_string(path)
        .map_err(|e| Error::Model(format!("cannot read {}: {}", path.display(), e)))?;
    let file: EmbeddingModelFile = serde_json::from_str(&json)
        .map_err(|e| Error::Model(format!("{}: {}", path.display(), e)))?;
    let model = EmbeddingModel::from_file(file)?;
    tracing::info!(
        path = %path.display(),
        vocab_size = model.vocab_size(),
        dim = model.dim,
        "model loaded"
    );
    Ok(model)
}

pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// SPAM cutoff in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Threshold(f32);

impl Threshold {
    pub fn new(t: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&t) {
            return Err(Error::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                t
            )));
        }
        Ok(Self(t))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    /// SPAM strictly above the threshold.
    pub fn from_probability(p: f32, threshold: Threshold) -> Self {
        if p > threshold.get() {
            Label::Spam
        } else {
            Label::Ham
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Spam => f.write_str("SPAM"),
            Label::Ham => f.write_str("HAM"),
        }
    }
}

/// Outcome for one evaluated message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub label: Label,
    pub probability: f32,
    pub message: String,
}

/// Vocabulary, model and sequence width loaded once and shared by all callers.
#[derive(Clone)]
pub struct SpamDetector {
    vocab: Arc<Vocabulary>,
    model: Arc<dyn Classifier>,
    max_len: MaxLen,
}

impl SpamDetector {
    pub fn new(vocab: Arc<Vocabulary>, model: Arc<dyn Classifier>, max_len: MaxLen) -> Self {
        Self {
            vocab,
            model,
            max_len,
        }
    }

    pub fn max_len(&self) -> MaxLen {
        self.max_len
    }

    pub fn encode<S: AsRef<str>>(&self, messages: &[S]) -> Result<EncodedBatch> {
        preprocess_text(messages, &self.vocab, self.max_len)
    }

    /// Classify one message. Blank input is refused before encoding.
    pub fn detect(&self, message: &str, threshold: Threshold) -> Result<Verdict> {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let batch = self.encode(&[message])?;
        let probs = self.model.predict(&batch)?;
        let probability = *probs
            .first()
            .ok_or_else(|| Error::Model("classifier returned no output".into()))?;
        let label = Label::from_probability(probability, threshold);
        tracing::debug!(%label, probability, "message classified");
        Ok(Verdict {
            label,
            probability,
            message: message.to_string(),
        })
    }
}

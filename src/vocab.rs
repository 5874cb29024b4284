//! Word -> token ID mapping built at training time. Loaded once, read-only afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pad sentinel; also the default unknown ID.
pub const PAD_ID: u32 = 0;

/// What to do with a word that has no usable ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownWords {
    /// Emit the unknown ID.
    #[default]
    Map,
    /// Drop the word from the sequence.
    Skip,
}

/// On-disk layout of a vocabulary file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyFile {
    pub word_index: HashMap<String, u32>,
    #[serde(default)]
    pub oov_token: Option<String>,
    /// Only IDs below this limit are kept; the rest count as unknown.
    #[serde(default)]
    pub num_words: Option<u32>,
    #[serde(default)]
    pub lower: bool,
    /// Characters replaced by a space before splitting.
    #[serde(default)]
    pub filters: String,
    #[serde(default)]
    pub unknown: UnknownWords,
}

impl From<HashMap<String, u32>> for VocabularyFile {
    fn from(word_index: HashMap<String, u32>) -> Self {
        Self {
            word_index,
            oov_token: None,
            num_words: None,
            lower: false,
            filters: String::new(),
            unknown: UnknownWords::Map,
        }
    }
}

/// Immutable vocabulary handle. Share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    word_index: HashMap<String, u32>,
    unknown_id: u32,
    num_words: Option<u32>,
    lower: bool,
    filters: Vec<char>,
    unknown: UnknownWords,
}

impl Vocabulary {
    /// Validate a parsed vocabulary file.
    pub fn from_file(file: VocabularyFile) -> Result<Self> {
        if file.word_index.is_empty() {
            return Err(Error::Vocabulary("word_index is empty".into()));
        }
        if let Some((word, _)) = file.word_index.iter().find(|&(_, &id)| id == PAD_ID) {
            return Err(Error::Vocabulary(format!(
                "word {:?} uses reserved pad id {}",
                word, PAD_ID
            )));
        }
        if file.num_words == Some(0) {
            return Err(Error::Vocabulary("num_words must be positive".into()));
        }
        let unknown_id = match &file.oov_token {
            Some(tok) => *file.word_index.get(tok).ok_or_else(|| {
                Error::Vocabulary(format!("oov_token {:?} missing from word_index", tok))
            })?,
            None => PAD_ID,
        };
        Ok(Self {
            word_index: file.word_index,
            unknown_id,
            num_words: file.num_words,
            lower: file.lower,
            filters: file.filters.chars().collect(),
            unknown: file.unknown,
        })
    }

    /// Plain whitespace tokenization with unknown words mapped to [`PAD_ID`].
    pub fn from_word_index(word_index: HashMap<String, u32>) -> Result<Self> {
        Self::from_file(word_index.into())
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }

    pub fn unknown_id(&self) -> u32 {
        self.unknown_id
    }

    /// Split an already normalized message into words.
    pub fn split_words(&self, text: &str) -> Vec<String> {
        let mut s: String = text
            .chars()
            .map(|c| if self.filters.contains(&c) { ' ' } else { c })
            .collect();
        if self.lower {
            s = s.to_lowercase();
        }
        s.split_whitespace().map(str::to_string).collect()
    }

    /// ID for one word, or `None` when the word is dropped.
    pub fn lookup(&self, word: &str) -> Option<u32> {
        let known = self
            .word_index
            .get(word)
            .copied()
            .filter(|&id| self.num_words.map_or(true, |n| id < n));
        match (known, self.unknown) {
            (Some(id), _) => Some(id),
            (None, UnknownWords::Map) => Some(self.unknown_id),
            (None, UnknownWords::Skip) => None,
        }
    }

    /// Words of `text` mapped to IDs, unpadded.
    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        self.split_words(text)
            .iter()
            .filter_map(|w| self.lookup(w))
            .collect()
    }
}

/// Load a vocabulary from JSON. An object with a `word_index` key is the
/// structured layout; anything else must be a flat `{ "word": id }` map.
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let json = fs::read_to_string(path).map_err(|e| {
        Error::Vocabulary(format!("cannot read {}: {}", path.display(), e))
    })?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| Error::Vocabulary(format!("{}: {}", path.display(), e)))?;
    let structured = value.get("word_index").is_some();
    let file = if structured {
        serde_json::from_value::<VocabularyFile>(value)
    } else {
        serde_json::from_value::<HashMap<String, u32>>(value).map(VocabularyFile::from)
    }
    .map_err(|e| Error::Vocabulary(format!("{}: {}", path.display(), e)))?;
    let vocab = Vocabulary::from_file(file)?;
    tracing::info!(
        path = %path.display(),
        words = vocab.len(),
        structured,
        "vocabulary loaded"
    );
    Ok(vocab)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(w, i)| (w.to_string(), *i)).collect()
    }

    #[test]
    fn unknown_words_map_to_pad_by_default() {
        let v = Vocabulary::from_word_index(words(&[("free", 1), ("URL", 2)])).unwrap();
        assert_eq!(v.unknown_id(), PAD_ID);
        assert_eq!(v.text_to_sequence("free prize URL"), vec![1, 0, 2]);
    }

    #[test]
    fn oov_token_sets_unknown_id() {
        let mut file = VocabularyFile::from(words(&[("<OOV>", 1), ("call", 2)]));
        file.oov_token = Some("<OOV>".into());
        let v = Vocabulary::from_file(file).unwrap();
        assert_eq!(v.text_to_sequence("call me"), vec![2, 1]);
    }

    #[test]
    fn skip_policy_drops_unknown_words() {
        let mut file = VocabularyFile::from(words(&[("call", 2)]));
        file.unknown = UnknownWords::Skip;
        let v = Vocabulary::from_file(file).unwrap();
        assert_eq!(v.text_to_sequence("please call now"), vec![2]);
    }

    #[test]
    fn num_words_limits_ids() {
        let mut file = VocabularyFile::from(words(&[("a", 1), ("b", 5)]));
        file.num_words = Some(3);
        let v = Vocabulary::from_file(file).unwrap();
        assert_eq!(v.text_to_sequence("a b"), vec![1, 0]);
    }

    #[test]
    fn filters_and_lower_apply_before_split() {
        let mut file = VocabularyFile::from(words(&[("win", 3), ("url", 4)]));
        file.filters = "!,".into();
        file.lower = true;
        let v = Vocabulary::from_file(file).unwrap();
        assert_eq!(v.split_words("win!!,URL"), vec!["win", "url"]);
        assert_eq!(v.text_to_sequence("win!!,URL"), vec![3, 4]);
    }

    #[test]
    fn rejects_pad_id_and_missing_oov() {
        assert!(matches!(
            Vocabulary::from_word_index(words(&[("x", 0)])),
            Err(Error::Vocabulary(_))
        ));
        let mut file = VocabularyFile::from(words(&[("x", 1)]));
        file.oov_token = Some("<OOV>".into());
        assert!(Vocabulary::from_file(file).is_err());
        assert!(Vocabulary::from_word_index(HashMap::new()).is_err());
    }

    #[test]
    fn load_structured_and_flat_files() {
        let dir = tempfile::tempdir().unwrap();

        let flat = dir.path().join("flat.json");
        fs::write(&flat, r#"{"hello": 1, "world": 2}"#).unwrap();
        let v = load_vocabulary(&flat).unwrap();
        assert_eq!(v.len(), 2);

        let structured = dir.path().join("vocab.json");
        let mut file = VocabularyFile::from(words(&[("<OOV>", 1), ("hi", 2)]));
        file.oov_token = Some("<OOV>".into());
        fs::write(&structured, serde_json::to_string_pretty(&file).unwrap()).unwrap();
        let v = load_vocabulary(&structured).unwrap();
        assert_eq!(v.unknown_id(), 1);
    }

    #[test]
    fn structured_file_reports_its_own_field_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        fs::write(&path, r#"{"word_index": {"hi": 1}, "unknown": "drop"}"#).unwrap();
        match load_vocabulary(&path) {
            Err(Error::Vocabulary(msg)) => {
                assert!(msg.contains("drop"), "{}", msg);
                assert!(!msg.contains("expected u32"), "{}", msg);
            }
            other => panic!("expected vocabulary error, got {:?}", other),
        }
    }

    #[test]
    fn missing_or_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_vocabulary(&dir.path().join("nope.json")).is_err());
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[1, 2, 3]").unwrap();
        assert!(matches!(load_vocabulary(&bad), Err(Error::Vocabulary(_))));
    }
}

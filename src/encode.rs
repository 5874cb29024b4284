//! Batch encoding: normalize, map words to IDs, post-pad / post-truncate to `max_len`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::normalize::clean_text_light;
use crate::vocab::{Vocabulary, PAD_ID};

pub const DEFAULT_MAX_LEN: usize = 40;

/// Sequence width. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MaxLen(usize);

impl MaxLen {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidConfig("max_len must be positive".into()));
        }
        Ok(Self(n))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for MaxLen {
    fn default() -> Self {
        Self(DEFAULT_MAX_LEN)
    }
}

impl fmt::Display for MaxLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MaxLen {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let n: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("max_len {:?} is not an integer", s)))?;
        if n <= 0 {
            return Err(Error::InvalidConfig(format!(
                "max_len must be positive, got {}",
                n
            )));
        }
        Self::new(n as usize)
    }
}

/// `N x max_len` matrix of token IDs, one row per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedBatch {
    pub max_len: MaxLen,
    pub rows: Vec<Vec<u32>>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.max_len.get())
    }
}

/// Cut to the first `max_len` IDs, or fill the tail with [`PAD_ID`].
pub fn pad_sequence(mut seq: Vec<u32>, max_len: MaxLen) -> Vec<u32> {
    seq.resize(max_len.get(), PAD_ID);
    seq
}

/// Normalize, tokenize and pad every message of a non-empty batch.
/// Rows are encoded independently of each other.
pub fn preprocess_text<S: AsRef<str>>(
    messages: &[S],
    vocab: &Vocabulary,
    max_len: MaxLen,
) -> Result<EncodedBatch> {
    if messages.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let rows = messages
        .iter()
        .map(|msg| {
            let clean = clean_text_light(msg.as_ref());
            pad_sequence(vocab.text_to_sequence(&clean), max_len)
        })
        .collect::<Vec<_>>();
    tracing::debug!(rows = rows.len(), max_len = max_len.get(), "batch encoded");
    Ok(EncodedBatch { max_len, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vocab() -> Vocabulary {
        let words: HashMap<String, u32> = [("hello", 1), ("world", 2), ("URL", 3), ("free", 4)]
            .iter()
            .map(|(w, i)| (w.to_string(), *i))
            .collect();
        Vocabulary::from_word_index(words).unwrap()
    }

    #[test]
    fn max_len_must_be_positive() {
        assert!(matches!(MaxLen::new(0), Err(Error::InvalidConfig(_))));
        assert!("-3".parse::<MaxLen>().is_err());
        assert!("0".parse::<MaxLen>().is_err());
        assert!("abc".parse::<MaxLen>().is_err());
        assert_eq!("12".parse::<MaxLen>().unwrap().get(), 12);
        assert_eq!(MaxLen::default().get(), 40);
    }

    #[test]
    fn empty_message_is_all_padding() {
        let batch = preprocess_text(&[""], &vocab(), MaxLen::default()).unwrap();
        assert_eq!(batch.rows[0], vec![PAD_ID; 40]);
        let blank = preprocess_text(&["  \n\t "], &vocab(), MaxLen::default()).unwrap();
        assert_eq!(blank.rows[0], vec![PAD_ID; 40]);
    }

    #[test]
    fn short_message_is_post_padded() {
        let max_len = MaxLen::new(6).unwrap();
        let batch = preprocess_text(&["HELLO http://x.com World"], &vocab(), max_len).unwrap();
        assert_eq!(batch.rows[0], vec![1, 3, 2, 0, 0, 0]);
    }

    #[test]
    fn long_message_keeps_prefix() {
        let max_len = MaxLen::new(3).unwrap();
        let batch = preprocess_text(&["free hello world free hello"], &vocab(), max_len).unwrap();
        assert_eq!(batch.rows[0], vec![4, 1, 2]);
    }

    #[test]
    fn every_row_has_max_len_columns() {
        let long = "hello ".repeat(100);
        let msgs = ["", "hello", long.as_str(), "unknown words only"];
        for n in [1, 5, 40, 200] {
            let max_len = MaxLen::new(n).unwrap();
            let batch = preprocess_text(&msgs, &vocab(), max_len).unwrap();
            assert_eq!(batch.shape(), (4, n));
            assert!(batch.rows.iter().all(|r| r.len() == n));
        }
    }

    #[test]
    fn rows_do_not_depend_on_batch_mates() {
        let v = vocab();
        let pair = preprocess_text(&["hello world", "free"], &v, MaxLen::default()).unwrap();
        let single = preprocess_text(&["hello world"], &v, MaxLen::default()).unwrap();
        assert_eq!(pair.rows[0], single.rows[0]);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let none: [&str; 0] = [];
        assert!(matches!(
            preprocess_text(&none, &vocab(), MaxLen::default()),
            Err(Error::EmptyBatch)
        ));
    }
}

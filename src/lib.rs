//! SMS spam classifier: text cleanup, fixed-width sequence encoding and a
//! SPAM/HAM verdict from a pre-trained sequence model.

pub mod classifier;
pub mod config;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod vocab;
pub mod web;

pub use classifier::{Classifier, Label, SpamDetector, Threshold, Verdict};
pub use encode::{preprocess_text, EncodedBatch, MaxLen};
pub use error::{Error, Result};
pub use normalize::clean_text_light;
pub use vocab::{load_vocabulary, Vocabulary};

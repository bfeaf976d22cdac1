//! # Parallel-Corpus Binarization
//!
//! Converts raw sentence-per-line corpora into the compact form consumed by
//! a training system:
//!
//! - frequency-ranked symbol [`dictionary::Dictionary`]s per language,
//! - sentences encoded as token-index sequences inside an append-only
//!   [`dataset::IndexedDatasetBuilder`] container,
//! - an optional word-to-word alignment prior derived from an alignment
//!   annotation file ([`align`]).
//!
//! # Encoding Example
//!
//! ```rust,ignore
//! let mut dict = Dictionary::<u32>::build_from_path("train.en", &WhitespaceTokenizer)?;
//! dict.finalize(0, -1);
//! dict.save_to_path("dict.en.txt")?;
//!
//! let mut builder = IndexedDatasetBuilder::<u32>::create("train.en.bin")?;
//! let stats = binarize_path(
//!     "train.en",
//!     &mut dict,
//!     &WhitespaceTokenizer,
//!     |item| builder.add_item(item),
//!     false,
//! )?;
//! builder.finalize("train.en.idx")?;
//! ```
#![warn(missing_docs, unused)]

pub mod align;
pub mod binarize;
pub mod dataset;
pub mod dictionary;
pub mod tokenizer;
pub mod types;

pub use binarize::{binarize_path, binarize_reader, BinarizeStats};
pub use dataset::{IndexedDataset, IndexedDatasetBuilder};
pub use dictionary::Dictionary;
pub use tokenizer::{LineTokenizer, WhitespaceTokenizer};

//! lexbeam: lexicon-constrained beam-search decoding for CTC and ASG
//! acoustic models.
//!
//! The decoder fuses per-frame acoustic log-scores with a prefix trie over
//! allowed word spellings and an external language model, keeping a pruned
//! beam of partial hypotheses across frames and recovering the best word
//! sequence with per-frame token and word alignments.
//!
//! # Architecture
//!
//! Three pieces cooperate:
//!
//! - [`LexiconDecoder`]: the beam-search engine and its lifecycle
//!   (`decode_begin` / `decode_step` / `decode_end` / `prune`)
//! - [`lm::LanguageModel`]: the contract an external LM implements
//! - [`lexicon::Trie`]: the shared, immutable spelling trie
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lexbeam::{DecoderOptions, LexiconDecoder, SmearingMode, Trie, ZeroLm};
//!
//! // spellings over acoustic tokens; 0 = silence, 1 = blank
//! let mut trie = Trie::new();
//! trie.insert(&[2, 3, 0], 0, 0.0)?;
//! trie.smear(SmearingMode::Max);
//!
//! let mut decoder = LexiconDecoder::new(
//!     DecoderOptions::default(),
//!     Arc::new(trie),
//!     ZeroLm,
//!     0,          // silence token
//!     1,          // blank token
//!     -1,         // unknown-word index
//!     Vec::new(), // ASG transitions, unused under CTC
//!     false,      // LM scores words, not tokens
//! )?;
//!
//! // emissions: T x N matrix of per-token log-scores
//! let best = decoder.decode(emissions.view()).into_iter().next();
//! ```

pub mod decoder;
pub mod error;
pub mod lexicon;
pub mod lm;
pub mod score;
pub mod types;

pub use decoder::LexiconDecoder;
pub use error::{Error, Result};
pub use lexicon::{SmearingMode, Trie, TrieNodeId};
pub use lm::{LanguageModel, ZeroLm};
pub use score::log_add;
pub use types::{CriterionType, DecodeResult, DecoderOptions};

//! Error types for lexbeam

use thiserror::Error;

/// Decoder construction and lexicon building error variants
#[derive(Debug, Error)]
pub enum Error {
    /// `beam_size` must be a positive number of hypotheses
    #[error("invalid beam size: must be positive")]
    InvalidBeamSize,

    /// `beam_size_token` must be a positive per-frame token width
    #[error("invalid token beam size: must be positive")]
    InvalidBeamSizeToken,

    /// ASG decoding needs an `N x N` transition matrix
    #[error("ASG criterion requires a non-empty transition matrix")]
    MissingTransitions,

    /// A lexicon entry must spell at least one token
    #[error("cannot insert an empty spelling into the lexicon")]
    EmptySpelling,
}

/// Result type alias for lexbeam operations
pub type Result<T> = std::result::Result<T, Error>;

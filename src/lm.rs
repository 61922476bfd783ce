//! Language-model contract and the degenerate zero-scoring model.
//!
//! The decoder never looks inside a language model: it threads opaque
//! [`LanguageModel::State`] handles through the beam, merges hypotheses by
//! state equality and orders them by the state's total order. Models that
//! batch or cache their queries can override [`LanguageModel::warm_cache`],
//! which the decoder calls once per newly-formed frame with the frame's
//! de-duplicated states.

use std::fmt::Debug;
use std::hash::Hash;

/// External language model queried over tokens or words.
///
/// Whether `index` arguments range over acoustic-model tokens or over word
/// indices is decided by the decoder's `is_lm_token` flag; the model itself
/// sees only indices of the vocabulary it was built for.
///
/// Methods take `&mut self` so implementations may cache internally.
pub trait LanguageModel {
    /// Opaque conditioning context. Equality and hashing key the caches;
    /// the total order drives deterministic hypothesis merging.
    type State: Clone + Eq + Ord + Hash + Debug;

    /// Initial state. `with_nothing` requests a context-free start instead
    /// of the sentence-begin context.
    fn start(&mut self, with_nothing: bool) -> Self::State;

    /// Score `index` in context `state`, returning the extended state and
    /// the log-probability.
    fn score(&mut self, state: &Self::State, index: i32) -> (Self::State, f64);

    /// Score the sentence end in context `state`.
    fn finish(&mut self, state: &Self::State) -> (Self::State, f64);

    /// Pre-compute scores the next frame is likely to request. `states` is
    /// de-duplicated by the decoder and handed over once per new frame.
    fn warm_cache(&mut self, _states: &[Self::State]) {}
}

/// Language model assigning log-probability zero to everything.
///
/// With merging by max this reduces the decoder to plain Viterbi over the
/// lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroLm;

impl LanguageModel for ZeroLm {
    type State = ();

    fn start(&mut self, _with_nothing: bool) -> Self::State {}

    fn score(&mut self, _state: &Self::State, _index: i32) -> (Self::State, f64) {
        ((), 0.0)
    }

    fn finish(&mut self, _state: &Self::State) -> (Self::State, f64) {
        ((), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lm_scores_nothing() {
        let mut lm = ZeroLm;
        let state = lm.start(false);

        let (state, score) = lm.score(&state, 42);
        assert_eq!(score, 0.0);

        let (_, score) = lm.finish(&state);
        assert_eq!(score, 0.0);
    }
}

//! Core types for lexbeam

/// Emission criterion the acoustic model was trained with.
///
/// Selects which expansion rules the decoder applies at each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionType {
    /// Connectionist Temporal Classification: a blank token plus
    /// repeat collapsing.
    Ctc,
    /// Auto Segmentation criterion: a learned token-transition matrix,
    /// no blank.
    Asg,
}

/// Search options for [`LexiconDecoder`](crate::LexiconDecoder).
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Maximum number of hypotheses kept per frame after merging.
    pub beam_size: usize,
    /// Number of top-scoring tokens considered per frame.
    pub beam_size_token: usize,
    /// Candidates scoring more than this below the frame best are dropped.
    pub beam_threshold: f64,
    /// Weight applied to language-model log-probabilities.
    pub lm_weight: f64,
    /// Bonus added when a word is emitted.
    pub word_score: f64,
    /// Bonus added when an unknown word is emitted. Negative infinity
    /// disables unknown-word emission entirely.
    pub unk_score: f64,
    /// Bonus added whenever the emitted token is silence.
    pub sil_score: f64,
    /// Merge equivalent hypotheses by log-add instead of max.
    pub log_add: bool,
    /// Emission criterion.
    pub criterion: CriterionType,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            beam_size: 50,
            beam_size_token: 25,
            beam_threshold: 25.0,
            lm_weight: 1.0,
            word_score: 0.0,
            unk_score: f64::NEG_INFINITY,
            sil_score: 0.0,
            log_add: false,
            criterion: CriterionType::Ctc,
        }
    }
}

/// A decoded path: total score plus per-frame token and word alignments.
///
/// Both vectors are emissions-aligned and include the seed frame and the
/// finishing frame, so a `T`-frame decode yields `T + 2` entries. Frames
/// that emit no word hold `-1` in `words`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeResult {
    pub score: f64,
    pub tokens: Vec<i32>,
    pub words: Vec<i32>,
}

impl DecodeResult {
    /// An unfilled result covering `length` frames.
    pub(crate) fn new(length: usize) -> Self {
        Self {
            score: 0.0,
            tokens: vec![-1; length],
            words: vec![-1; length],
        }
    }

    /// True when the result holds no frames at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The emitted word sequence, with word-free frames stripped.
    pub fn emitted_words(&self) -> Vec<i32> {
        self.words.iter().copied().filter(|&w| w >= 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        let options = DecoderOptions::default();

        assert!(options.beam_size > 0);
        assert!(options.beam_size_token > 0);
        assert!(options.beam_threshold > 0.0);
        assert_eq!(options.unk_score, f64::NEG_INFINITY);
    }

    #[test]
    fn emitted_words_strips_unset_frames() {
        let result = DecodeResult {
            score: 0.0,
            tokens: vec![0, 2, 3, 0],
            words: vec![-1, -1, 7, -1],
        };

        assert_eq!(result.emitted_words(), vec![7]);
    }

    #[test]
    fn empty_result() {
        assert!(DecodeResult::default().is_empty());
        assert!(!DecodeResult::new(3).is_empty());
    }
}

//! Lexicon-constrained beam search over frame emissions.
//!
//! The decoder walks a `T x N` emission matrix one frame at a time, expanding
//! every surviving hypothesis under the active criterion's rules, merging
//! equivalent expansions and keeping the best `beam_size`. Hypotheses carry a
//! position in the lexicon trie and a language-model state; words are scored
//! when a spelling completes, with the trie's smeared scores keeping partial
//! words comparable to finished ones in the meantime.

pub(crate) mod backtrack;
pub(crate) mod candidates;
pub(crate) mod state;

use std::collections::BTreeSet;
use std::sync::Arc;

use ndarray::ArrayView2;

use crate::decoder::candidates::CandidateBuffer;
use crate::decoder::state::Hypothesis;
use crate::error::{Error, Result};
use crate::lexicon::Trie;
use crate::lm::LanguageModel;
use crate::types::{CriterionType, DecodeResult, DecoderOptions};

/// Beam-search decoder constrained to the spellings of a lexicon trie.
///
/// A single instance is not reentrant; distinct instances are independent
/// and may share one [`Trie`].
pub struct LexiconDecoder<L: LanguageModel> {
    options: DecoderOptions,
    lexicon: Arc<Trie>,
    lm: L,
    /// Index of the silence token.
    sil: i32,
    /// Index of the blank token, meaningful under CTC only.
    blank: i32,
    /// Word index scored for unknown-word emissions.
    unk: i32,
    /// Row-major `N x N` token-transition scores, ASG only.
    transitions: Vec<f32>,
    /// Whether the LM is queried over tokens instead of words.
    is_lm_token: bool,
    /// Hypotheses per decoded frame; parents are slot indices one frame up.
    hyp: Vec<Vec<Hypothesis<L::State>>>,
    candidates: CandidateBuffer<L::State>,
    n_decoded_frames: usize,
    n_pruned_frames: usize,
}

impl<L: LanguageModel> LexiconDecoder<L> {
    /// Create a decoder over `lexicon` and `lm`.
    ///
    /// `transitions` may be empty unless the criterion is ASG. `is_lm_token`
    /// selects whether `lm` is queried over acoustic tokens or over word
    /// indices.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: DecoderOptions,
        lexicon: Arc<Trie>,
        lm: L,
        sil: i32,
        blank: i32,
        unk: i32,
        transitions: Vec<f32>,
        is_lm_token: bool,
    ) -> Result<Self> {
        if options.beam_size == 0 {
            return Err(Error::InvalidBeamSize);
        }
        if options.beam_size_token == 0 {
            return Err(Error::InvalidBeamSizeToken);
        }
        if options.criterion == CriterionType::Asg && transitions.is_empty() {
            return Err(Error::MissingTransitions);
        }

        Ok(Self {
            options,
            lexicon,
            lm,
            sil,
            blank,
            unk,
            transitions,
            is_lm_token,
            hyp: Vec::new(),
            candidates: CandidateBuffer::new(),
            n_decoded_frames: 0,
            n_pruned_frames: 0,
        })
    }

    /// Run a complete decode over `emissions` and return all final
    /// hypotheses in descending score order.
    pub fn decode(&mut self, emissions: ArrayView2<f32>) -> Vec<DecodeResult> {
        self.decode_begin();
        self.decode_step(emissions);
        self.decode_end();
        self.get_all_final_hypothesis()
    }

    /// Reset the buffer to a single between-words seed state at frame 0.
    pub fn decode_begin(&mut self) {
        let lm_state = self.lm.start(false);
        self.hyp.clear();
        self.hyp.push(vec![Hypothesis {
            score: 0.0,
            lm_state,
            lex: self.lexicon.root(),
            parent: None,
            token: self.sil,
            word: -1,
            prev_blank: false,
        }]);
        self.n_decoded_frames = 0;
        self.n_pruned_frames = 0;
    }

    /// Consume a `T x N` block of emissions, appending one frame of
    /// hypotheses per time step.
    pub fn decode_step(&mut self, emissions: ArrayView2<f32>) {
        let (t_max, n_tokens) = emissions.dim();

        let beam_size = self.options.beam_size;
        let beam_size_token = self.options.beam_size_token;
        let beam_threshold = self.options.beam_threshold;
        let lm_weight = self.options.lm_weight;
        let word_score = self.options.word_score;
        let unk_score = self.options.unk_score;
        let sil_score = self.options.sil_score;
        let log_add_merge = self.options.log_add;
        let is_ctc = self.options.criterion == CriterionType::Ctc;
        let is_asg = self.options.criterion == CriterionType::Asg;
        let root = self.lexicon.root();

        if is_asg {
            debug_assert_eq!(self.transitions.len(), n_tokens * n_tokens);
        }

        let start_frame = self.n_decoded_frames - self.n_pruned_frames;
        while self.hyp.len() < start_frame + t_max + 2 {
            self.hyp.push(Vec::new());
        }

        let mut idx: Vec<usize> = (0..n_tokens).collect();
        for t in 0..t_max {
            let frame = emissions.row(t);
            if n_tokens > beam_size_token {
                for (i, slot) in idx.iter_mut().enumerate() {
                    *slot = i;
                }
                pdqselect::select_by(&mut idx, beam_size_token, |&a, &b| {
                    frame[b].total_cmp(&frame[a])
                });
            }

            self.candidates.reset();
            for (slot, p) in self.hyp[start_frame + t].iter().enumerate() {
                let prev_lex = p.lex;
                let prev_token = p.token;
                let lex_max = if prev_lex == root {
                    0.0
                } else {
                    self.lexicon.max_score(prev_lex)
                };

                // (1) advance into the trie
                for &n in idx.iter().take(beam_size_token.min(n_tokens)) {
                    let token = n as i32;
                    let Some(child) = self.lexicon.child(prev_lex, token) else {
                        continue;
                    };
                    // CTC collapses repeats: without an intervening blank the
                    // repeated token may not eat a new trie arc
                    if is_ctc && !p.prev_blank && token == prev_token {
                        continue;
                    }

                    let mut score = p.score + f64::from(frame[n]);
                    if is_asg && self.n_decoded_frames + t > 0 {
                        score +=
                            f64::from(self.transitions[n * n_tokens + prev_token as usize]);
                    }
                    if token == self.sil {
                        score += sil_score;
                    }

                    let token_lm = self
                        .is_lm_token
                        .then(|| self.lm.score(&p.lm_state, token));

                    // continue spelling
                    if self.lexicon.has_children(child) {
                        let (lm_state, lm_score) = match &token_lm {
                            Some((state, s)) => (state.clone(), *s),
                            None => (
                                p.lm_state.clone(),
                                self.lexicon.max_score(child) - lex_max,
                            ),
                        };
                        self.candidates.add(
                            Hypothesis {
                                score: score + lm_weight * lm_score,
                                lm_state,
                                lex: child,
                                parent: Some(slot),
                                token,
                                word: -1,
                                prev_blank: false,
                            },
                            beam_threshold,
                        );
                    }

                    // completed words
                    for &label in self.lexicon.labels(child) {
                        let (lm_state, lm_score) = match &token_lm {
                            Some((state, s)) => (state.clone(), *s),
                            None => {
                                let (state, s) = self.lm.score(&p.lm_state, label);
                                (state, s - lex_max)
                            }
                        };
                        self.candidates.add(
                            Hypothesis {
                                score: score + lm_weight * lm_score + word_score,
                                lm_state,
                                lex: root,
                                parent: Some(slot),
                                token,
                                word: label,
                                prev_blank: false,
                            },
                            beam_threshold,
                        );
                    }

                    // unknown word
                    if self.lexicon.labels(child).is_empty() && unk_score > f64::NEG_INFINITY
                    {
                        let (lm_state, lm_score) = match &token_lm {
                            Some((state, s)) => (state.clone(), *s),
                            None => {
                                let (state, s) = self.lm.score(&p.lm_state, self.unk);
                                (state, s - lex_max)
                            }
                        };
                        self.candidates.add(
                            Hypothesis {
                                score: score + lm_weight * lm_score + unk_score,
                                lm_state,
                                lex: root,
                                parent: Some(slot),
                                token,
                                word: self.unk,
                                prev_blank: false,
                            },
                            beam_threshold,
                        );
                    }
                }

                // (2) stay on the same trie node
                if !is_ctc || !p.prev_blank {
                    let n = prev_token as usize;
                    let mut score = p.score + f64::from(frame[n]);
                    if is_asg && self.n_decoded_frames + t > 0 {
                        score += f64::from(self.transitions[n * n_tokens + n]);
                    }
                    if prev_token == self.sil {
                        score += sil_score;
                    }
                    self.candidates.add(
                        Hypothesis {
                            score,
                            lm_state: p.lm_state.clone(),
                            lex: prev_lex,
                            parent: Some(slot),
                            token: prev_token,
                            word: -1,
                            prev_blank: false,
                        },
                        beam_threshold,
                    );
                }

                // (3) blank, CTC only
                if is_ctc {
                    let n = self.blank as usize;
                    self.candidates.add(
                        Hypothesis {
                            score: p.score + f64::from(frame[n]),
                            lm_state: p.lm_state.clone(),
                            lex: prev_lex,
                            parent: Some(slot),
                            token: self.blank,
                            word: -1,
                            prev_blank: true,
                        },
                        beam_threshold,
                    );
                }
            }

            let next = start_frame + t + 1;
            self.candidates.store(
                &mut self.hyp[next],
                beam_size,
                beam_threshold,
                log_add_merge,
                false,
            );
            tracing::trace!(frame = next, beam = self.hyp[next].len(), "frame stored");

            let unique: BTreeSet<L::State> = self.hyp[next]
                .iter()
                .map(|h| h.lm_state.clone())
                .collect();
            let unique: Vec<L::State> = unique.into_iter().collect();
            self.lm.warm_cache(&unique);
        }

        self.n_decoded_frames += t_max;
    }

    /// Close the search: apply the language model's finish score and store a
    /// terminal frame, sorted by descending score.
    ///
    /// When at least one hypothesis sits between words, only such hypotheses
    /// are extended; otherwise every hypothesis is, mid-word or not.
    pub fn decode_end(&mut self) {
        let beam_size = self.options.beam_size;
        let beam_threshold = self.options.beam_threshold;
        let lm_weight = self.options.lm_weight;
        let log_add_merge = self.options.log_add;
        let root = self.lexicon.root();

        let current = self.n_decoded_frames - self.n_pruned_frames;
        while self.hyp.len() < current + 2 {
            self.hyp.push(Vec::new());
        }

        self.candidates.reset();
        let has_nice_ending = self.hyp[current].iter().any(|h| h.lex == root);
        for (slot, p) in self.hyp[current].iter().enumerate() {
            if has_nice_ending && p.lex != root {
                continue;
            }
            let (lm_state, lm_score) = self.lm.finish(&p.lm_state);
            self.candidates.add(
                Hypothesis {
                    score: p.score + lm_weight * lm_score,
                    lm_state,
                    lex: p.lex,
                    parent: Some(slot),
                    token: self.sil,
                    word: -1,
                    prev_blank: false,
                },
                beam_threshold,
            );
        }

        self.candidates.store(
            &mut self.hyp[current + 1],
            beam_size,
            beam_threshold,
            log_add_merge,
            true,
        );
        tracing::debug!(
            nice_ending = has_nice_ending,
            beam = self.hyp[current + 1].len(),
            "decode end"
        );

        self.n_decoded_frames += 1;
    }

    /// Number of hypotheses in the most recent frame.
    pub fn n_hypothesis(&self) -> usize {
        let current = self.n_decoded_frames - self.n_pruned_frames;
        self.hyp[current].len()
    }

    /// Number of frames currently held, seed frame included.
    pub fn n_decoded_frames_in_buffer(&self) -> usize {
        self.n_decoded_frames - self.n_pruned_frames + 1
    }

    /// Every hypothesis of the most recent frame, with alignments.
    pub fn get_all_final_hypothesis(&self) -> Vec<DecodeResult> {
        let final_frame = self.n_decoded_frames - self.n_pruned_frames;
        if final_frame < 1 {
            return Vec::new();
        }
        backtrack::get_all_hypothesis(&self.hyp, final_frame)
    }

    /// The stable decision `look_back` frames behind the stream head: the
    /// path ending at the best current hypothesis' `look_back`-th ancestor.
    /// Empty when the buffer holds too little history.
    pub fn get_best_hypothesis(&self, look_back: usize) -> DecodeResult {
        let current = self.n_decoded_frames - self.n_pruned_frames;
        if current < look_back + 1 {
            return DecodeResult::default();
        }

        match backtrack::find_best_ancestor(&self.hyp, current, look_back) {
            Some(node) => backtrack::get_hypothesis(&self.hyp, node, current - look_back),
            None => DecodeResult::default(),
        }
    }

    /// Drop history older than `look_back` frames behind the stream head,
    /// rebasing scores on the best surviving ancestor. A no-op when the
    /// buffer holds too little history.
    pub fn prune(&mut self, look_back: usize) {
        let current = self.n_decoded_frames - self.n_pruned_frames;
        if current < look_back + 1 {
            return;
        }

        let Some(best) = backtrack::find_best_ancestor(&self.hyp, current, look_back) else {
            return;
        };
        let base_score = best.score;

        let start_frame = current - look_back;
        backtrack::prune_and_normalize(&mut self.hyp, start_frame, look_back, base_score);
        self.n_pruned_frames = self.n_decoded_frames - look_back;
        tracing::debug!(look_back, base_score, "history pruned");
    }
}

//! Per-frame candidate staging: collect, prune, sort-merge, select top-K.

use crate::decoder::state::Hypothesis;
use crate::score::{is_valid_candidate, log_add};

/// Reusable staging area for one frame's candidate hypotheses.
///
/// `add` filters against the running best as candidates stream in; `store`
/// re-prunes against the final best, collapses equivalent hypotheses and
/// copies the surviving top-K into the next frame. The vectors are cleared
/// between frames, never freed.
pub(crate) struct CandidateBuffer<S> {
    best_score: f64,
    candidates: Vec<Hypothesis<S>>,
    ptrs: Vec<usize>,
}

impl<S: Clone + Ord> CandidateBuffer<S> {
    pub fn new() -> Self {
        Self {
            best_score: f64::NEG_INFINITY,
            candidates: Vec::new(),
            ptrs: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.best_score = f64::NEG_INFINITY;
        self.candidates.clear();
        self.ptrs.clear();
    }

    /// Stage a candidate if it is within `threshold` of the best seen so far.
    /// Rejected candidates are dropped silently.
    pub fn add(&mut self, candidate: Hypothesis<S>, threshold: f64) {
        if is_valid_candidate(&mut self.best_score, candidate.score, threshold) {
            self.candidates.push(candidate);
        }
    }

    /// Prune, merge and select into `next_frame`.
    ///
    /// The threshold prune runs again here because the best score may have
    /// risen after earlier candidates were accepted. Merging collapses runs
    /// of equal-key candidates onto the run's best-scoring member, combining
    /// scores by log-add or max per `log_add`.
    pub fn store(
        &mut self,
        next_frame: &mut Vec<Hypothesis<S>>,
        beam_size: usize,
        threshold: f64,
        log_add_merge: bool,
        return_sorted: bool,
    ) {
        let Self {
            best_score,
            candidates,
            ptrs,
        } = self;

        if candidates.is_empty() {
            next_frame.clear();
            return;
        }

        let cutoff = *best_score - threshold;
        ptrs.clear();
        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.score >= cutoff {
                ptrs.push(i);
            }
        }

        ptrs.sort_unstable_by(|&a, &b| candidates[a].cmp_merge_key_then_score(&candidates[b]));

        let mut n_merged = 1;
        for i in 1..ptrs.len() {
            let kept = ptrs[n_merged - 1];
            let cur = ptrs[i];
            if candidates[cur].cmp_merge_key(&candidates[kept]) != std::cmp::Ordering::Equal {
                ptrs[n_merged] = cur;
                n_merged += 1;
            } else {
                candidates[kept].score = if log_add_merge {
                    log_add(candidates[kept].score, candidates[cur].score)
                } else {
                    candidates[kept].score.max(candidates[cur].score)
                };
            }
        }
        ptrs.truncate(n_merged);

        if ptrs.len() > beam_size {
            pdqselect::select_by(ptrs, beam_size, |&a, &b| {
                candidates[a].score.total_cmp(&candidates[b].score).reverse()
            });
            ptrs.truncate(beam_size);
        }
        if return_sorted {
            ptrs.sort_unstable_by(|&a, &b| {
                candidates[a].score.total_cmp(&candidates[b].score).reverse()
            });
        }

        next_frame.clear();
        next_frame.extend(ptrs.iter().map(|&i| candidates[i].clone()));
    }
}

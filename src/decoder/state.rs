//! Hypothesis record and its merge ordering.

use std::cmp::Ordering;

use crate::lexicon::TrieNodeId;

/// One partial path through the search space.
///
/// `parent` is the slot of the predecessor in the previous frame's vector;
/// `None` marks the seed state (or a pruning base). Keeping an index rather
/// than a pointer lets frame vectors grow and the buffer rebase freely.
#[derive(Debug, Clone)]
pub(crate) struct Hypothesis<S> {
    /// Accumulated log-probability of the partial path.
    pub score: f64,
    /// Language-model conditioning context.
    pub lm_state: S,
    /// Position in the lexicon trie; the root means "between words".
    pub lex: TrieNodeId,
    /// Slot of the parent in the previous frame.
    pub parent: Option<usize>,
    /// Most recently emitted acoustic token.
    pub token: i32,
    /// Word emitted at this step, or -1.
    pub word: i32,
    /// Whether the previous emitted token was blank (CTC only).
    pub prev_blank: bool,
}

impl<S: Ord> Hypothesis<S> {
    /// Order by the merge equivalence key `(lm_state, lex, token, prev_blank)`.
    /// `Equal` means the two hypotheses collapse into one.
    pub fn cmp_merge_key(&self, other: &Self) -> Ordering {
        self.lm_state
            .cmp(&other.lm_state)
            .then_with(|| self.lex.cmp(&other.lex))
            .then_with(|| self.token.cmp(&other.token))
            .then_with(|| self.prev_blank.cmp(&other.prev_blank))
    }

    /// The merge-key order refined by descending score, so after sorting the
    /// first hypothesis of every equal-key run is the run's best and its
    /// parent is the one the merged state keeps.
    pub fn cmp_merge_key_then_score(&self, other: &Self) -> Ordering {
        self.cmp_merge_key(other)
            .then_with(|| other.score.total_cmp(&self.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hyp(lm_state: u32, lex: TrieNodeId, token: i32, prev_blank: bool, score: f64) -> Hypothesis<u32> {
        Hypothesis {
            score,
            lm_state,
            lex,
            parent: None,
            token,
            word: -1,
            prev_blank,
        }
    }

    fn node(trie: &mut crate::lexicon::Trie, spelling: &[i32]) -> TrieNodeId {
        trie.insert(spelling, 0, 0.0).unwrap()
    }

    #[test]
    fn equal_keys_merge_regardless_of_score() {
        let mut trie = crate::lexicon::Trie::new();
        let lex = node(&mut trie, &[2]);

        let a = hyp(1, lex, 2, false, -1.0);
        let b = hyp(1, lex, 2, false, -5.0);
        assert_eq!(a.cmp_merge_key(&b), Ordering::Equal);
    }

    #[test]
    fn key_distinguishes_every_component() {
        let mut trie = crate::lexicon::Trie::new();
        let lex_a = node(&mut trie, &[2]);
        let lex_b = node(&mut trie, &[3]);

        let base = hyp(1, lex_a, 2, false, 0.0);
        assert_ne!(base.cmp_merge_key(&hyp(2, lex_a, 2, false, 0.0)), Ordering::Equal);
        assert_ne!(base.cmp_merge_key(&hyp(1, lex_b, 2, false, 0.0)), Ordering::Equal);
        assert_ne!(base.cmp_merge_key(&hyp(1, lex_a, 3, false, 0.0)), Ordering::Equal);
        assert_ne!(base.cmp_merge_key(&hyp(1, lex_a, 2, true, 0.0)), Ordering::Equal);
    }

    #[test]
    fn within_a_key_higher_score_sorts_first() {
        let mut trie = crate::lexicon::Trie::new();
        let lex = node(&mut trie, &[2]);

        let better = hyp(1, lex, 2, false, -1.0);
        let worse = hyp(1, lex, 2, false, -3.0);
        assert_eq!(better.cmp_merge_key_then_score(&worse), Ordering::Less);
    }
}

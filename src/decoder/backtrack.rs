//! Parent-chain walking over the hypothesis buffer: alignment extraction,
//! best-ancestor search and history pruning.

use crate::decoder::state::Hypothesis;
use crate::types::DecodeResult;

/// Reconstruct the path ending at `node` (a state at `final_frame`),
/// collecting token and word alignments back to the buffer base.
pub(crate) fn get_hypothesis<S: Clone>(
    hyp: &[Vec<Hypothesis<S>>],
    node: &Hypothesis<S>,
    final_frame: usize,
) -> DecodeResult {
    let mut result = DecodeResult::new(final_frame + 1);
    result.score = node.score;

    let mut frame = final_frame;
    let mut current = node;
    loop {
        result.tokens[frame] = current.token;
        result.words[frame] = current.word;
        match current.parent {
            Some(slot) => {
                frame -= 1;
                current = &hyp[frame][slot];
            }
            None => break,
        }
    }

    result
}

/// Extract every hypothesis of `frame`, preserving the frame's order.
pub(crate) fn get_all_hypothesis<S: Clone>(
    hyp: &[Vec<Hypothesis<S>>],
    frame: usize,
) -> Vec<DecodeResult> {
    hyp[frame]
        .iter()
        .map(|node| get_hypothesis(hyp, node, frame))
        .collect()
}

/// Walk back `look_back` frames from the best-scoring state at `current`.
/// Returns `None` when the frame is empty or the chain is shorter.
pub(crate) fn find_best_ancestor<S: Clone>(
    hyp: &[Vec<Hypothesis<S>>],
    current: usize,
    look_back: usize,
) -> Option<&Hypothesis<S>> {
    let mut node = hyp[current]
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))?;

    let mut frame = current;
    for _ in 0..look_back {
        let slot = node.parent?;
        frame -= 1;
        node = &hyp[frame][slot];
    }

    Some(node)
}

/// Rebase the buffer so `start_frame` becomes frame 0, keeping `look_back`
/// frames of history, and subtract `base_score` from every surviving state
/// so ongoing arithmetic stays bounded. The new base frame's parents are
/// cleared to stop back-walks.
pub(crate) fn prune_and_normalize<S: Clone>(
    hyp: &mut [Vec<Hypothesis<S>>],
    start_frame: usize,
    look_back: usize,
    base_score: f64,
) {
    for frame in 0..=look_back {
        hyp.swap(frame, frame + start_frame);
    }
    for frame in hyp.iter_mut().skip(look_back + 1) {
        frame.clear();
    }

    for node in &mut hyp[0] {
        node.parent = None;
    }
    for frame in hyp.iter_mut().take(look_back + 1) {
        for node in frame.iter_mut() {
            node.score -= base_score;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Trie;

    fn hyp(token: i32, word: i32, score: f64, parent: Option<usize>) -> Hypothesis<()> {
        Hypothesis {
            score,
            lm_state: (),
            lex: Trie::new().root(),
            parent,
            token,
            word,
            prev_blank: false,
        }
    }

    /// Three frames: a seed, two states, and a final state whose chain is
    /// seed -> slot 1 -> final.
    fn buffer() -> Vec<Vec<Hypothesis<()>>> {
        vec![
            vec![hyp(0, -1, 0.0, None)],
            vec![hyp(2, -1, -4.0, Some(0)), hyp(3, -1, -1.0, Some(0))],
            vec![hyp(4, 7, -2.0, Some(1))],
        ]
    }

    #[test]
    fn hypothesis_walks_the_parent_chain() {
        let hyp = buffer();
        let result = get_hypothesis(&hyp, &hyp[2][0], 2);

        assert_eq!(result.score, -2.0);
        assert_eq!(result.tokens, vec![0, 3, 4]);
        assert_eq!(result.words, vec![-1, -1, 7]);
    }

    #[test]
    fn all_hypothesis_maps_the_frame() {
        let hyp = buffer();
        let results = get_all_hypothesis(&hyp, 1);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].tokens, vec![0, 2]);
        assert_eq!(results[1].tokens, vec![0, 3]);
    }

    #[test]
    fn best_ancestor_follows_the_best_leaf() {
        let hyp = buffer();

        let best = find_best_ancestor(&hyp, 2, 0).unwrap();
        assert_eq!(best.token, 4);

        let ancestor = find_best_ancestor(&hyp, 2, 1).unwrap();
        assert_eq!(ancestor.token, 3);
    }

    #[test]
    fn best_ancestor_of_empty_frame_is_none() {
        let hyp: Vec<Vec<Hypothesis<()>>> = vec![vec![]];
        assert!(find_best_ancestor(&hyp, 0, 0).is_none());
    }

    #[test]
    fn best_ancestor_respects_chain_length() {
        let hyp = buffer();
        assert!(find_best_ancestor(&hyp, 2, 3).is_none());
    }

    #[test]
    fn prune_rebases_and_normalizes() {
        let mut hyp = buffer();
        // keep one frame of history; frame 1 becomes the base
        prune_and_normalize(&mut hyp, 1, 1, -1.0);

        assert_eq!(hyp[0].len(), 2);
        assert_eq!(hyp[1].len(), 1);
        assert!(hyp[2].is_empty());

        // base parents cleared, scores shifted by the base score
        assert!(hyp[0].iter().all(|h| h.parent.is_none()));
        assert_eq!(hyp[0][1].score, 0.0);
        assert_eq!(hyp[1][0].score, -1.0);

        // links from kept frames still resolve
        let result = get_hypothesis(&hyp, &hyp[1][0], 1);
        assert_eq!(result.tokens, vec![3, 4]);
    }
}

//! Confidence scoring for generated answers
//!
//! Scores a candidate answer by its surface lexical overlap with the
//! question: `2 * M / T`, where `M` is the number of characters covered by
//! matching blocks and `T` the combined length of both strings. Blocks are
//! found greedily: take the longest common block, then recurse on the
//! unmatched text to its left and to its right.
//!
//! This is a cheap proxy, not a semantic check. An answer that echoes the
//! question scores high; a correct answer in different words scores low.

use std::collections::HashMap;

/// Candidates at least this long are subject to the popular-character heuristic
const AUTOJUNK_MIN_LEN: usize = 200;

/// Stateless scorer for (question, candidate answer) pairs
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    autojunk: bool,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self { autojunk: true }
    }
}

impl ConfidenceScorer {
    pub fn new(autojunk: bool) -> Self {
        Self { autojunk }
    }

    /// Score in `[0.0, 1.0]`; case-insensitive and deterministic.
    pub fn score(&self, question: &str, candidate: &str) -> f64 {
        let a: Vec<char> = question.to_lowercase().chars().collect();
        let b: Vec<char> = candidate.to_lowercase().chars().collect();

        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }

        let matched = BlockMatcher::new(&a, &b, self.autojunk).matched_len();
        2.0 * matched as f64 / total as f64
    }
}

/// Greedy longest-matching-block search over two character sequences.
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, minus popular characters
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char], autojunk: bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b2j.entry(ch).or_default().push(j);
        }

        // Characters that are too common in a long `b` don't seed matches.
        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block in `a[alo..ahi]` x `b[blo..bhi]` as `(i, j, size)`.
    /// Ties go to the earliest start in `a`, then in `b`.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j2len[j] = length of the block ending at a[i - 1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0) + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters never seed a block but may still extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total size of all matching blocks
    fn matched_len(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        let scorer = ConfidenceScorer::default();
        assert!(approx(scorer.score("abcd", "abcd"), 1.0));
        assert!(approx(scorer.score("", ""), 1.0));
    }

    #[test]
    fn test_disjoint_strings() {
        let scorer = ConfidenceScorer::default();
        assert!(approx(scorer.score("abc", "xyz"), 0.0));
        assert!(approx(scorer.score("abc", ""), 0.0));
    }

    #[test]
    fn test_known_ratios() {
        let scorer = ConfidenceScorer::default();
        // blocks "ab" + "d" out of 8 characters
        assert!(approx(scorer.score("abcd", "abxd"), 0.75));
        // blocks "a" + "b" after recursing on the right of "a"
        assert!(approx(scorer.score("ab", "acb"), 0.8));
        // greedy picks the leading "t" and leaves nothing to recurse on
        assert!(approx(scorer.score("tide", "diet"), 0.25));
    }

    #[test]
    fn test_case_insensitive() {
        let scorer = ConfidenceScorer::default();
        let q = "What is Norton University?";
        let a = "Norton University is a private university in Cambodia.";
        assert_eq!(scorer.score(q, a), scorer.score(&q.to_uppercase(), &a.to_uppercase()));
    }

    #[test]
    fn test_deterministic() {
        let scorer = ConfidenceScorer::default();
        let q = "How do I register for courses?";
        let a = "Registration opens in the first week; see the registrar's office.";
        let first = scorer.score(q, a);
        for _ in 0..10 {
            assert_eq!(scorer.score(q, a), first);
        }
    }

    #[test]
    fn test_echoing_answer_scores_high() {
        let scorer = ConfidenceScorer::default();
        let q = "What is Norton University?";
        // Local text generators usually echo the prompt
        let echo = "What is Norton University? Norton University";
        assert!(scorer.score(q, echo) >= 0.7);
        assert!(scorer.score(q, "I am a cat") < 0.7);
    }

    #[test]
    fn test_score_bounds() {
        let scorer = ConfidenceScorer::default();
        let long: String = "the campus library is open every weekday. ".repeat(10);
        for candidate in ["", "x", long.as_str(), "What?"] {
            let s = scorer.score("Is the library open on weekdays?", candidate);
            assert!((0.0..=1.0).contains(&s), "score {} out of range", s);
        }
    }

    #[test]
    fn test_autojunk_changes_long_candidates_only() {
        let with = ConfidenceScorer::new(true);
        let without = ConfidenceScorer::new(false);

        let short = "where is the admissions office";
        assert_eq!(
            with.score("admissions office", short),
            without.score("admissions office", short)
        );

        // Spaces and 'e' are popular in a long candidate and cannot seed a block
        let long: String = "e ".repeat(150);
        assert!(long.chars().count() >= AUTOJUNK_MIN_LEN);
        assert_eq!(with.score("q e", &long), 0.0);
        assert!(without.score("q e", &long) > 0.0);
    }
}

//! Typed-answer grading.

/// How a typed answer compares with the expected word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerGrade {
    /// Matches the answer (case-insensitive, surrounding whitespace ignored).
    Exact,
    /// Close enough to deserve another try; progress is not touched.
    NearMiss,
    /// Wrong; graded as an incorrect answer.
    Miss,
}

impl AnswerGrade {
    /// `Some(correct)` for graded outcomes, `None` for a free retry.
    #[must_use]
    pub fn as_outcome(self) -> Option<bool> {
        match self {
            AnswerGrade::Exact => Some(true),
            AnswerGrade::Miss => Some(false),
            AnswerGrade::NearMiss => None,
        }
    }
}

/// Grade `input` against `expected`.
///
/// Inputs whose similarity `1 - distance / max_len` is strictly above
/// `near_miss_threshold` count as near misses.
#[must_use]
pub fn grade_answer(input: &str, expected: &str, near_miss_threshold: f64) -> AnswerGrade {
    let given = input.trim().to_lowercase();
    let wanted = expected.trim().to_lowercase();

    if given.is_empty() {
        return AnswerGrade::Miss;
    }
    if given == wanted {
        return AnswerGrade::Exact;
    }

    if similarity(&given, &wanted) > near_miss_threshold {
        AnswerGrade::NearMiss
    } else {
        AnswerGrade::Miss
    }
}

/// Normalized similarity in `[0, 1]` based on edit distance over characters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Edit distance (insertions, deletions, substitutions) over `char`s.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("exam", ""), 4);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("arkadaş", "arkadas"), 1);
    }

    #[test]
    fn exact_ignores_case_and_whitespace() {
        assert_eq!(grade_answer("  Exam ", "exam", 0.3), AnswerGrade::Exact);
    }

    #[test]
    fn close_answers_are_near_misses() {
        assert_eq!(grade_answer("exan", "exam", 0.3), AnswerGrade::NearMiss);
        assert_eq!(grade_answer("grocery", "groceries", 0.3), AnswerGrade::NearMiss);
    }

    #[test]
    fn distant_answers_are_misses() {
        assert_eq!(grade_answer("zzzzzz", "exam", 0.3), AnswerGrade::Miss);
        assert_eq!(grade_answer("", "exam", 0.3), AnswerGrade::Miss);
    }

    #[test]
    fn outcome_mapping() {
        assert_eq!(AnswerGrade::Exact.as_outcome(), Some(true));
        assert_eq!(AnswerGrade::Miss.as_outcome(), Some(false));
        assert_eq!(AnswerGrade::NearMiss.as_outcome(), None);
    }
}

//! Attempt state and score aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluate::{evaluate_question, Outcome, Selection};
use crate::model::Question;

/// The selections made during one attempt, keyed by 0-based question position.
///
/// Positions without an entry are unanswered. An empty selection is never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    selections: BTreeMap<usize, Selection>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: usize) -> Option<&Selection> {
        self.selections.get(&position)
    }

    /// Record a selection, or drop the entry when the selection is empty.
    pub fn set(&mut self, position: usize, selection: Selection) {
        if selection.is_empty() {
            self.selections.remove(&position);
        } else {
            self.selections.insert(position, selection);
        }
    }

    pub fn remove(&mut self, position: usize) -> Option<Selection> {
        self.selections.remove(&position)
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Number of answered positions.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn is_answered(&self, position: usize) -> bool {
        self.selections.contains_key(&position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Selection)> {
        self.selections.iter().map(|(p, s)| (*p, s))
    }
}

/// Summary of a graded attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub total: usize,
    /// `correct / total` as a whole percentage, rounded half up; 0 when
    /// there are no questions.
    pub percentage: u32,
}

/// Whole-number percentage of `correct` out of `total`, rounded half up.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct * 200 + total) / (2 * total)) as u32
}

/// Grade every question in order.
pub fn outcomes(questions: &[Question], attempt: &AttemptState) -> Vec<Outcome> {
    questions
        .iter()
        .enumerate()
        .map(|(position, q)| evaluate_question(q, attempt.get(position)))
        .collect()
}

/// Fold per-question outcomes into a summary.
pub fn summarize(outcomes: &[Outcome]) -> ScoreSummary {
    let mut summary = ScoreSummary {
        total: outcomes.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Correct => summary.correct += 1,
            Outcome::Incorrect => summary.incorrect += 1,
            Outcome::Unanswered => summary.unanswered += 1,
        }
    }
    summary.percentage = percentage(summary.correct, summary.total);
    summary
}

/// Score an attempt over the full question sequence.
pub fn score(questions: &[Question], attempt: &AttemptState) -> ScoreSummary {
    summarize(&outcomes(questions, attempt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalAnswer;

    fn question(id: u32, answer: &[&str], multi: bool) -> Question {
        Question {
            id,
            text: format!("Question {id}"),
            options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
            is_multiple_choice: multi,
            answer: CanonicalAnswer::from_labels(answer.iter().copied()),
            explanation: String::new(),
            source: None,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 200), 1); // 0.5
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn one_of_three_answered_correctly() {
        let questions = vec![
            question(1, &["A"], false),
            question(2, &["B"], false),
            question(3, &["C", "D"], true),
        ];
        let mut attempt = AttemptState::new();
        attempt.set(0, Selection::Single("w".into()));

        let summary = score(&questions, &attempt);
        assert_eq!(
            summary,
            ScoreSummary {
                correct: 1,
                incorrect: 0,
                unanswered: 2,
                total: 3,
                percentage: 33,
            }
        );
    }

    #[test]
    fn mixed_outcomes() {
        let questions = vec![
            question(1, &["A"], false),
            question(2, &["B"], false),
            question(3, &["C", "D"], true),
            question(4, &[], false),
        ];
        let mut attempt = AttemptState::new();
        attempt.set(0, Selection::Single("w".into()));
        attempt.set(1, Selection::Single("w".into()));
        attempt.set(2, Selection::Multiple(vec!["z".into(), "y".into()]));
        attempt.set(3, Selection::Single("w".into()));

        let summary = score(&questions, &attempt);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 2);
        assert_eq!(summary.unanswered, 0);
        assert_eq!(summary.percentage, 50);
    }

    #[test]
    fn empty_sequence_scores_zero() {
        let summary = score(&[], &AttemptState::new());
        assert_eq!(summary, ScoreSummary::default());
    }

    #[test]
    fn scoring_is_idempotent() {
        let questions = vec![question(1, &["A"], false), question(2, &["B"], false)];
        let mut attempt = AttemptState::new();
        attempt.set(1, Selection::Single("x".into()));
        let before = attempt.clone();

        let first = score(&questions, &attempt);
        let second = score(&questions, &attempt);
        assert_eq!(first, second);
        assert_eq!(attempt, before);
    }

    #[test]
    fn empty_selection_is_not_stored() {
        let mut attempt = AttemptState::new();
        attempt.set(0, Selection::Multiple(vec!["w".into()]));
        assert!(attempt.is_answered(0));
        attempt.set(0, Selection::Multiple(vec![]));
        assert!(!attempt.is_answered(0));
        assert!(attempt.is_empty());
    }
}

//! Per-option view tuples for a presentation layer.
//!
//! Views are derived on demand from a question and its current selection and
//! are never cached, so they always reflect the latest selection.

use serde::Serialize;

use crate::evaluate::{is_correct_option, Selection};
use crate::model::{label_of, Question};

/// How one option should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// `A`, `B`, …; `?` for options past `Z`.
    pub label: char,
    pub text: String,
    pub is_selected: bool,
    /// Only set when correctness is revealed.
    pub is_correct_option: bool,
    /// Selected but not correct; only set when correctness is revealed.
    pub is_wrong_selection: bool,
}

/// Build the option views for `question`.
pub fn option_views(question: &Question, selection: Option<&Selection>, reveal: bool) -> Vec<OptionView> {
    question
        .options
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let is_selected = selection.is_some_and(|s| s.contains(text));
            let correct = is_correct_option(index, &question.answer, &question.options);
            OptionView {
                label: label_of(index).map(|l| l.as_char()).unwrap_or('?'),
                text: text.clone(),
                is_selected,
                is_correct_option: reveal && correct,
                is_wrong_selection: reveal && is_selected && !correct,
            }
        })
        .collect()
}

/// The correct answer as shown to the user: `"C, E"` or `"Not specified"`.
pub fn answer_display(question: &Question) -> String {
    question.answer.to_string()
}

/// Labels of the selected options, joined with `", "`. Options that are not
/// in the question are shown as `?`.
pub fn selection_display(question: &Question, selection: Option<&Selection>) -> String {
    let Some(selection) = selection else {
        return String::new();
    };
    selection
        .labels(&question.options)
        .into_iter()
        .map(|l| l.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalAnswer;

    fn question() -> Question {
        Question {
            id: 1,
            text: "Pick two".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            is_multiple_choice: true,
            answer: CanonicalAnswer::from_labels(["B", "D"]),
            explanation: String::new(),
            source: None,
        }
    }

    #[test]
    fn hidden_correctness() {
        let q = question();
        let selection = Selection::Multiple(vec!["a".into()]);
        let views = option_views(&q, Some(&selection), false);
        assert_eq!(views.len(), 4);
        assert_eq!(views[0].label, 'A');
        assert!(views[0].is_selected);
        assert!(!views[0].is_wrong_selection);
        assert!(views.iter().all(|v| !v.is_correct_option));
    }

    #[test]
    fn revealed_correctness() {
        let q = question();
        let selection = Selection::Multiple(vec!["a".into(), "b".into()]);
        let views = option_views(&q, Some(&selection), true);
        let flags: Vec<(bool, bool, bool)> = views
            .iter()
            .map(|v| (v.is_selected, v.is_correct_option, v.is_wrong_selection))
            .collect();
        assert_eq!(
            flags,
            vec![
                (true, false, true),
                (true, true, false),
                (false, false, false),
                (false, true, false),
            ]
        );
    }

    #[test]
    fn displays() {
        let q = question();
        assert_eq!(answer_display(&q), "B, D");
        let selection = Selection::Multiple(vec!["d".into(), "zz".into()]);
        assert_eq!(selection_display(&q, Some(&selection)), "D, ?");
        assert_eq!(selection_display(&q, None), "");
    }
}

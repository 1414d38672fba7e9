//! Correctness evaluation.
//!
//! A [`Selection`] holds option texts as the user picked them. Evaluation maps
//! each picked option to its label by position and compares the result with the
//! question's [`CanonicalAnswer`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{label_of, CanonicalAnswer, Label, Question};

/// The user's current answer to one question.
///
/// Options are held by text and resolved to the first option with that
/// text. When two options share the same text, picking the later one grades
/// as the earlier one's label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// One chosen option (single-select questions).
    Single(String),
    /// Chosen options in the order they were picked (multiple-select
    /// questions). Empty means no answer.
    Multiple(Vec<String>),
}

impl Selection {
    /// An empty multi-selection is the same as no answer.
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Single(_) => false,
            Selection::Multiple(chosen) => chosen.is_empty(),
        }
    }

    /// The chosen option texts.
    pub fn options(&self) -> &[String] {
        match self {
            Selection::Single(option) => std::slice::from_ref(option),
            Selection::Multiple(chosen) => chosen,
        }
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options().iter().any(|o| o == option)
    }

    /// Labels of the chosen options; `None` for an option not in `options`.
    pub fn labels(&self, options: &[String]) -> Vec<Option<Label>> {
        self.options()
            .iter()
            .map(|o| option_label(o, options))
            .collect()
    }
}

/// Result of grading one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Incorrect => write!(f, "incorrect"),
            Outcome::Unanswered => write!(f, "unanswered"),
        }
    }
}

fn option_label(option: &str, options: &[String]) -> Option<Label> {
    options.iter().position(|o| o == option).and_then(label_of)
}

/// Grade a selection against a canonical answer.
///
/// `Unanswered` when nothing is selected. Otherwise an unspecified answer is
/// always `Incorrect`, and so is any selection containing an option that is
/// not in `options`.
///
/// A single selection is correct when its label equals the one canonical
/// label, or when the canonical label equals the upper-cased option text
/// (free-text answers from imports). A multiple selection is correct when its
/// label set equals the canonical set exactly.
pub fn evaluate(
    selection: Option<&Selection>,
    answer: &CanonicalAnswer,
    options: &[String],
) -> Outcome {
    let Some(selection) = selection.filter(|s| !s.is_empty()) else {
        return Outcome::Unanswered;
    };
    if answer.is_unspecified() {
        return Outcome::Incorrect;
    }

    let correct = match selection {
        Selection::Single(option) => single_matches(option, answer, options),
        Selection::Multiple(chosen) => multiple_matches(chosen, answer, options),
    };

    if correct {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}

/// [`evaluate`] against a question's own answer and options.
pub fn evaluate_question(question: &Question, selection: Option<&Selection>) -> Outcome {
    evaluate(selection, &question.answer, &question.options)
}

fn single_matches(option: &str, answer: &CanonicalAnswer, options: &[String]) -> bool {
    let Some(label) = option_label(option, options) else {
        return false;
    };
    let Some(expected) = answer.sole() else {
        return false;
    };
    expected == label.to_string() || expected == option.trim().to_uppercase()
}

fn multiple_matches(chosen: &[String], answer: &CanonicalAnswer, options: &[String]) -> bool {
    let mut selected = BTreeSet::new();
    for option in chosen {
        match option_label(option, options) {
            Some(label) => {
                selected.insert(label.to_string());
            }
            None => return false,
        }
    }
    selected.len() == answer.len() && selected.iter().all(|l| answer.contains(l))
}

/// Whether the option at `index` is (one of) the correct option(s).
pub fn is_correct_option(index: usize, answer: &CanonicalAnswer, options: &[String]) -> bool {
    let Some(label) = label_of(index) else {
        return false;
    };
    if answer.contains(&label.to_string()) {
        return true;
    }
    match (answer.sole(), options.get(index)) {
        (Some(expected), Some(text)) => expected == text.trim().to_uppercase(),
        _ => false,
    }
}

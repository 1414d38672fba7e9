//! Answer normalization.
//!
//! Sources encode the correct answer as a single letter, a run of letters
//! (`"CE"`), a list of letters, or occasionally free text. [`normalize`] folds
//! all of them into one [`CanonicalAnswer`].

use crate::model::{CanonicalAnswer, RawAnswer};

/// Normalize a raw correct-answer field.
///
/// - A list: every element is trimmed and upper-cased and taken as a label.
/// - A string of two or more uppercase ASCII letters on a multiple-choice
///   question: each letter is a label (`"CE"` → `{C, E}`).
/// - Any other string: the trimmed, upper-cased string is the one label, even
///   when it is a whole word.
/// - Absent or blank: the unspecified (empty) answer.
///
/// `options` only decides which entries can ever match; entries naming no
/// option are kept and reported by validation.
pub fn normalize(raw: &RawAnswer, options: &[String], is_multiple_choice: bool) -> CanonicalAnswer {
    let answer = match raw {
        RawAnswer::Absent => CanonicalAnswer::unspecified(),
        RawAnswer::Labels(items) => CanonicalAnswer::from_labels(
            items
                .iter()
                .map(|item| item.trim().to_uppercase())
                .filter(|label| !label.is_empty()),
        ),
        RawAnswer::Text(text) if is_multiple_choice && is_letter_run(text) => {
            CanonicalAnswer::from_labels(text.chars().map(String::from))
        }
        RawAnswer::Text(text) => {
            let label = text.trim().to_uppercase();
            if label.is_empty() {
                CanonicalAnswer::unspecified()
            } else {
                CanonicalAnswer::from_labels([label])
            }
        }
    };

    let out_of_range = answer.invalid_labels(options);
    if !out_of_range.is_empty() {
        tracing::debug!(?out_of_range, "answer names labels outside the option list");
    }

    answer
}

/// Two or more characters, all `A`–`Z`. Checked on the untrimmed text.
fn is_letter_run(text: &str) -> bool {
    text.len() > 1 && text.bytes().all(|b| b.is_ascii_uppercase())
}

//! Question and option shuffling.
//!
//! Moving an option moves its label, so every label entry of the canonical
//! answer is rewritten to the option's new position. Free-text entries name
//! their option by text and are left as they are.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{label_of, CanonicalAnswer, Label, Question, QuestionSet};

/// Shuffle a question's options in place and remap its answer.
///
/// Questions with more options than there are labels are left untouched.
pub fn shuffle_options<R: Rng + ?Sized>(question: &mut Question, rng: &mut R) {
    let count = question.options.len();
    if count > 0 && label_of(count - 1).is_none() {
        tracing::debug!(id = question.id, count, "too many options to shuffle");
        return;
    }

    // order[new] = old
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(rng);
    let mut moved_to = vec![0; count];
    for (new, &old) in order.iter().enumerate() {
        moved_to[old] = new;
    }

    let answer = CanonicalAnswer::from_labels(question.answer.iter().map(|entry| {
        match entry.parse::<Label>() {
            Ok(label) if label.index() < count => label_of(moved_to[label.index()])
                .map_or_else(|| entry.to_string(), |l| l.to_string()),
            _ => entry.to_string(),
        }
    }));

    question.options = order.iter().map(|&old| question.options[old].clone()).collect();
    question.answer = answer;
}

/// Shuffle the order of a set's questions and the options of each one.
///
/// Question ids travel with their questions.
pub fn shuffle_question_set<R: Rng + ?Sized>(set: &mut QuestionSet, rng: &mut R) {
    set.questions.shuffle(rng);
    for question in &mut set.questions {
        shuffle_options(question, rng);
    }
    tracing::debug!(set = %set.key, count = set.questions.len(), "shuffled question set");
}

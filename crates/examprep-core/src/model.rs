//! Core data model types for examprep.
//!
//! Questions arrive as [`QuestionRecord`]s carrying a loosely-shaped raw
//! answer, and are normalized once at load time into immutable [`Question`]s
//! holding a [`CanonicalAnswer`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::normalize::normalize;

/// Number of distinct option labels (`A` through `Z`).
///
/// Questions with more options than this cannot label the extra options and
/// are not supported.
pub const MAX_OPTIONS: usize = 26;

/// A single uppercase letter identifying an option by its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(u8);

impl Label {
    /// Label for the option at `index`, or `None` past `Z`.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_OPTIONS).then(|| Label(b'A' + index as u8))
    }

    /// 0-based option position this label refers to.
    pub fn index(self) -> usize {
        (self.0 - b'A') as usize
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

/// Label for the option at `index` (0 → `A`, 1 → `B`, …). Total only for
/// indices below [`MAX_OPTIONS`].
pub fn label_of(index: usize) -> Option<Label> {
    Label::from_index(index)
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Ok(Label(c.to_ascii_uppercase() as u8))
            }
            _ => Err(format!("not an option label: {trimmed:?}")),
        }
    }
}

impl TryFrom<String> for Label {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

/// The correct-answer field exactly as a question source supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawAnswer {
    /// No answer was supplied.
    #[default]
    Absent,
    /// A single string: one label, several run-together labels, or free text.
    Text(String),
    /// A list of labels.
    Labels(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswerRepr {
    Many(Vec<Scalar>),
    One(Scalar),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for RawAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawAnswerRepr>::deserialize(deserializer)? {
            None => RawAnswer::Absent,
            Some(RawAnswerRepr::One(s)) => RawAnswer::Text(s.into_string()),
            Some(RawAnswerRepr::Many(items)) => {
                RawAnswer::Labels(items.into_iter().map(Scalar::into_string).collect())
            }
        })
    }
}

impl Serialize for RawAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawAnswer::Absent => serializer.serialize_none(),
            RawAnswer::Text(s) => serializer.serialize_str(s),
            RawAnswer::Labels(labels) => labels.serialize(serializer),
        }
    }
}

/// The normalized correct answer of a question: a duplicate-free set of
/// labels.
///
/// Labels are kept as strings because malformed sources can produce entries
/// that are not single letters (free text, out-of-range letters). Such entries
/// never match a selection unless they equal an option's text; see
/// [`CanonicalAnswer::invalid_labels`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalAnswer(BTreeSet<String>);

impl CanonicalAnswer {
    /// The empty ("not specified") answer.
    pub fn unspecified() -> Self {
        Self::default()
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// `true` when the source supplied no usable answer.
    pub fn is_unspecified(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The only entry, when the answer has exactly one.
    pub fn sole(&self) -> Option<&str> {
        match self.0.len() {
            1 => self.0.iter().next().map(String::as_str),
            _ => None,
        }
    }

    /// Option index named by `entry`: a label in range, or the upper-cased
    /// text of an option (free-text answers from imports).
    pub fn option_named_by(entry: &str, options: &[String]) -> Option<usize> {
        if let Ok(label) = entry.parse::<Label>() {
            if label.index() < options.len() {
                return Some(label.index());
            }
        }
        options
            .iter()
            .position(|o| o.trim().to_uppercase() == entry)
    }

    /// Indices of the options the answer names, ascending.
    pub fn option_indices(&self, options: &[String]) -> Vec<usize> {
        let indices: BTreeSet<usize> = self
            .0
            .iter()
            .filter_map(|s| Self::option_named_by(s, options))
            .collect();
        indices.into_iter().collect()
    }

    /// Entries that name none of `options`, by label or by text.
    pub fn invalid_labels(&self, options: &[String]) -> Vec<&str> {
        self.0
            .iter()
            .filter(|s| Self::option_named_by(s, options).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Whether every entry names an option. Unspecified answers are not
    /// scoreable.
    pub fn is_scoreable(&self, options: &[String]) -> bool {
        !self.is_empty() && self.invalid_labels(options).is_empty()
    }
}

impl fmt::Display for CanonicalAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "Not specified");
        }
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(", "))
    }
}

/// A question as handed over by a loader or importer, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique positive identifier within the loaded set.
    pub id: u32,
    /// The prompt.
    pub question: String,
    /// Option texts; position determines the label.
    pub options: Vec<String>,
    /// Whether more than one option is expected.
    #[serde(default)]
    pub is_multiple_choice: bool,
    /// The correct answer in whatever shape the source used.
    #[serde(default, alias = "correct_answer")]
    pub raw_correct_answer: RawAnswer,
    #[serde(default)]
    pub explanation: String,
    /// Name of the set the record came from.
    #[serde(default)]
    pub source: Option<String>,
}

/// A normalized question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub is_multiple_choice: bool,
    pub answer: CanonicalAnswer,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl Question {
    /// Normalize a record. The raw answer is consumed here and nowhere else.
    pub fn from_record(record: QuestionRecord) -> Self {
        let answer = normalize(
            &record.raw_correct_answer,
            &record.options,
            record.is_multiple_choice,
        );
        Self {
            id: record.id,
            text: record.question,
            options: record.options,
            is_multiple_choice: record.is_multiple_choice,
            answer,
            explanation: record.explanation,
            source: record.source,
        }
    }

    /// A question needs at least two options to be asked.
    pub fn is_usable(&self) -> bool {
        self.options.len() >= 2
    }

    /// Whether some selection can grade `Correct`.
    ///
    /// A single selection is compared with the one canonical entry, which may
    /// be a label or an option's text. A multiple selection is compared as a
    /// label set, so every entry must be a label in range.
    pub fn is_scoreable(&self) -> bool {
        if self.is_multiple_choice {
            !self.answer.is_empty()
                && self
                    .answer
                    .iter()
                    .all(|e| e.parse::<Label>().is_ok_and(|l| l.index() < self.options.len()))
        } else {
            self.answer
                .sole()
                .is_some_and(|e| CanonicalAnswer::option_named_by(e, &self.options).is_some())
        }
    }

    /// Label of the first option whose text equals `option`.
    pub fn label_of_option(&self, option: &str) -> Option<Label> {
        self.options
            .iter()
            .position(|o| o == option)
            .and_then(label_of)
    }
}

/// A named group of questions loaded from one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Short identifier used for selection (e.g. "mock2").
    pub key: String,
    /// Human-readable name, copied into each question's `source`.
    pub name: String,
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_positions() {
        assert_eq!(label_of(0).unwrap().to_string(), "A");
        assert_eq!(label_of(4).unwrap().to_string(), "E");
        assert_eq!(label_of(25).unwrap().as_char(), 'Z');
        assert!(label_of(26).is_none());
        assert_eq!(label_of(3).unwrap().index(), 3);
    }

    #[test]
    fn label_parse() {
        assert_eq!(" c ".parse::<Label>().unwrap(), label_of(2).unwrap());
        assert!("CE".parse::<Label>().is_err());
        assert!("".parse::<Label>().is_err());
        assert!("1".parse::<Label>().is_err());
    }

    #[test]
    fn raw_answer_from_json_shapes() {
        let text: RawAnswer = serde_json::from_str(r#""CE""#).unwrap();
        assert_eq!(text, RawAnswer::Text("CE".into()));

        let list: RawAnswer = serde_json::from_str(r#"["D", "E"]"#).unwrap();
        assert_eq!(list, RawAnswer::Labels(vec!["D".into(), "E".into()]));

        let null: RawAnswer = serde_json::from_str("null").unwrap();
        assert_eq!(null, RawAnswer::Absent);

        let number: RawAnswer = serde_json::from_str("3").unwrap();
        assert_eq!(number, RawAnswer::Text("3".into()));
    }

    #[test]
    fn record_without_answer_is_absent() {
        let record: QuestionRecord = serde_json::from_str(
            r#"{"id": 1, "question": "Q?", "options": ["a", "b"], "is_multiple_choice": false}"#,
        )
        .unwrap();
        assert_eq!(record.raw_correct_answer, RawAnswer::Absent);
    }

    fn opts(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn canonical_answer_validity() {
        let options = opts(&["a", "b", "c", "d"]);
        let answer = CanonicalAnswer::from_labels(["B", "F", "PARIS"]);
        assert_eq!(answer.option_indices(&options), vec![1]);
        assert_eq!(answer.invalid_labels(&options), vec!["F", "PARIS"]);
        assert!(!answer.is_scoreable(&options));
        assert!(CanonicalAnswer::from_labels(["B", "D"]).is_scoreable(&options));
        assert!(!CanonicalAnswer::from_labels(["PARIS"]).is_scoreable(&options));
        assert!(!CanonicalAnswer::unspecified().is_scoreable(&options));
    }

    #[test]
    fn free_text_answer_names_its_option() {
        let options = opts(&["Paris", " Rome "]);
        let answer = CanonicalAnswer::from_labels(["PARIS"]);
        assert!(answer.invalid_labels(&options).is_empty());
        assert_eq!(answer.option_indices(&options), vec![0]);
        assert!(answer.is_scoreable(&options));
        assert_eq!(CanonicalAnswer::option_named_by("ROME", &options), Some(1));
        assert_eq!(CanonicalAnswer::option_named_by("C", &options), None);
    }

    #[test]
    fn question_scoreability_follows_selection_kind() {
        let question = |multi: bool, answer: &[&str]| Question {
            id: 1,
            text: "Q".into(),
            options: opts(&["Paris", "Rome", "Oslo"]),
            is_multiple_choice: multi,
            answer: CanonicalAnswer::from_labels(answer.iter().copied()),
            explanation: String::new(),
            source: None,
        };
        assert!(question(false, &["PARIS"]).is_scoreable());
        assert!(question(false, &["B"]).is_scoreable());
        assert!(!question(false, &["A", "B"]).is_scoreable());
        assert!(question(true, &["A", "C"]).is_scoreable());
        assert!(!question(true, &["A", "PARIS"]).is_scoreable());
        assert!(!question(true, &[]).is_scoreable());
    }

    #[test]
    fn canonical_answer_display() {
        assert_eq!(CanonicalAnswer::from_labels(["E", "C"]).to_string(), "C, E");
        assert_eq!(CanonicalAnswer::unspecified().to_string(), "Not specified");
    }

    #[test]
    fn question_from_record_normalizes() {
        let record = QuestionRecord {
            id: 9,
            question: "Pick two".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            is_multiple_choice: true,
            raw_correct_answer: RawAnswer::Text("CE".into()),
            explanation: String::new(),
            source: Some("Mock".into()),
        };
        let q = Question::from_record(record);
        assert_eq!(q.answer, CanonicalAnswer::from_labels(["C", "E"]));
        assert_eq!(q.label_of_option("d"), label_of(3));
        assert_eq!(q.label_of_option("zzz"), None);
        assert!(q.is_usable());
    }
}

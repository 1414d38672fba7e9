//! Question-set loader.
//!
//! Loads bundled question sets from JSON or TOML files and directories,
//! normalizes every question, and validates sets for data-quality issues.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::model::{label_of, Question, QuestionRecord, QuestionSet, RawAnswer};

/// On-disk question record, as found in bundled sets.
#[derive(Debug, Serialize, Deserialize)]
struct BundledQuestion {
    question: String,
    #[serde(default, alias = "options")]
    choices: Vec<String>,
    #[serde(default, skip_serializing_if = "is_absent")]
    correct_answer: RawAnswer,
    #[serde(default)]
    is_multiple_choice: bool,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SetHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SetDocument {
    question_set: SetHeader,
    #[serde(default)]
    questions: Vec<BundledQuestion>,
}

fn is_absent(answer: &RawAnswer) -> bool {
    matches!(answer, RawAnswer::Absent)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSetFile {
    Bare(Vec<BundledQuestion>),
    Document(SetDocument),
}

/// Supported question-set file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFormat {
    Json,
    Toml,
}

impl SetFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(SetFormat::Json),
            "toml" => Ok(SetFormat::Toml),
            _ => Err(ImportError::UnsupportedExtension(ext)),
        }
    }
}

/// Remove a leading `"A. "` style prefix from a choice.
pub fn strip_choice_prefix(choice: &str) -> &str {
    let bytes = choice.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_uppercase() && bytes[1] == b'.' {
        choice[2..].trim()
    } else {
        choice.trim()
    }
}

/// Parse a single question-set file.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let format = SetFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    parse_question_set_str(&content, format, path)
}

/// Parse question-set content (useful for testing).
///
/// The set key and name default to the file stem of `source_path`.
pub fn parse_question_set_str(
    content: &str,
    format: SetFormat,
    source_path: &Path,
) -> Result<QuestionSet> {
    let (header, bundled) = match format {
        SetFormat::Json => {
            let parsed: JsonSetFile = serde_json::from_str(content)
                .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
            match parsed {
                JsonSetFile::Bare(questions) => (None, questions),
                JsonSetFile::Document(doc) => (Some(doc.question_set), doc.questions),
            }
        }
        SetFormat::Toml => {
            let doc: SetDocument = toml::from_str(content)
                .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
            (Some(doc.question_set), doc.questions)
        }
    };

    let stem = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("questions")
        .to_string();
    let (key, name) = match header {
        Some(h) => (
            h.key.unwrap_or_else(|| stem.clone()),
            h.name.unwrap_or_else(|| stem.clone()),
        ),
        None => (stem.clone(), stem),
    };

    let questions: Vec<Question> = bundled
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            Question::from_record(QuestionRecord {
                id: i as u32 + 1,
                question: q.question,
                options: q
                    .choices
                    .iter()
                    .map(|c| strip_choice_prefix(c).to_string())
                    .collect(),
                is_multiple_choice: q.is_multiple_choice,
                raw_correct_answer: q.correct_answer,
                explanation: q.explanation,
                source: Some(name.clone()),
            })
        })
        .collect();

    Ok(QuestionSet {
        key,
        name,
        questions,
    })
}

/// Render a set as a header document in `format`, readable by
/// [`parse_question_set_str`].
///
/// Choices get an `"A. "` prefix. The canonical answer is written as one
/// string when it has a single entry and as a list otherwise, so reading the
/// document back yields the same answer.
pub fn render_question_set(set: &QuestionSet, format: SetFormat) -> Result<String> {
    let questions = set
        .questions
        .iter()
        .map(|q| BundledQuestion {
            question: q.text.clone(),
            choices: q
                .options
                .iter()
                .enumerate()
                .map(|(i, option)| match label_of(i) {
                    Some(label) => format!("{label}. {option}"),
                    None => option.clone(),
                })
                .collect(),
            correct_answer: match q.answer.len() {
                0 => RawAnswer::Absent,
                1 => RawAnswer::Text(q.answer.iter().collect()),
                _ => RawAnswer::Labels(q.answer.iter().map(str::to_string).collect()),
            },
            is_multiple_choice: q.is_multiple_choice,
            explanation: q.explanation.clone(),
        })
        .collect();
    let doc = SetDocument {
        question_set: SetHeader {
            key: Some(set.key.clone()),
            name: Some(set.name.clone()),
        },
        questions,
    };

    match format {
        SetFormat::Json => {
            serde_json::to_string_pretty(&doc).context("failed to serialize question set as JSON")
        }
        SetFormat::Toml => {
            toml::to_string_pretty(&doc).context("failed to serialize question set as TOML")
        }
    }
}

/// Load all `.json`/`.toml` question sets in a directory tree, in file-name
/// order. Files that fail to parse are skipped with a warning.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut sets = Vec::new();
    for path in paths {
        if path.is_dir() {
            sets.extend(load_question_directory(&path)?);
        } else if SetFormat::from_path(&path).is_ok() {
            match parse_question_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or a whole directory.
pub fn load_question_sets(path: &Path) -> Result<Vec<QuestionSet>> {
    if path.is_dir() {
        load_question_directory(path)
    } else {
        Ok(vec![parse_question_set(path)?])
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Count of questions in one loaded set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSummary {
    pub key: String,
    pub name: String,
    pub count: usize,
}

/// Every loaded set, with question ids unique across the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    sets: Vec<QuestionSet>,
}

impl QuestionCatalog {
    /// Build a catalog, numbering questions from 1 in set order.
    pub fn new(mut sets: Vec<QuestionSet>) -> Self {
        let mut next_id = 1u32;
        for set in &mut sets {
            for q in &mut set.questions {
                q.id = next_id;
                next_id += 1;
            }
        }
        Self { sets }
    }

    pub fn sets(&self) -> &[QuestionSet] {
        &self.sets
    }

    pub fn summaries(&self) -> Vec<SetSummary> {
        self.sets
            .iter()
            .map(|s| SetSummary {
                key: s.key.clone(),
                name: s.name.clone(),
                count: s.questions.len(),
            })
            .collect()
    }

    pub fn total_questions(&self) -> usize {
        self.sets.iter().map(|s| s.questions.len()).sum()
    }

    /// Usable questions from the sets named in `keys`, in catalog order.
    /// No keys selects nothing.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Vec<Question> {
        let wanted: HashSet<&str> = keys.iter().map(|k| k.as_ref()).collect();
        self.sets
            .iter()
            .filter(|s| wanted.contains(s.key.as_str()))
            .flat_map(|s| s.questions.iter())
            .filter(|q| {
                let usable = q.is_usable();
                if !usable {
                    tracing::debug!(id = q.id, "skipping question with fewer than 2 options");
                }
                usable
            })
            .cloned()
            .collect()
    }

    /// Usable questions from every set.
    pub fn all(&self) -> Vec<Question> {
        let keys: Vec<&str> = self.sets.iter().map(|s| s.key.as_str()).collect();
        self.select(&keys)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A warning from question-set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Lower-case and collapse whitespace, for duplicate detection.
pub fn normalize_question_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Validate a question set for common data-quality issues.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen: HashMap<String, u32> = HashMap::new();
    for q in &set.questions {
        if let Some(first) = seen.insert(normalize_question_text(&q.text), q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate of question {first}"),
            });
        }
    }

    for q in &set.questions {
        let warn = |message: String| ValidationWarning {
            question_id: Some(q.id),
            message,
        };

        if q.text.trim().is_empty() {
            warnings.push(warn("question text is empty".into()));
        }
        if !q.is_usable() {
            warnings.push(warn(format!(
                "only {} option(s), at least 2 required",
                q.options.len()
            )));
        }
        if q.answer.is_unspecified() {
            warnings.push(warn("correct answer not specified".into()));
            continue;
        }

        let invalid = q.answer.invalid_labels(&q.options);
        if !invalid.is_empty() {
            warnings.push(warn(format!(
                "answer names unknown option(s): {}",
                invalid.join(", ")
            )));
        } else if !q.is_scoreable() {
            warnings.push(warn(format!(
                "no selection can match the correct answer ({})",
                q.answer
            )));
        }
        if q.is_multiple_choice && q.answer.len() < 2 {
            warnings.push(warn("multiple choice but only one correct answer".into()));
        }
    }

    warnings
}

/// A question text found in more than one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossSetDuplicate {
    /// Up to 100 characters of the question.
    pub preview: String,
    /// `(set key, question id)` for every occurrence, in catalog order.
    pub occurrences: Vec<(String, u32)>,
}

/// Find questions that appear in more than one set.
pub fn find_duplicates_across(sets: &[QuestionSet]) -> Vec<CrossSetDuplicate> {
    let mut by_text: BTreeMap<String, (String, Vec<(String, u32)>)> = BTreeMap::new();
    for set in sets {
        for q in &set.questions {
            let entry = by_text
                .entry(normalize_question_text(&q.text))
                .or_insert_with(|| (preview(&q.text), Vec::new()));
            entry.1.push((set.key.clone(), q.id));
        }
    }

    by_text
        .into_values()
        .filter(|(_, occurrences)| {
            let keys: HashSet<&str> = occurrences.iter().map(|(k, _)| k.as_str()).collect();
            keys.len() > 1
        })
        .map(|(preview, occurrences)| CrossSetDuplicate {
            preview,
            occurrences,
        })
        .collect()
}

fn preview(text: &str) -> String {
    if text.chars().count() > 100 {
        format!("{}...", text.chars().take(100).collect::<String>())
    } else {
        text.to_string()
    }
}

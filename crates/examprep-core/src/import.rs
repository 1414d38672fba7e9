//! User file import.
//!
//! Spreadsheets (`.xlsx`, `.xls`, `.xlsm`, `.ods`) are read with calamine. The
//! first row of the first sheet names the columns, [`detect_columns`] finds
//! the question, option, answer and explanation columns, and each remaining
//! row goes through [`import_rows`], which applies the cleaning rules every
//! import shares. Question-set files in the bundled formats are imported
//! directly. [`import_file`] picks the path by extension.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;

use crate::error::ImportError;
use crate::model::{label_of, Question, QuestionRecord, RawAnswer};
use crate::parser::{parse_question_set, SetFormat};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "ods"];

/// One spreadsheet row after column detection, before cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub question: Option<String>,
    /// Option cells in label order; blank cells are allowed.
    #[serde(default)]
    pub options: Vec<Option<String>>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Taken from the sheet when it has such a column.
    #[serde(default)]
    pub is_multiple_choice: Option<bool>,
}

/// Trimmed cell text, or `None` for blank, `nan` and `None` cells.
pub fn clean_cell(cell: Option<&str>) -> Option<String> {
    let value = cell?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") || value == "None" {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_option_letters(answer: &str) -> bool {
    !answer.is_empty() && answer.chars().all(|c| ('A'..='E').contains(&c))
}

/// Map a free-text answer onto an option label.
///
/// Answers that are a single character or made only of `A`–`E` are returned
/// unchanged. Otherwise the first option that contains the answer, or is
/// contained in it (case-insensitively), gives the label. Unmatched text is
/// returned unchanged.
pub fn resolve_answer(answer: &str, options: &[String]) -> String {
    if answer.chars().count() <= 1 || is_option_letters(answer) {
        return answer.to_string();
    }
    let needle = answer.to_lowercase();
    options
        .iter()
        .position(|o| {
            let option = o.to_lowercase();
            option.contains(&needle) || needle.contains(&option)
        })
        .and_then(label_of)
        .map(|l| l.to_string())
        .unwrap_or_else(|| answer.to_string())
}

/// Clean imported rows into question records.
///
/// Rows without question text or with fewer than two options are dropped.
/// When a row does not say whether it is multiple choice, an answer of two or
/// more option letters (`"BD"`) makes it one. Zero surviving rows is
/// [`ImportError::NoQuestions`].
pub fn import_rows(
    rows: Vec<ImportRow>,
    source: Option<&str>,
) -> Result<Vec<QuestionRecord>, ImportError> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(question) = clean_cell(row.question.as_deref()) else {
            dropped += 1;
            continue;
        };
        let options: Vec<String> = row
            .options
            .iter()
            .filter_map(|cell| clean_cell(cell.as_deref()))
            .collect();
        if options.len() < 2 {
            dropped += 1;
            continue;
        }

        let answer = clean_cell(row.answer.as_deref()).map(|a| resolve_answer(&a, &options));
        let is_multiple_choice = row.is_multiple_choice.unwrap_or_else(|| {
            answer
                .as_deref()
                .is_some_and(|a| a.len() > 1 && is_option_letters(a))
        });

        records.push(QuestionRecord {
            id: records.len() as u32 + 1,
            question,
            options,
            is_multiple_choice,
            raw_correct_answer: answer.map(RawAnswer::Text).unwrap_or_default(),
            explanation: clean_cell(row.explanation.as_deref()).unwrap_or_default(),
            source: source.map(str::to_string),
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = records.len(), "dropped incomplete rows");
    }
    if records.is_empty() {
        return Err(ImportError::NoQuestions);
    }
    Ok(records)
}

/// Where each field lives in a sheet's rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub question: Option<usize>,
    /// Option columns in label order.
    pub options: Vec<usize>,
    pub answer: Option<usize>,
    pub explanation: Option<usize>,
}

impl ColumnLayout {
    /// Pick this layout's cells out of one row.
    pub fn row(&self, cells: &[String]) -> ImportRow {
        let cell = |index: Option<usize>| index.and_then(|i| cells.get(i)).cloned();
        ImportRow {
            question: cell(self.question),
            options: self.options.iter().map(|&i| cells.get(i).cloned()).collect(),
            answer: cell(self.answer),
            explanation: cell(self.explanation),
            is_multiple_choice: None,
        }
    }
}

/// Letter of an `"Option B"` / `"option_b"` header.
fn option_header_letter(header: &str) -> Option<char> {
    let rest = header.split_once("option")?.1;
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '_' || c == '-');
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ 'a'..='e'), None) => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}

/// Number of a `"Choice 3"` / `"choice3"` header.
fn choice_header_number(header: &str) -> Option<u32> {
    header.split_once("choice")?.1.trim().parse().ok()
}

/// Find the columns of a sheet from its header row.
///
/// Headers are matched case-insensitively: the first containing `question`,
/// the first containing `answer`, `correct` or `key`, and the first
/// containing `explanation` or `note`. Options are `Option A`..`Option E`
/// columns (other `option` headers take the next free letter), bare `A`..`E`
/// columns, or, when there are none of those, `Choice1`.. columns in number
/// order. `None` when no question column or no options are found.
pub fn detect_columns(headers: &[String]) -> Option<ColumnLayout> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |keys: &[&str]| headers.iter().position(|h| keys.iter().any(|k| h.contains(k)));

    let question = find(&["question"]);
    let answer = find(&["answer", "correct", "key"]);
    let explanation = find(&["explanation", "note"]);

    let mut lettered: Vec<(char, usize)> = Vec::new();
    let mut numbered: Vec<(u32, usize)> = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        if Some(index) == question || Some(index) == answer || Some(index) == explanation {
            continue;
        }
        if header.contains("option") {
            let letter = option_header_letter(header)
                .unwrap_or_else(|| label_of(lettered.len()).map_or('?', |l| l.as_char()));
            lettered.push((letter, index));
        } else if header.contains("choice") {
            if let Some(number) = choice_header_number(header) {
                numbered.push((number, index));
            }
        } else if let [c @ b'a'..=b'e'] = header.as_bytes() {
            lettered.push((c.to_ascii_uppercase() as char, index));
        }
    }
    lettered.sort();
    numbered.sort();

    let options: Vec<usize> = if lettered.is_empty() {
        numbered.into_iter().map(|(_, index)| index).collect()
    } else {
        lettered.into_iter().map(|(_, index)| index).collect()
    };

    if question.is_none() || options.is_empty() {
        return None;
    }
    Some(ColumnLayout {
        question,
        options,
        answer,
        explanation,
    })
}

/// Turn a sheet's rows, header row first, into question records.
pub fn import_sheet(
    rows: Vec<Vec<String>>,
    source: Option<&str>,
) -> Result<Vec<QuestionRecord>, ImportError> {
    let mut rows = rows.into_iter();
    let headers = rows.next().ok_or(ImportError::NoQuestions)?;
    let layout = detect_columns(&headers).ok_or(ImportError::NoColumns)?;
    tracing::debug!(?layout, "detected spreadsheet columns");
    import_rows(rows.map(|cells| layout.row(&cells)).collect(), source)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Read the first sheet of a workbook as rows of cell text.
pub fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<String>>, ImportError> {
    let unreadable = |message: String| ImportError::Unreadable {
        path: path.display().to_string(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoQuestions)?
        .map_err(|e| unreadable(e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Import a user-supplied spreadsheet or question-set file.
///
/// Unusable questions are dropped. The extension is checked before anything
/// is read.
pub fn import_file(path: &Path) -> Result<Vec<Question>, ImportError> {
    let candidates: Vec<Question> = if SPREADSHEET_EXTENSIONS.contains(&extension(path).as_str()) {
        let source = path.file_stem().and_then(|s| s.to_str());
        import_sheet(read_spreadsheet(path)?, source)?
            .into_iter()
            .map(Question::from_record)
            .collect()
    } else {
        SetFormat::from_path(path)?;
        parse_question_set(path)
            .map_err(|e| ImportError::Unreadable {
                path: path.display().to_string(),
                message: format!("{e:#}"),
            })?
            .questions
    };

    let questions: Vec<Question> = candidates
        .into_iter()
        .filter(|q| !q.text.trim().is_empty() && q.is_usable())
        .collect();
    if questions.is_empty() {
        return Err(ImportError::NoQuestions);
    }
    tracing::info!(
        path = %path.display(),
        count = questions.len(),
        "imported questions"
    );
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalAnswer;

    fn row(question: &str, options: &[&str], answer: &str) -> ImportRow {
        ImportRow {
            question: Some(question.into()),
            options: options.iter().map(|o| Some(o.to_string())).collect(),
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    #[test]
    fn blank_cells() {
        assert_eq!(clean_cell(Some("  x ")), Some("x".into()));
        assert_eq!(clean_cell(Some("NaN")), None);
        assert_eq!(clean_cell(Some("None")), None);
        assert_eq!(clean_cell(Some("   ")), None);
        assert_eq!(clean_cell(None), None);
    }

    #[test]
    fn free_text_answer_matches_option() {
        let options = vec!["Delta Lake".to_string(), "Parquet".to_string()];
        assert_eq!(resolve_answer("parquet", &options), "B");
        assert_eq!(resolve_answer("It is Delta Lake", &options), "A");
        assert_eq!(resolve_answer("Avro", &options), "Avro");
        assert_eq!(resolve_answer("B", &options), "B");
        assert_eq!(resolve_answer("BD", &options), "BD");
    }

    #[test]
    fn rows_are_cleaned_and_filtered() {
        let rows = vec![
            row("First?", &["a", "b", "nan"], "A"),
            ImportRow {
                question: None,
                ..row("", &["a", "b"], "A")
            },
            row("Too few", &["a", "None"], "A"),
            row("Multi", &["a", "b", "c", "d"], "BD"),
            ImportRow {
                answer: Some("nan".into()),
                ..row("No answer", &["a", "b"], "")
            },
        ];
        let records = import_rows(rows, Some("Upload")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].options, vec!["a", "b"]);
        assert_eq!(records[0].source.as_deref(), Some("Upload"));
        assert_eq!(records[1].id, 2);
        assert!(records[1].is_multiple_choice);
        assert_eq!(records[2].raw_correct_answer, RawAnswer::Absent);

        let multi = Question::from_record(records[1].clone());
        assert_eq!(multi.answer, CanonicalAnswer::from_labels(["B", "D"]));
    }

    #[test]
    fn no_rows_survive() {
        let rows = vec![row("Only", &["a"], "A")];
        assert!(matches!(
            import_rows(rows, None),
            Err(ImportError::NoQuestions)
        ));
    }

    fn cells(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn columns_from_option_headers() {
        let layout = detect_columns(&cells(&[
            "Question Text",
            "Option B",
            "Option A",
            "Correct Answer",
            "Explanation",
            "Option C",
        ]))
        .unwrap();
        assert_eq!(layout.question, Some(0));
        assert_eq!(layout.options, vec![2, 1, 5]);
        assert_eq!(layout.answer, Some(3));
        assert_eq!(layout.explanation, Some(4));
    }

    #[test]
    fn columns_from_letters_and_choices() {
        let letters = detect_columns(&cells(&["Question", "A", "B", "C", "Key"])).unwrap();
        assert_eq!(letters.options, vec![1, 2, 3]);
        assert_eq!(letters.answer, Some(4));
        assert_eq!(letters.explanation, None);

        let choices =
            detect_columns(&cells(&["question", "Choice2", "Choice1", "Notes", "answer"])).unwrap();
        assert_eq!(choices.options, vec![2, 1]);
        assert_eq!(choices.explanation, Some(3));
        assert_eq!(choices.answer, Some(4));
    }

    #[test]
    fn columns_need_question_and_options() {
        assert!(detect_columns(&cells(&["Prompt", "Option A", "Option B"])).is_none());
        assert!(detect_columns(&cells(&["Question", "Answer"])).is_none());
    }

    #[test]
    fn sheet_rows_become_records() {
        let rows = vec![
            cells(&["Question", "Option A", "Option B", "Option C", "Answer", "Explanation"]),
            cells(&["Capital of France?", "Rome", "Paris", "Madrid", "paris", "Seine"]),
            cells(&["Pick two", "x", "y", "z", "AC", ""]),
            cells(&["", "x", "y", "", "A", ""]),
            cells(&["Short row", "only"]),
        ];
        let records = import_sheet(rows, Some("upload")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].options, vec!["Rome", "Paris", "Madrid"]);
        assert_eq!(records[0].raw_correct_answer, RawAnswer::Text("B".into()));
        assert_eq!(records[0].explanation, "Seine");
        assert!(records[1].is_multiple_choice);

        let multi = Question::from_record(records[1].clone());
        assert_eq!(multi.answer, CanonicalAnswer::from_labels(["A", "C"]));
    }

    #[test]
    fn sheet_without_usable_header() {
        assert!(matches!(
            import_sheet(vec![cells(&["a", "b"])], None),
            Err(ImportError::NoColumns)
        ));
        assert!(matches!(import_sheet(Vec::new(), None), Err(ImportError::NoQuestions)));
    }

    #[test]
    fn import_file_rejects_extension() {
        let err = import_file(Path::new("exam.docx")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedExtension(_)));
    }

    #[test]
    fn import_file_unreadable_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.xlsx");
        std::fs::write(&path, "not a workbook").unwrap();
        assert!(matches!(
            import_file(&path),
            Err(ImportError::Unreadable { .. })
        ));
    }

    #[test]
    fn import_file_reads_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.json");
        std::fs::write(
            &path,
            r#"[
                {"question": "Kept", "choices": ["A. x", "B. y"], "correct_answer": "B"},
                {"question": "Dropped", "choices": ["A. x"], "correct_answer": "A"}
            ]"#,
        )
        .unwrap();
        let questions = import_file(&path).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Kept");
    }

    #[test]
    fn import_file_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            import_file(&path),
            Err(ImportError::Unreadable { .. })
        ));
    }

    #[test]
    fn import_file_with_no_usable_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(import_file(&path), Err(ImportError::NoQuestions)));
    }
}

//! The `examprep grade` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use examprep_core::config::load_config_from;
use examprep_core::model::RawAnswer;
use examprep_core::normalize::normalize;
use examprep_core::parser::{load_question_sets, QuestionCatalog};
use examprep_core::report::ExamReport;
use examprep_core::session::ExamSession;

/// Question id to the answer given for it.
type AnswerSheet = BTreeMap<u32, RawAnswer>;

pub fn execute(
    questions: Option<PathBuf>,
    answers_path: PathBuf,
    sets: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json" | "markdown" | "md"),
        "unknown format '{format}': expected text, json or markdown"
    );

    let config = load_config_from(config_path.as_deref())?;
    let path = super::questions_path(questions, &config)?;
    let catalog = QuestionCatalog::new(load_question_sets(&path)?);

    let selected = match &sets {
        Some(keys) => {
            let keys: Vec<&str> = keys.split(',').map(str::trim).collect();
            for key in &keys {
                if !catalog.sets().iter().any(|s| s.key == *key) {
                    tracing::warn!("unknown question set '{key}'");
                }
            }
            catalog.select(&keys)
        }
        None => catalog.all(),
    };
    anyhow::ensure!(!selected.is_empty(), "no questions selected");

    let sheet = load_answer_sheet(&answers_path)?;

    let mut exam = ExamSession::new(selected, config.exam_duration())
        .with_low_time_warning(config.low_time_warning());
    exam.start();
    apply_sheet(&mut exam, &sheet)?;
    exam.finish();

    let report = ExamReport::from_session(&exam).context("exam did not finish")?;
    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    Ok(())
}

fn load_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
}

/// Record the sheet's answers as exam selections.
fn apply_sheet(exam: &mut ExamSession, sheet: &AnswerSheet) -> Result<()> {
    let positions: BTreeMap<u32, usize> = exam
        .questions()
        .iter()
        .enumerate()
        .map(|(position, q)| (q.id, position))
        .collect();

    for (id, raw) in sheet {
        let Some(&position) = positions.get(id) else {
            tracing::warn!(id, "answer sheet names a question that is not in the exam");
            continue;
        };
        let question = &exam.questions()[position];
        let given = normalize(raw, &question.options, question.is_multiple_choice);

        for label in given.invalid_labels(&question.options) {
            tracing::warn!(id, label, "ignoring answer that is not an option");
        }
        let mut chosen = given.option_indices(&question.options);
        if !question.is_multiple_choice && chosen.len() > 1 {
            tracing::warn!(id, "single-answer question given several answers, keeping the first");
            chosen.truncate(1);
        }

        for option in chosen {
            exam.select_option(position, option)?;
        }
    }
    Ok(())
}

fn print_text(report: &ExamReport) {
    let s = &report.summary;
    println!("Exam {}", report.id);
    println!("Score: {}/{} ({}%)", s.correct, s.total, s.percentage);
    println!(
        "Correct: {}  Incorrect: {}  Unanswered: {}",
        s.correct, s.incorrect, s.unanswered
    );
    println!();

    for q in &report.questions {
        let selected = if q.selected.is_empty() { "-" } else { q.selected.as_str() };
        let note = if q.scoreable { "" } else { "  [unscoreable]" };
        println!(
            "  Q{:<3} #{:<4} {:<10} selected: {:<8} answer: {}{note}",
            q.position + 1,
            q.id,
            q.outcome.to_string(),
            selected,
            q.correct_answer
        );
    }
}

//! The `examprep sets` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examprep_core::config::load_config_from;
use examprep_core::parser::{load_question_sets, QuestionCatalog};

pub fn execute(questions: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = super::questions_path(questions, &config)?;
    let catalog = QuestionCatalog::new(load_question_sets(&path)?);

    if catalog.sets().is_empty() {
        println!("No question sets found in {}.", path.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Key", "Name", "Questions"]);
    for summary in catalog.summaries() {
        table.add_row(vec![
            Cell::new(summary.key),
            Cell::new(summary.name),
            Cell::new(summary.count),
        ]);
    }

    println!("{table}");
    println!(
        "{} set(s), {} question(s)",
        catalog.sets().len(),
        catalog.total_questions()
    );
    Ok(())
}

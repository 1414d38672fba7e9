//! The `examprep import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examprep_core::import::import_file;
use examprep_core::model::QuestionSet;
use examprep_core::parser::{render_question_set, SetFormat};

pub fn execute(file: PathBuf, output: PathBuf, key: Option<String>) -> Result<()> {
    let format = SetFormat::from_path(&output)?;
    let questions = import_file(&file)?;

    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("imported")
        .to_string();
    let set = QuestionSet {
        key: key.unwrap_or_else(|| stem.clone()),
        name: stem,
        questions,
    };
    let unscoreable = set.questions.iter().filter(|q| !q.is_scoreable()).count();

    let content = render_question_set(&set, format)?;
    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Imported {} question(s) from {} into {}",
        set.questions.len(),
        file.display(),
        output.display()
    );
    if unscoreable > 0 {
        println!("{unscoreable} question(s) have no answer that matches an option; run `examprep validate` for details");
    }
    Ok(())
}

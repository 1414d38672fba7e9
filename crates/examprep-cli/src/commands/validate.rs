//! The `examprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examprep_core::parser::{
    find_duplicates_across, load_question_sets, validate_question_set, QuestionCatalog,
};

pub fn execute(questions_path: PathBuf) -> Result<()> {
    // Catalog ids are the ones answer sheets use.
    let catalog = QuestionCatalog::new(load_question_sets(&questions_path)?);
    let sets = catalog.sets();
    anyhow::ensure!(
        !sets.is_empty(),
        "no question sets found in {}",
        questions_path.display()
    );

    let mut total_warnings = 0;

    for set in sets {
        println!("Question set: {} ({} questions)", set.name, set.questions.len());

        let warnings = validate_question_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [Q{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    let duplicates = find_duplicates_across(sets);
    if !duplicates.is_empty() {
        println!("\nQuestions repeated across sets:");
        for d in &duplicates {
            let places: Vec<String> = d
                .occurrences
                .iter()
                .map(|(key, id)| format!("{key}#{id}"))
                .collect();
            println!("  \"{}\" in {}", d.preview, places.join(", "));
        }
        total_warnings += duplicates.len();
    }

    if total_warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

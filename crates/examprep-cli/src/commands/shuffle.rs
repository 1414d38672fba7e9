//! The `examprep shuffle` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use examprep_core::parser::{parse_question_set, render_question_set, SetFormat};
use examprep_core::shuffle::shuffle_question_set;

pub fn execute(questions: PathBuf, output: PathBuf, seed: Option<u64>) -> Result<()> {
    let format = SetFormat::from_path(&output)?;
    let mut set = parse_question_set(&questions)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    shuffle_question_set(&mut set, &mut rng);

    let content = render_question_set(&set, format)?;
    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Shuffled {} ({} questions) into {}",
        set.name,
        set.questions.len(),
        output.display()
    );
    Ok(())
}

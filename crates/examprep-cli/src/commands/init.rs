//! The `examprep init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_unless_exists(Path::new("examprep.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-sets").context("failed to create question-sets")?;
    write_unless_exists(Path::new("question-sets/sample.json"), SAMPLE_SET)?;

    println!("\nNext steps:");
    println!("  1. Add your question sets to question-sets/");
    println!("  2. Run: examprep validate --questions question-sets");
    println!("  3. Run: examprep grade --answers answers.json");

    Ok(())
}

fn write_unless_exists(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examprep configuration

# Exam length in seconds.
exam_duration_secs = 3600

# The clock turns to a warning below this many seconds.
low_time_warning_secs = 300

question_dirs = ["question-sets"]
"#;

const SAMPLE_SET: &str = r#"{
  "question_set": {
    "key": "sample",
    "name": "Sample Questions"
  },
  "questions": [
    {
      "question": "Which data structure serves items in first-in, first-out order?",
      "choices": ["A. Stack", "B. Queue", "C. Heap", "D. Tree"],
      "correct_answer": "B",
      "is_multiple_choice": false,
      "explanation": "A queue removes items in the order they were added."
    },
    {
      "question": "Which of these are prime numbers?",
      "choices": ["A. 2", "B. 4", "C. 5", "D. 9", "E. 11"],
      "correct_answer": "ACE",
      "is_multiple_choice": true,
      "explanation": "2, 5 and 11 have no divisors other than 1 and themselves."
    }
  ]
}
"#;

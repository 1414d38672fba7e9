pub mod grade;
pub mod import;
pub mod init;
pub mod sets;
pub mod shuffle;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use examprep_core::config::ExamprepConfig;

/// The `--questions` path, or the first configured question directory.
fn questions_path(explicit: Option<PathBuf>, config: &ExamprepConfig) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    config
        .existing_question_dir()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no question directory found; pass --questions or run `examprep init`"
            )
        })
}

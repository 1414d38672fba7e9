//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DURATION_ENV: &str = "EXAMPREP_EXAM_DURATION_SECS";

/// Top-level examprep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamprepConfig {
    /// Exam length in seconds.
    #[serde(default = "default_exam_duration")]
    pub exam_duration_secs: u64,
    /// Remaining time below which the exam is low on time.
    #[serde(default = "default_low_time_warning")]
    pub low_time_warning_secs: u64,
    /// Directories searched for question sets.
    #[serde(default = "default_question_dirs")]
    pub question_dirs: Vec<PathBuf>,
}

fn default_exam_duration() -> u64 {
    3600
}
fn default_low_time_warning() -> u64 {
    300
}
fn default_question_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("question-sets")]
}

impl Default for ExamprepConfig {
    fn default() -> Self {
        Self {
            exam_duration_secs: default_exam_duration(),
            low_time_warning_secs: default_low_time_warning(),
            question_dirs: default_question_dirs(),
        }
    }
}

impl ExamprepConfig {
    pub fn exam_duration(&self) -> Duration {
        Duration::from_secs(self.exam_duration_secs)
    }

    pub fn low_time_warning(&self) -> Duration {
        Duration::from_secs(self.low_time_warning_secs)
    }

    /// The first configured question directory that exists.
    pub fn existing_question_dir(&self) -> Option<&Path> {
        self.question_dirs
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_dir())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examprep.toml` in the current directory
/// 2. `~/.config/examprep/config.toml`
///
/// `EXAMPREP_EXAM_DURATION_SECS` overrides the exam duration.
pub fn load_config() -> Result<ExamprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamprepConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examprep.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&path)?
        }
        None => ExamprepConfig::default(),
    };

    apply_env_overrides(config, |name| std::env::var(name).ok())
}

fn parse_config(path: &Path) -> Result<ExamprepConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(
    mut config: ExamprepConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ExamprepConfig> {
    if let Some(value) = lookup(DURATION_ENV) {
        config.exam_duration_secs = value
            .trim()
            .parse()
            .with_context(|| format!("invalid {DURATION_ENV}: {value:?}"))?;
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examprep"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ExamprepConfig::default();
        assert_eq!(config.exam_duration(), Duration::from_secs(3600));
        assert_eq!(config.low_time_warning(), Duration::from_secs(300));
        assert_eq!(config.question_dirs, vec![PathBuf::from("question-sets")]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ExamprepConfig = toml::from_str("exam_duration_secs = 5400").unwrap();
        assert_eq!(config.exam_duration_secs, 5400);
        assert_eq!(config.low_time_warning_secs, 300);
    }

    #[test]
    fn explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examprep.toml");
        std::fs::write(
            &path,
            "low_time_warning_secs = 60\nquestion_dirs = [\"sets\", \"more\"]\n",
        )
        .unwrap();
        let config = parse_config(&path).unwrap();
        assert_eq!(config.low_time_warning_secs, 60);
        assert_eq!(config.question_dirs.len(), 2);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/examprep.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "exam_duration_secs = \"soon\"").unwrap();
        let err = parse_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn env_override() {
        let config = apply_env_overrides(ExamprepConfig::default(), |name| {
            (name == DURATION_ENV).then(|| "120".to_string())
        })
        .unwrap();
        assert_eq!(config.exam_duration_secs, 120);

        let untouched = apply_env_overrides(ExamprepConfig::default(), |_| None).unwrap();
        assert_eq!(untouched, ExamprepConfig::default());

        assert!(apply_env_overrides(ExamprepConfig::default(), |_| Some("x".into())).is_err());
    }
}

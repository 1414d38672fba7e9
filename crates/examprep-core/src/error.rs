//! Error types.
//!
//! Malformed question data never produces an error: it degrades to an empty
//! answer, an `Incorrect` outcome, or a validation warning. These types cover
//! the remaining cases, which are structurally invalid calls and import
//! failures the user has to be told about.

use thiserror::Error;

/// Errors returned by session operations called with out-of-range arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The question position is past the end of the sequence.
    #[error("question position {position} is out of range (0..{len})")]
    PositionOutOfRange { position: usize, len: usize },

    /// The option index is past the end of the question's option list.
    #[error("option {option} is out of range for question {position} ({len} options)")]
    OptionOutOfRange {
        position: usize,
        option: usize,
        len: usize,
    },
}

/// Errors that can occur when importing a question file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file extension is not one we can read.
    #[error("unsupported file type '{0}'")]
    UnsupportedExtension(String),

    /// The sheet's header row names no question or option columns.
    #[error("could not find question and option columns in the header row")]
    NoColumns,

    /// The file parsed but yielded no usable questions.
    #[error("no questions found in the file, please check the file format")]
    NoQuestions,

    /// The file could not be read or parsed.
    #[error("error reading {path}: {message}")]
    Unreadable { path: String, message: String },
}

impl ImportError {
    /// Returns `true` if the user can fix this by choosing another file.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedExtension(_) | ImportError::NoQuestions | ImportError::NoColumns
        )
    }
}

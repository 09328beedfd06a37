//! Error taxonomy shared by the generation pipeline and its callers.

use thiserror::Error;

use crate::completion::CompletionError;

/// A single unit that failed during course generation.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    /// Zero-based position of the unit in the parsed outline.
    pub index: usize,
    pub unit_name: String,
    pub cause: String,
}

impl std::fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} '{}': {}", self.index + 1, self.unit_name, self.cause)
    }
}

/// Errors surfaced by the course-generation core.
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Invalid course request: {0}")]
    InvalidRequest(String),

    #[error("Completion failed: {0}")]
    Upstream(#[from] CompletionError),

    #[error("{} unit(s) failed to generate: {}", .0.len(), join_failures(.0))]
    UnitGeneration(Vec<UnitFailure>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid range [{start}, {end}) for content of length {len}")]
    Range { start: usize, end: usize, len: usize },

    #[error("Selected text no longer matches the unit content")]
    StaleSelection,

    #[error("Persistence failed: {0}")]
    Persistence(anyhow::Error),
}

impl CourseError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

fn join_failures(failures: &[UnitFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type CourseResult<T> = Result<T, CourseError>;

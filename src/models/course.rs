use serde::{Deserialize, Serialize};

use crate::error::CourseError;

/// What the caller wants a course about. Input only, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseRequest {
    pub title: String,
    /// Free-text level such as "Beginner" or "Advanced".
    pub difficulty: String,
    pub duration_months: u32,
}

impl CourseRequest {
    pub fn new(title: impl Into<String>, difficulty: impl Into<String>, duration_months: u32) -> Self {
        Self {
            title: title.into(),
            difficulty: difficulty.into(),
            duration_months,
        }
    }

    /// Reject requests that cannot produce a meaningful prompt.
    pub fn validate(&self) -> Result<(), CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::InvalidRequest("title must not be blank".into()));
        }
        if self.difficulty.trim().is_empty() {
            return Err(CourseError::InvalidRequest(
                "difficulty must not be blank".into(),
            ));
        }
        if self.duration_months == 0 {
            return Err(CourseError::InvalidRequest(
                "duration_months must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

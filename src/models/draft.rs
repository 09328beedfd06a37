use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CourseModule, Outline, Unit};

/// A fully generated course that has not been persisted yet.
///
/// Entries are immutable snapshots: they are either committed as-is or
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEntry {
    pub course_id: Uuid,
    pub outline: Outline,
    pub module: CourseModule,
    pub units: Vec<Unit>,
    pub created_at: DateTime<Utc>,
}

/// Result of committing a draft.
///
/// Units carry their persisted activities and synthesized assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedCourse {
    pub course_id: Uuid,
    pub outline: Outline,
    pub module: CourseModule,
    pub units: Vec<Unit>,
}

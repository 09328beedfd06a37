use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unit::Unit;

/// The container for one generated course.
///
/// A module maps to exactly one generated outline and owns its units:
/// deleting a module cascades to units, activities and assessments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseModule {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Duration as given at generation time, e.g. `"2"` or `"2 months"`.
    pub duration: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseModule {
    /// Whole months parsed from the leading digits of `duration`, or 0 when
    /// the string does not start with a number.
    pub fn duration_months(&self) -> i64 {
        let digits: String = self
            .duration
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }
}

/// A module with its ordered units, used for detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTree {
    #[serde(flatten)]
    pub module: CourseModule,
    pub units: Vec<Unit>,
}

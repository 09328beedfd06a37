use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chapter-sized segment of a module.
///
/// `content` is always sanitized text; raw model output is never stored.
/// `module_id` is a lookup link back to the owning module, not an owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: Uuid,
    pub module_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// 1-based position within the module. Presentation order.
    pub sequence_number: u32,
    pub content: String,
    pub duration_months: Option<i64>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The generated activity block for a unit.
///
/// The model is asked for three activities but they are kept as one
/// aggregated text in `instructions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub instructions: String,
    pub duration_minutes: Option<i64>,
}

/// An assessment placeholder synthesized for each unit at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub duration_months: i64,
}

/// Input for an administrative unit update. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUnitInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replacement content. Sanitized before it is stored.
    pub content: Option<String>,
    pub duration_months: Option<i64>,
}

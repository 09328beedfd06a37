use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root record of one generation pass.
///
/// References the module it produced and its units in presentation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outline {
    pub id: Uuid,
    pub name: String,
    pub module_id: Uuid,
    pub unit_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

//! Request and response types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{CommittedCourse, DraftEntry, Unit};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateCourseRequest {
    #[schemars(description = "Course title, e.g. 'Intro to Statistics'")]
    pub title: String,
    #[schemars(description = "Free-text difficulty level, e.g. 'Beginner' or 'Advanced'")]
    pub difficulty: String,
    #[schemars(description = "Course length in months (must be greater than zero)")]
    pub duration_months: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DraftRequest {
    #[schemars(description = "The course id returned by generate_course")]
    pub course_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListModulesRequest {
    #[schemars(description = "Optional case-insensitive substring to filter module names")]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetModuleRequest {
    #[schemars(description = "The UUID of a committed module")]
    pub module_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProposeRegenerationRequest {
    #[schemars(description = "The UUID of the module that owns the unit")]
    pub module_id: String,
    #[schemars(description = "The UUID of the unit to rewrite")]
    pub unit_id: String,
    #[schemars(
        description = "Exact text highlighted in the unit content. Provide together with start_index and end_index"
    )]
    pub highlighted_text: Option<String>,
    #[schemars(description = "Byte offset where the highlighted text starts")]
    pub start_index: Option<usize>,
    #[schemars(description = "Byte offset just past the end of the highlighted text")]
    pub end_index: Option<usize>,
    #[schemars(
        description = "Why the unit should be regenerated. Used when no highlighted_text is given"
    )]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmRegenerationRequest {
    #[schemars(description = "The UUID of the unit to update")]
    pub unit_id: String,
    #[schemars(description = "Replacement text, usually the proposed_text from propose_regeneration")]
    pub proposed_text: String,
    #[schemars(description = "Byte offset where the replaced span starts")]
    pub start_index: usize,
    #[schemars(description = "Byte offset just past the end of the replaced span")]
    pub end_index: usize,
    #[schemars(
        description = "Text currently expected at [start_index, end_index). The splice is refused if it no longer matches"
    )]
    pub expected_text: Option<String>,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: String,
    pub sequence_number: u32,
    pub name: String,
    pub content_length: usize,
    pub activities: usize,
    pub assessments: usize,
}

impl From<&Unit> for UnitSummary {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id.to_string(),
            sequence_number: unit.sequence_number,
            name: unit.name.clone(),
            content_length: unit.content.len(),
            activities: unit.activities.len(),
            assessments: unit.assessments.len(),
        }
    }
}

/// Compact view of a staged or committed course.
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseSummary {
    pub course_id: String,
    pub outline_id: String,
    pub outline_title: String,
    pub module_id: String,
    pub module_name: String,
    pub units: Vec<UnitSummary>,
}

impl From<&DraftEntry> for CourseSummary {
    fn from(entry: &DraftEntry) -> Self {
        Self {
            course_id: entry.course_id.to_string(),
            outline_id: entry.outline.id.to_string(),
            outline_title: entry.outline.name.clone(),
            module_id: entry.module.id.to_string(),
            module_name: entry.module.name.clone(),
            units: entry.units.iter().map(UnitSummary::from).collect(),
        }
    }
}

impl From<&CommittedCourse> for CourseSummary {
    fn from(course: &CommittedCourse) -> Self {
        Self {
            course_id: course.course_id.to_string(),
            outline_id: course.outline.id.to_string(),
            outline_title: course.outline.name.clone(),
            module_id: course.module.id.to_string(),
            module_name: course.module.name.clone(),
            units: course.units.iter().map(UnitSummary::from).collect(),
        }
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What part of a unit should be rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegenerationSelector {
    /// A span the user highlighted, with its byte offsets in the unit content.
    Highlight {
        text: String,
        start: usize,
        end: usize,
    },
    /// A free-text explanation of what should change in the unit.
    Reason { reason: String },
}

/// Input for regenerating a highlighted span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightRegenerationInput {
    pub module_id: Uuid,
    pub unit_id: Uuid,
    pub highlighted_text: String,
    pub start_index: usize,
    pub end_index: usize,
}

/// Input for regenerating a unit because of a stated reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonRegenerationInput {
    pub module_id: Uuid,
    pub unit_id: Uuid,
    pub reason: String,
}

/// A rewrite proposal. Nothing is stored until it is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegenerationProposal {
    pub module_id: Uuid,
    pub unit_id: Uuid,
    pub proposed_text: String,
    /// Span the proposal is meant to replace. `None` for reason-based
    /// proposals, which do not target a specific span.
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
}

/// Input for splicing a confirmed proposal into a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRegenerationInput {
    pub unit_id: Uuid,
    pub proposed_text: String,
    pub start_index: usize,
    pub end_index: usize,
    /// When set, the current `[start_index, end_index)` slice must still equal
    /// this text or the splice is refused.
    #[serde(default)]
    pub expected_text: Option<String>,
}

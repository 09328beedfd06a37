//! Post-commit rewriting of unit content.
//!
//! A proposal is generated from either a highlighted span or a free-text
//! reason and returned without touching storage. Confirming a proposal splices
//! it into the stored content at the given byte range.

use std::sync::Arc;

use uuid::Uuid;

use crate::completion::{AcceptancePolicy, CompletionClient};
use crate::db::Database;
use crate::error::{CourseError, CourseResult};
use crate::generation::{highlight_prompt, reason_prompt};
use crate::models::{RegenerationProposal, RegenerationSelector, Unit};
use crate::sanitize::sanitize;

pub struct RegenerationService {
    client: Arc<dyn CompletionClient>,
    db: Database,
    policy: AcceptancePolicy,
}

impl RegenerationService {
    pub fn new(client: Arc<dyn CompletionClient>, db: Database) -> Self {
        Self {
            client,
            db,
            policy: AcceptancePolicy::accept_any(),
        }
    }

    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ask for a rewrite of part or all of a unit. Storage is not modified.
    pub async fn propose(
        &self,
        module_id: Uuid,
        unit_id: Uuid,
        selector: RegenerationSelector,
    ) -> CourseResult<RegenerationProposal> {
        let module = self
            .db
            .get_module(module_id)
            .map_err(CourseError::Persistence)?
            .ok_or_else(|| CourseError::not_found(format!("Module {}", module_id)))?;
        let unit = self
            .db
            .get_unit(unit_id)
            .map_err(CourseError::Persistence)?
            .ok_or_else(|| CourseError::not_found(format!("Unit {}", unit_id)))?;

        let (prompt, span) = match &selector {
            RegenerationSelector::Highlight { text, start, end } => (
                highlight_prompt(text, &unit.name, &module.name),
                Some((*start, *end)),
            ),
            RegenerationSelector::Reason { reason } => (
                reason_prompt(reason, &unit.name, &module.name, &unit.content),
                None,
            ),
        };

        tracing::info!(%module_id, %unit_id, highlight = span.is_some(), "Proposing regeneration");

        let raw = self.policy.complete(self.client.as_ref(), &prompt).await?;

        Ok(RegenerationProposal {
            module_id,
            unit_id,
            proposed_text: sanitize(&raw),
            start_index: span.map(|(start, _)| start),
            end_index: span.map(|(_, end)| end),
        })
    }

    /// Replace `[start, end)` of the unit's current content with `proposed_text`.
    ///
    /// When `expected` is given, the current slice must still equal it. The
    /// read, splice and write happen under one database lock, and the stored
    /// result is sanitized as a whole.
    pub fn confirm(
        &self,
        unit_id: Uuid,
        proposed_text: &str,
        start: usize,
        end: usize,
        expected: Option<&str>,
    ) -> CourseResult<Unit> {
        let updated = self
            .db
            .update_unit_content_with(unit_id, |current| {
                let spliced = splice(current, proposed_text, start, end, expected)?;
                Ok(sanitize(&spliced))
            })
            .map_err(|e| match e.downcast::<CourseError>() {
                Ok(err) => err,
                Err(e) => CourseError::Persistence(e),
            })?
            .ok_or_else(|| CourseError::not_found(format!("Unit {}", unit_id)))?;

        tracing::info!(%unit_id, start, end, "Regeneration spliced into unit");
        Ok(updated)
    }
}

/// Splice `replacement` into `content` at byte range `[start, end)`.
pub fn splice(
    content: &str,
    replacement: &str,
    start: usize,
    end: usize,
    expected: Option<&str>,
) -> CourseResult<String> {
    let len = content.len();
    if start > end
        || end > len
        || !content.is_char_boundary(start)
        || !content.is_char_boundary(end)
    {
        return Err(CourseError::Range { start, end, len });
    }

    if let Some(expected) = expected {
        if &content[start..end] != expected {
            return Err(CourseError::StaleSelection);
        }
    }

    let mut spliced = String::with_capacity(len - (end - start) + replacement.len());
    spliced.push_str(&content[..start]);
    spliced.push_str(replacement);
    spliced.push_str(&content[end..]);
    Ok(spliced)
}

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::prompts;
use crate::completion::{AcceptancePolicy, CompletionClient, CompletionError};
use crate::models::{Activity, CourseModule, CourseRequest, Unit};
use crate::outline::UnitDescriptor;
use crate::sanitize::sanitize;

/// Name of the aggregated activity record attached to each unit.
pub const ACTIVITY_NAME: &str = "Unit Activities";

/// Produces the content and activity block for one outline unit.
///
/// Two sequential completions per unit: content first, then activities.
#[derive(Clone)]
pub struct UnitGenerator {
    client: Arc<dyn CompletionClient>,
    content_policy: AcceptancePolicy,
    activity_policy: AcceptancePolicy,
}

impl UnitGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        content_policy: AcceptancePolicy,
        activity_policy: AcceptancePolicy,
    ) -> Self {
        Self {
            client,
            content_policy,
            activity_policy,
        }
    }

    /// Generate an unpersisted unit at `sequence_number` within `module`.
    pub async fn generate_unit(
        &self,
        module: &CourseModule,
        descriptor: &UnitDescriptor,
        sequence_number: u32,
        request: &CourseRequest,
    ) -> Result<Unit, CompletionError> {
        tracing::debug!(unit = %descriptor.name, sequence_number, "Generating unit content");

        let prompt = prompts::unit_content_prompt(&descriptor.name, &descriptor.description, request);
        let content = self
            .content_policy
            .complete(self.client.as_ref(), &prompt)
            .await?;

        let prompt = prompts::activities_prompt(&descriptor.name, request);
        let activities = self
            .activity_policy
            .complete(self.client.as_ref(), &prompt)
            .await?;

        let now = Utc::now();
        let unit_id = Uuid::new_v4();
        let description = Some(descriptor.description.clone()).filter(|d| !d.is_empty());

        Ok(Unit {
            id: unit_id,
            module_id: module.id,
            name: descriptor.name.clone(),
            description,
            sequence_number,
            content: sanitize(&content),
            duration_months: None,
            activities: vec![Activity {
                id: Uuid::new_v4(),
                unit_id,
                name: ACTIVITY_NAME.to_string(),
                instructions: sanitize(&activities),
                duration_minutes: None,
            }],
            assessments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

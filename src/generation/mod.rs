//! Course generation: outline retrieval, concurrent unit fan-out, staging.
//!
//! # Failure policy
//!
//! Generation is strict. Every unit task runs to completion, and if any of
//! them failed the whole course fails with [`CourseError::UnitGeneration`]
//! listing each failed unit. Nothing is staged in that case, so a draft in
//! the cache is always a complete course.

mod prompts;
mod unit;

pub use prompts::{highlight_prompt, reason_prompt};
pub use unit::{UnitGenerator, ACTIVITY_NAME};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::completion::{AcceptancePolicy, CompletionClient};
use crate::drafts::DraftCache;
use crate::error::{CourseError, CourseResult, UnitFailure};
use crate::models::{CourseModule, CourseRequest, DraftEntry, Outline, Unit};
use crate::outline::parse_outline;

/// Default bound on concurrently generated units per course.
pub const DEFAULT_MAX_CONCURRENT_UNITS: usize = 3;

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub max_concurrent_units: usize,
    pub outline_policy: AcceptancePolicy,
    pub content_policy: AcceptancePolicy,
    pub activity_policy: AcceptancePolicy,
}

impl GenerationConfig {
    /// Reads `COURSEGEN_MAX_CONCURRENT_UNITS`; policies use their defaults.
    pub fn from_env() -> Self {
        let max_concurrent_units = std::env::var("COURSEGEN_MAX_CONCURRENT_UNITS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENT_UNITS);

        Self {
            max_concurrent_units,
            ..Self::default()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_units: DEFAULT_MAX_CONCURRENT_UNITS,
            outline_policy: AcceptancePolicy::non_empty(3),
            content_policy: AcceptancePolicy::non_empty(3),
            activity_policy: AcceptancePolicy::non_empty(3),
        }
    }
}

/// Builds a whole course from a [`CourseRequest`] and stages it as a draft.
pub struct CourseGenerator {
    client: Arc<dyn CompletionClient>,
    units: UnitGenerator,
    drafts: DraftCache,
    config: GenerationConfig,
}

impl CourseGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, drafts: DraftCache, config: GenerationConfig) -> Self {
        let units = UnitGenerator::new(
            Arc::clone(&client),
            config.content_policy.clone(),
            config.activity_policy.clone(),
        );
        Self {
            client,
            units,
            drafts,
            config,
        }
    }

    pub fn drafts(&self) -> &DraftCache {
        &self.drafts
    }

    /// Generate a course and stage it under a fresh course id.
    ///
    /// Returns the staged entry. On any error nothing is staged.
    pub async fn generate_course(&self, request: &CourseRequest) -> CourseResult<DraftEntry> {
        request.validate()?;

        tracing::info!(
            title = %request.title,
            difficulty = %request.difficulty,
            months = request.duration_months,
            "Generating course"
        );

        let raw_outline = self
            .config
            .outline_policy
            .complete(self.client.as_ref(), &prompts::outline_prompt(request))
            .await?;

        let parsed = parse_outline(&raw_outline);
        if parsed.is_empty() {
            tracing::warn!(title = %request.title, "Outline produced no units");
        }

        let now = Utc::now();
        let module = CourseModule {
            id: Uuid::new_v4(),
            name: format!("Module: {}", request.title),
            description: None,
            duration: request.duration_months.to_string(),
            created_at: now,
            updated_at: now,
        };

        let units = self.generate_units(&module, &parsed.units, request).await?;

        let outline = Outline {
            id: Uuid::new_v4(),
            name: parsed.title,
            module_id: module.id,
            unit_ids: units.iter().map(|u| u.id).collect(),
            created_at: now,
        };

        let entry = DraftEntry {
            course_id: Uuid::new_v4(),
            outline,
            module,
            units,
            created_at: now,
        };
        self.drafts.put(entry.course_id, entry.clone());

        tracing::info!(
            course_id = %entry.course_id,
            units = entry.units.len(),
            "Course staged"
        );

        Ok(entry)
    }

    /// Fan out one task per descriptor, bounded by the semaphore, and
    /// reassemble the results in outline order.
    async fn generate_units(
        &self,
        module: &CourseModule,
        descriptors: &[crate::outline::UnitDescriptor],
        request: &CourseRequest,
    ) -> CourseResult<Vec<Unit>> {
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_units.max(1)));

        let futures: Vec<_> = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                let permit = Arc::clone(&semaphore);
                async move {
                    let result = match permit.acquire().await {
                        Ok(_permit) => {
                            self.units
                                .generate_unit(module, descriptor, index as u32 + 1, request)
                                .await
                                .map_err(|e| e.to_string())
                        }
                        Err(_) => Err("semaphore closed".to_string()),
                    };
                    (index, result)
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut slots: Vec<Option<Unit>> = vec![None; descriptors.len()];
        let mut failures = Vec::new();
        for (index, result) in results {
            match result {
                Ok(unit) => slots[index] = Some(unit),
                Err(cause) => {
                    tracing::error!(index, unit = %descriptors[index].name, "Unit generation failed: {}", cause);
                    failures.push(UnitFailure {
                        index,
                        unit_name: descriptors[index].name.clone(),
                        cause,
                    });
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.index);
            return Err(CourseError::UnitGeneration(failures));
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

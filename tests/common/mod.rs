//! Stub completion client shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coursegen::completion::{CompletionClient, CompletionError};
use coursegen::db::Database;
use coursegen::generation::GenerationConfig;
use coursegen::state::AppState;
use rand::Rng;

pub const STATISTICS_OUTLINE: &str = "Here's a detailed outline for your course:\n\
### Month 1: Descriptive Statistics\n\
- **Week 1:** Data types and collection\n\
- **Week 2:** Mean, median and mode\n\
---\n\
### Month 2: Probability\n\
- **Week 3:** Basic probability rules\n\
- **Week 4:** Distributions";

/// Answers each prompt kind with canned text.
pub struct StubClient {
    outline: String,
    fail_unit: Option<String>,
    max_delay_ms: u64,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubClient {
    pub fn new(outline: &str) -> Self {
        Self {
            outline: outline.to_string(),
            fail_unit: None,
            max_delay_ms: 0,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn statistics() -> Self {
        Self::new(STATISTICS_OUTLINE)
    }

    /// Sleep a random 0..=max_ms before every response.
    pub fn with_random_delay(mut self, max_ms: u64) -> Self {
        self.max_delay_ms = max_ms;
        self
    }

    /// Fail content generation for the unit whose name contains `name`.
    pub fn failing_unit(mut self, name: &str) -> Self {
        self.fail_unit = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.contains("course outline") {
            return Ok(self.outline.clone());
        }
        let unit = quoted(prompt).unwrap_or_default();
        if prompt.contains("learning content") {
            if let Some(fail) = &self.fail_unit {
                if unit.contains(fail.as_str()) {
                    return Err(CompletionError::Status {
                        status: 500,
                        body: "upstream exploded".to_string(),
                    });
                }
            }
            return Ok(format!(
                "## Introduction\nThis unit covers {unit}.\n---\n1.First example\n- key point"
            ));
        }
        if prompt.contains("learning activities") {
            return Ok(format!("### Activity 1\n* Explore {unit}\n### Activity 2\n### Activity 3"));
        }
        if prompt.contains("Rewrite and expand") {
            return Ok("## A clearer passage".to_string());
        }
        if prompt.contains("Regenerate the content") {
            return Ok("- Fresh unit content".to_string());
        }
        Ok(String::new())
    }
}

/// First double-quoted fragment of `prompt`.
fn quoted(prompt: &str) -> Option<String> {
    let start = prompt.find('"')? + 1;
    let len = prompt[start..].find('"')?;
    Some(prompt[start..start + len].to_string())
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.max_delay_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = self.respond(prompt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn memory_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

pub fn app_state(client: Arc<StubClient>) -> AppState {
    AppState::new(memory_db(), client, GenerationConfig::default())
}

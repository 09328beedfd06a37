use std::sync::Arc;

use uuid::Uuid;

use crate::completion::CompletionClient;
use crate::db::Database;
use crate::drafts::DraftCache;
use crate::error::CourseResult;
use crate::generation::{CourseGenerator, GenerationConfig};
use crate::models::CommittedCourse;
use crate::regenerate::RegenerationService;

/// Services shared by the HTTP and MCP surfaces.
///
/// Built once at startup and cloned into each handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub drafts: DraftCache,
    pub generator: Arc<CourseGenerator>,
    pub regeneration: Arc<RegenerationService>,
}

impl AppState {
    pub fn new(db: Database, client: Arc<dyn CompletionClient>, config: GenerationConfig) -> Self {
        let drafts = DraftCache::new();
        let generator = CourseGenerator::new(Arc::clone(&client), drafts.clone(), config);
        let regeneration = RegenerationService::new(client, db.clone());
        Self {
            db,
            drafts,
            generator: Arc::new(generator),
            regeneration: Arc::new(regeneration),
        }
    }

    /// Persist a staged course and evict it from the draft cache.
    pub fn commit_draft(&self, course_id: Uuid) -> CourseResult<CommittedCourse> {
        self.drafts
            .commit_and_remove(course_id, |entry| self.db.commit_course(entry))
    }

    pub fn discard_draft(&self, course_id: Uuid) -> CourseResult<()> {
        self.drafts.discard_and_remove(course_id)
    }
}

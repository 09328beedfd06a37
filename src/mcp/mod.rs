//! MCP server exposing course generation to agents over stdio.

mod types;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CourseError;
use crate::models::*;
use crate::state::AppState;

#[derive(Clone)]
pub struct McpServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

fn course_error(e: CourseError) -> McpError {
    match e {
        CourseError::InvalidRequest(_)
        | CourseError::NotFound(_)
        | CourseError::Range { .. }
        | CourseError::StaleSelection => McpError::invalid_params(e.to_string(), None),
        _ => McpError::internal_error(e.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    // ============================================================
    // Tool logic, shared by the tool router and tests
    // ============================================================

    pub async fn generate(&self, req: GenerateCourseRequest) -> Result<CourseSummary, McpError> {
        let request = CourseRequest::new(req.title, req.difficulty, req.duration_months);
        let entry = self
            .state
            .generator
            .generate_course(&request)
            .await
            .map_err(course_error)?;
        Ok(CourseSummary::from(&entry))
    }

    pub fn draft(&self, course_id: &str) -> Result<DraftEntry, McpError> {
        let course_id = Self::parse_uuid(course_id)?;
        self.state
            .drafts
            .get(course_id)
            .ok_or_else(|| McpError::invalid_params("Draft not found", None))
    }

    pub fn commit(&self, course_id: &str) -> Result<CourseSummary, McpError> {
        let course_id = Self::parse_uuid(course_id)?;
        let committed = self.state.commit_draft(course_id).map_err(course_error)?;
        Ok(CourseSummary::from(&committed))
    }

    pub fn discard(&self, course_id: &str) -> Result<(), McpError> {
        let course_id = Self::parse_uuid(course_id)?;
        self.state.discard_draft(course_id).map_err(course_error)
    }

    pub fn modules(&self, query: Option<&str>) -> Result<Vec<CourseModule>, McpError> {
        let modules = match query.map(str::trim) {
            Some(q) if !q.is_empty() => self.state.db.search_modules(q),
            _ => self.state.db.get_all_modules(),
        };
        modules.map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    pub fn module(&self, module_id: &str) -> Result<ModuleTree, McpError> {
        let module_id = Self::parse_uuid(module_id)?;
        self.state
            .db
            .get_module_tree(module_id)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?
            .ok_or_else(|| McpError::invalid_params("Module not found", None))
    }

    pub async fn propose(
        &self,
        req: ProposeRegenerationRequest,
    ) -> Result<RegenerationProposal, McpError> {
        let module_id = Self::parse_uuid(&req.module_id)?;
        let unit_id = Self::parse_uuid(&req.unit_id)?;

        let selector = match (req.highlighted_text, req.reason) {
            (Some(text), _) => {
                let (Some(start), Some(end)) = (req.start_index, req.end_index) else {
                    return Err(McpError::invalid_params(
                        "highlighted_text requires start_index and end_index",
                        None,
                    ));
                };
                RegenerationSelector::Highlight { text, start, end }
            }
            (None, Some(reason)) => RegenerationSelector::Reason { reason },
            (None, None) => {
                return Err(McpError::invalid_params(
                    "Provide either highlighted_text or reason",
                    None,
                ))
            }
        };

        self.state
            .regeneration
            .propose(module_id, unit_id, selector)
            .await
            .map_err(course_error)
    }

    pub fn confirm(&self, req: ConfirmRegenerationRequest) -> Result<Unit, McpError> {
        let unit_id = Self::parse_uuid(&req.unit_id)?;
        self.state
            .regeneration
            .confirm(
                unit_id,
                &req.proposed_text,
                req.start_index,
                req.end_index,
                req.expected_text.as_deref(),
            )
            .map_err(course_error)
    }
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Generation and drafts
    // ============================================================

    #[tool(
        description = "Generate a complete course from a title, difficulty and duration in months. Produces an outline, one unit per month with detailed content and an activity block, and stages it as a draft. Nothing is saved until commit_course is called. Returns the course_id and a summary of the staged units."
    )]
    async fn generate_course(
        &self,
        params: Parameters<GenerateCourseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let summary = self.generate(params.0).await?;
        json_result(&summary)
    }

    #[tool(
        description = "Fetch a staged draft by course_id, including full unit content and activities. Use this to review a generated course before committing or discarding it."
    )]
    async fn get_draft(&self, params: Parameters<DraftRequest>) -> Result<CallToolResult, McpError> {
        let entry = self.draft(&params.0.course_id)?;
        json_result(&entry)
    }

    #[tool(
        description = "Persist a staged draft and remove it from the draft cache. Each unit gets one assessment. If saving fails the draft is kept so the commit can be retried."
    )]
    async fn commit_course(
        &self,
        params: Parameters<DraftRequest>,
    ) -> Result<CallToolResult, McpError> {
        let summary = self.commit(&params.0.course_id)?;
        json_result(&summary)
    }

    #[tool(description = "Drop a staged draft without saving anything.")]
    async fn discard_course(
        &self,
        params: Parameters<DraftRequest>,
    ) -> Result<CallToolResult, McpError> {
        let course_id = params.0.course_id;
        self.discard(&course_id)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Draft {} discarded",
            course_id
        ))]))
    }

    // ============================================================
    // Committed courses
    // ============================================================

    #[tool(
        description = "List committed modules ordered by name. Optionally filter by a case-insensitive name substring."
    )]
    async fn list_modules(
        &self,
        params: Parameters<ListModulesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let modules = self.modules(params.0.query.as_deref())?;
        json_result(&modules)
    }

    #[tool(
        description = "Get a committed module with its units in order, including each unit's content, activities and assessments."
    )]
    async fn get_module(
        &self,
        params: Parameters<GetModuleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tree = self.module(&params.0.module_id)?;
        json_result(&tree)
    }

    // ============================================================
    // Regeneration
    // ============================================================

    #[tool(
        description = "Propose a rewrite for a committed unit. Pass highlighted_text with its byte offsets to rewrite a span, or a reason to regenerate the whole unit. Returns proposed_text; nothing is saved until confirm_regeneration is called."
    )]
    async fn propose_regeneration(
        &self,
        params: Parameters<ProposeRegenerationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let proposal = self.propose(params.0).await?;
        json_result(&proposal)
    }

    #[tool(
        description = "Splice proposed_text into a unit's content, replacing the byte range [start_index, end_index). Pass expected_text to refuse the splice if the content changed since the proposal. Returns the updated unit."
    )]
    async fn confirm_regeneration(
        &self,
        params: Parameters<ConfirmRegenerationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let unit = self.confirm(params.0)?;
        json_result(&unit)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "coursegen".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"coursegen builds structured courses with a language model.

WORKFLOW:
1. generate_course with title, difficulty and duration_months
2. get_draft to review the staged units
3. commit_course to save it, or discard_course to drop it

Drafts live in memory only. They are lost when the server restarts.

EDITING COMMITTED UNITS:
- list_modules / get_module to find the unit
- propose_regeneration with highlighted_text + offsets, or with a reason
- confirm_regeneration to splice the proposal in

Offsets are byte offsets into the unit content as returned by get_module."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(state: AppState) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(state);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

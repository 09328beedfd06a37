//! MCP server integration tests against an in-process server.

mod common;

use std::sync::Arc;

use common::{app_state, StubClient};
use coursegen::mcp::*;
use coursegen::state::AppState;

fn setup() -> (McpServer, AppState) {
    let state = app_state(Arc::new(StubClient::statistics()));
    (McpServer::new(state.clone()), state)
}

fn statistics() -> GenerateCourseRequest {
    GenerateCourseRequest {
        title: "Intro to Statistics".to_string(),
        difficulty: "Beginner".to_string(),
        duration_months: 2,
    }
}

mod drafts {
    use super::*;

    #[tokio::test]
    async fn generate_stages_a_reviewable_draft() {
        let (server, _) = setup();

        let summary = server.generate(statistics()).await.expect("Tool failed");
        assert_eq!(summary.module_name, "Module: Intro to Statistics");
        assert_eq!(summary.units.len(), 2);
        assert!(summary.units.iter().all(|u| u.activities == 1 && u.content_length > 0));

        let draft = server.draft(&summary.course_id).expect("Draft missing");
        assert_eq!(draft.units.len(), 2);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected() {
        let (server, state) = setup();

        let result = server
            .generate(GenerateCourseRequest {
                duration_months: 0,
                ..statistics()
            })
            .await;

        assert!(result.is_err());
        assert!(state.drafts.is_empty());
    }

    #[tokio::test]
    async fn commit_saves_course_and_drops_draft() {
        let (server, state) = setup();
        let summary = server.generate(statistics()).await.expect("Tool failed");

        let committed = server.commit(&summary.course_id).expect("Commit failed");
        assert_eq!(committed.module_id, summary.module_id);
        assert!(committed.units.iter().all(|u| u.assessments == 1));

        assert!(state.drafts.is_empty());
        assert!(server.draft(&summary.course_id).is_err());
        assert!(server.commit(&summary.course_id).is_err());
    }

    #[tokio::test]
    async fn discard_drops_draft_without_saving() {
        let (server, _) = setup();
        let summary = server.generate(statistics()).await.expect("Tool failed");

        server.discard(&summary.course_id).expect("Discard failed");

        assert!(server.draft(&summary.course_id).is_err());
        assert!(server.modules(None).expect("List failed").is_empty());
    }

    #[tokio::test]
    async fn malformed_course_id_is_rejected() {
        let (server, _) = setup();
        assert!(server.draft("not-a-uuid").is_err());
        assert!(server.discard("not-a-uuid").is_err());
    }
}

mod modules {
    use super::*;

    #[tokio::test]
    async fn lists_and_fetches_committed_modules() {
        let (server, _) = setup();
        let summary = server.generate(statistics()).await.expect("Tool failed");
        server.commit(&summary.course_id).expect("Commit failed");

        assert_eq!(server.modules(None).expect("List failed").len(), 1);
        assert_eq!(server.modules(Some("stat")).expect("Search failed").len(), 1);
        assert!(server.modules(Some("biology")).expect("Search failed").is_empty());

        let tree = server.module(&summary.module_id).expect("Module missing");
        assert_eq!(tree.units.len(), 2);
    }
}

mod regeneration {
    use super::*;

    async fn committed_unit(server: &McpServer, state: &AppState) -> (String, String) {
        let summary = server.generate(statistics()).await.expect("Tool failed");
        server.commit(&summary.course_id).expect("Commit failed");
        let unit_id = summary.units[0].id.clone();
        state
            .db
            .update_unit_content(unit_id.parse().unwrap(), "ABCDEFG")
            .expect("Update failed");
        (summary.module_id, unit_id)
    }

    #[tokio::test]
    async fn propose_then_confirm_highlight() {
        let (server, state) = setup();
        let (module_id, unit_id) = committed_unit(&server, &state).await;

        let proposal = server
            .propose(ProposeRegenerationRequest {
                module_id,
                unit_id: unit_id.clone(),
                highlighted_text: Some("CDE".to_string()),
                start_index: Some(2),
                end_index: Some(5),
                reason: None,
            })
            .await
            .expect("Propose failed");
        assert_eq!(proposal.proposed_text, "A clearer passage");

        let unit = server
            .confirm(ConfirmRegenerationRequest {
                unit_id,
                proposed_text: "xyz".to_string(),
                start_index: 2,
                end_index: 5,
                expected_text: Some("CDE".to_string()),
            })
            .expect("Confirm failed");
        assert_eq!(unit.content, "ABxyzFG");
    }

    #[tokio::test]
    async fn propose_requires_a_selector() {
        let (server, state) = setup();
        let (module_id, unit_id) = committed_unit(&server, &state).await;

        let result = server
            .propose(ProposeRegenerationRequest {
                module_id: module_id.clone(),
                unit_id: unit_id.clone(),
                highlighted_text: None,
                start_index: None,
                end_index: None,
                reason: None,
            })
            .await;
        assert!(result.is_err());

        let result = server
            .propose(ProposeRegenerationRequest {
                module_id,
                unit_id,
                highlighted_text: Some("CDE".to_string()),
                start_index: Some(2),
                end_index: None,
                reason: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn confirm_out_of_range_keeps_content() {
        let (server, state) = setup();
        let (_, unit_id) = committed_unit(&server, &state).await;

        let result = server.confirm(ConfirmRegenerationRequest {
            unit_id: unit_id.clone(),
            proposed_text: "xyz".to_string(),
            start_index: 4,
            end_index: 99,
            expected_text: None,
        });
        assert!(result.is_err());

        let unit = state.db.get_unit(unit_id.parse().unwrap()).unwrap().unwrap();
        assert_eq!(unit.content, "ABCDEFG");
    }
}

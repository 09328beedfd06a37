mod common;

use std::sync::Arc;

use common::{StubClient, STATISTICS_OUTLINE};
use coursegen::completion::AcceptancePolicy;
use coursegen::drafts::DraftCache;
use coursegen::error::CourseError;
use coursegen::generation::{CourseGenerator, GenerationConfig, ACTIVITY_NAME};
use coursegen::models::CourseRequest;

fn generator(client: Arc<StubClient>) -> CourseGenerator {
    CourseGenerator::new(client, DraftCache::new(), GenerationConfig::default())
}

fn statistics_request() -> CourseRequest {
    CourseRequest::new("Intro to Statistics", "Beginner", 2)
}

mod generate_course {
    use super::*;

    #[tokio::test]
    async fn builds_two_units_with_content_and_one_activity() {
        let client = Arc::new(StubClient::statistics());
        let generator = generator(client.clone());

        let entry = generator
            .generate_course(&statistics_request())
            .await
            .expect("Generation failed");

        assert_eq!(entry.module.name, "Module: Intro to Statistics");
        assert_eq!(entry.module.duration, "2");
        assert_eq!(entry.outline.name, "Month 1: Descriptive Statistics");
        assert_eq!(entry.units.len(), 2);

        for unit in &entry.units {
            assert!(!unit.content.is_empty());
            assert!(!unit.content.contains('#'));
            assert!(!unit.content.contains("---"));
            assert_eq!(unit.activities.len(), 1);
            assert_eq!(unit.activities[0].name, ACTIVITY_NAME);
            assert_eq!(unit.activities[0].unit_id, unit.id);
            assert_eq!(unit.module_id, entry.module.id);
            assert!(unit.assessments.is_empty());
        }

        // One outline call plus content and activities for each unit.
        assert_eq!(client.calls(), 5);
    }

    #[tokio::test]
    async fn stages_the_entry_in_the_draft_cache() {
        let generator = generator(Arc::new(StubClient::statistics()));

        let entry = generator
            .generate_course(&statistics_request())
            .await
            .expect("Generation failed");

        let staged = generator.drafts().get(entry.course_id).expect("Draft not staged");
        assert_eq!(staged.module.id, entry.module.id);
        assert_eq!(staged.units.len(), 2);
        assert_eq!(
            staged.outline.unit_ids,
            entry.units.iter().map(|u| u.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn each_call_stages_a_fresh_course_id() {
        let generator = generator(Arc::new(StubClient::statistics()));
        let request = statistics_request();

        let first = generator.generate_course(&request).await.expect("Generation failed");
        let second = generator.generate_course(&request).await.expect("Generation failed");

        assert_ne!(first.course_id, second.course_id);
        assert_eq!(generator.drafts().len(), 2);
    }

    #[tokio::test]
    async fn rejects_invalid_request_before_calling_upstream() {
        let client = Arc::new(StubClient::statistics());
        let generator = generator(client.clone());

        let err = generator
            .generate_course(&CourseRequest::new("Stats", "Beginner", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, CourseError::InvalidRequest(_)));
        assert_eq!(client.calls(), 0);
        assert!(generator.drafts().is_empty());
    }

    #[tokio::test]
    async fn unstructured_outline_stages_an_empty_course() {
        let client = Arc::new(StubClient::new("I can't help with an outline right now."));
        let generator = generator(client.clone());

        let entry = generator
            .generate_course(&statistics_request())
            .await
            .expect("Empty outline should not fail");

        assert!(entry.units.is_empty());
        assert!(entry.outline.unit_ids.is_empty());
        assert_eq!(client.calls(), 1);
        assert!(generator.drafts().get(entry.course_id).is_some());
    }

    #[tokio::test]
    async fn blank_outline_fails_without_staging() {
        let client = Arc::new(StubClient::new("   "));
        let generator = generator(client.clone());

        let err = generator
            .generate_course(&statistics_request())
            .await
            .unwrap_err();

        assert!(matches!(err, CourseError::Upstream(_)));
        assert_eq!(client.calls(), 3);
        assert!(generator.drafts().is_empty());
    }
}

mod fan_out {
    use super::*;

    fn long_outline(months: usize) -> String {
        (1..=months)
            .map(|m| format!("Month {m}: Topic {m}\nWeek {w}: Subtopic {w}", w = m * 4))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn preserves_outline_order_under_random_delays() {
        let client = Arc::new(StubClient::new(&long_outline(8)).with_random_delay(25));
        let generator = generator(client);

        let entry = generator
            .generate_course(&CourseRequest::new("Rust", "Advanced", 8))
            .await
            .expect("Generation failed");

        let names: Vec<_> = entry.units.iter().map(|u| u.name.clone()).collect();
        let expected: Vec<_> = (1..=8).map(|m| format!("Month {m}: Topic {m}")).collect();
        assert_eq!(names, expected);

        let sequence: Vec<_> = entry.units.iter().map(|u| u.sequence_number).collect();
        assert_eq!(sequence, (1..=8).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn bounds_concurrent_unit_generation() {
        let client = Arc::new(StubClient::new(&long_outline(9)).with_random_delay(10));
        let config = GenerationConfig {
            max_concurrent_units: 2,
            ..GenerationConfig::default()
        };
        let generator = CourseGenerator::new(client.clone(), DraftCache::new(), config);

        generator
            .generate_course(&CourseRequest::new("Rust", "Advanced", 9))
            .await
            .expect("Generation failed");

        assert!(client.peak_in_flight() <= 2, "peak was {}", client.peak_in_flight());
    }

    #[tokio::test]
    async fn unit_failure_fails_the_course_and_stages_nothing() {
        let client = Arc::new(StubClient::statistics().failing_unit("Probability"));
        let generator = generator(client.clone());

        let err = generator
            .generate_course(&statistics_request())
            .await
            .unwrap_err();

        match err {
            CourseError::UnitGeneration(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert_eq!(failures[0].unit_name, "Month 2: Probability");
                assert!(failures[0].cause.contains("upstream exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(generator.drafts().is_empty());
    }

    #[tokio::test]
    async fn sibling_units_still_run_when_one_fails() {
        let client = Arc::new(StubClient::statistics().failing_unit("Descriptive"));
        let config = GenerationConfig {
            content_policy: AcceptancePolicy::non_empty(1),
            ..GenerationConfig::default()
        };
        let generator = CourseGenerator::new(client.clone(), DraftCache::new(), config);

        let err = generator
            .generate_course(&statistics_request())
            .await
            .unwrap_err();
        assert!(matches!(err, CourseError::UnitGeneration(ref f) if f.len() == 1));

        // Outline, one failed content call, then content and activities for
        // the healthy unit.
        assert_eq!(client.calls(), 4);
    }

    #[test]
    fn outline_fixture_parses_to_two_units() {
        let parsed = coursegen::outline::parse_outline(STATISTICS_OUTLINE);
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(
            parsed.units[0].description,
            "Week 1: Data types and collection\nWeek 2: Mean, median and mode"
        );
    }
}

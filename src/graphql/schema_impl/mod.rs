pub mod mutations;
pub mod queries;

use async_graphql::{EmptySubscription, Schema as GraphQLSchema};

use crate::app_state::AppState;

pub use mutations::MutationRoot;
pub use queries::QueryRoot;

pub type Schema = GraphQLSchema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn create_schema(app_state: AppState) -> Schema {
    GraphQLSchema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(app_state)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        config::Config,
        models::domain::{Course, Lesson, LessonProgress},
        repositories::memory::{
            InMemoryContentRepository, InMemoryEnrollmentRepository, InMemoryProgressRepository,
        },
    };
    use chrono::Utc;
    use std::sync::Arc;

    async fn schema() -> Schema {
        let content = InMemoryContentRepository::new();
        let mut capped = Course::new("c-1", "Ladder safety");
        capped.max_participants = Some(1);
        content.put_course(capped).await;
        content.put_lesson(Lesson::timed("lesson-a", "c-1", 100.0)).await;

        let progress = InMemoryProgressRepository::new();
        progress
            .record_lesson_progress(LessonProgress::at_time("l-1", "lesson-a", 40.0))
            .await;

        create_schema(AppState::with_repositories(
            Config::test_config(),
            Arc::new(content),
            Arc::new(progress),
            Arc::new(InMemoryEnrollmentRepository::new()),
            Arc::new(FixedClock::new(Utc::now())),
        ))
    }

    #[tokio::test]
    async fn enroll_and_query_progress() {
        let schema = schema().await;

        let response = schema
            .execute(r#"mutation { enroll(input: { learnerId: "l-1", courseId: "c-1" }) { message } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let response = schema
            .execute(r#"{ progress(learnerId: "l-1", courseId: "c-1") { overallPercentage status } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().expect("json");
        assert_eq!(data["progress"]["overallPercentage"], 40.0);
        assert_eq!(data["progress"]["status"], "FAILED");
    }

    #[tokio::test]
    async fn business_errors_expose_code_extension() {
        let schema = schema().await;

        schema
            .execute(r#"mutation { enroll(input: { learnerId: "l-1", courseId: "c-1" }) { message } }"#)
            .await;
        let response = schema
            .execute(r#"mutation { enroll(input: { learnerId: "l-2", courseId: "c-1" }) { message } }"#)
            .await;

        let error = response.errors.first().expect("capacity error");
        let code = error
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("CAPACITY_EXCEEDED")));
    }
}

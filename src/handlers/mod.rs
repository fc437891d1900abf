pub mod enrollment_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod progress_handler;

pub use enrollment_handler::{assign_learners, cancel_enrollment, enroll, list_enrollments};
pub use graphql_handler::{graphiql, graphql};
pub use health_handler::{health_check, health_check_ready};
pub use progress_handler::get_progress;

use actix_web::web;

/// Registers every REST and GraphQL route on an actix app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(get_progress)
        .service(enroll)
        .service(cancel_enrollment)
        .service(assign_learners)
        .service(list_enrollments)
        .service(graphql)
        .service(graphiql);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        config::Config,
        app_state::AppState,
        models::domain::Course,
        repositories::memory::{
            InMemoryContentRepository, InMemoryEnrollmentRepository, InMemoryProgressRepository,
        },
        graphql::create_schema,
    };
    use actix_web::{http::StatusCode, test, App};
    use chrono::Utc;
    use std::sync::Arc;

    async fn state() -> AppState {
        let content = InMemoryContentRepository::new();
        content.put_course(Course::new("c-1", "Ladder safety")).await;
        AppState::with_repositories(
            Config::test_config(),
            Arc::new(content),
            Arc::new(InMemoryProgressRepository::new()),
            Arc::new(InMemoryEnrollmentRepository::new()),
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;

        let req = test::TestRequest::get().uri("/health").to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_enroll_then_progress_then_cancel() {
        let state = state().await;
        let schema = create_schema(state.clone());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(schema))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/courses/c-1/learners/l-1/enrollment")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/courses/c-1/learners/l-1/enrollment")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri("/api/courses/c-1/learners/l-1/progress")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ASSIGNED");
        assert_eq!(body["overall_percentage"], 0.0);

        let req = test::TestRequest::delete()
            .uri("/api/courses/c-1/learners/l-1/enrollment")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/courses/c-1/learners/l-1/progress")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_error_body_carries_code() {
        let state = state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(enroll),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/courses/missing/learners/l-1/enrollment")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_assignment_endpoint() {
        let state = state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(assign_learners)
                .service(list_enrollments),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/courses/c-1/assignments")
            .set_json(serde_json::json!({ "learner_ids": ["l-1", "l-2"] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["added"], serde_json::json!(["l-1", "l-2"]));

        let req = test::TestRequest::get()
            .uri("/api/learners/l-2/enrollments")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["optional_flag"], 1);
    }

    #[actix_web::test]
    async fn test_ready_without_database() {
        let state = state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(health_check_ready),
        )
        .await;

        let req = test::TestRequest::get().uri("/health/ready").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["dependencies"]["mongodb"], "disabled");
    }
}

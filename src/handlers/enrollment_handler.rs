use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{app_state::AppState, errors::AppError, models::dto::request::AssignLearnersRequest};

#[post("/api/courses/{course_id}/learners/{learner_id}/enrollment")]
pub async fn enroll(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (course_id, learner_id) = path.into_inner();
    let response = state
        .enrollment_service
        .enroll(&learner_id, &course_id)
        .await?;
    Ok(HttpResponse::Created().json(response))
}

#[delete("/api/courses/{course_id}/learners/{learner_id}/enrollment")]
pub async fn cancel_enrollment(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (course_id, learner_id) = path.into_inner();
    let response = state
        .enrollment_service
        .cancel(&learner_id, &course_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[put("/api/courses/{course_id}/assignments")]
pub async fn assign_learners(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<AssignLearnersRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let response = state
        .enrollment_service
        .assign_learners(&course_id, &request.learner_ids)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/learners/{learner_id}/enrollments")]
pub async fn list_enrollments(
    state: web::Data<AppState>,
    learner_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let enrollments = state
        .enrollment_service
        .list_enrollments(&learner_id)
        .await?;
    Ok(HttpResponse::Ok().json(enrollments))
}

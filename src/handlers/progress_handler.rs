use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError};

/// Returns the learner's reconciled progress; the stored enrollment status is
/// refreshed as part of the call.
#[get("/api/courses/{course_id}/learners/{learner_id}/progress")]
pub async fn get_progress(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (course_id, learner_id) = path.into_inner();
    let progress = state
        .progress_service
        .get_progress(&learner_id, &course_id)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

use async_graphql::{Context, ErrorExtensions, Object, Result};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{AssignLearnersRequest, EnrollmentRequest},
        response::{AssignmentResponse, MessageResponse},
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn enroll(&self, ctx: &Context<'_>, input: EnrollmentRequest) -> Result<MessageResponse> {
        let state = ctx.data::<AppState>()?;
        input.validate().map_err(|e| AppError::from(e).extend())?;

        state
            .enrollment_service
            .enroll(&input.learner_id, &input.course_id)
            .await
            .map_err(|e| e.extend())
    }

    async fn cancel_enrollment(
        &self,
        ctx: &Context<'_>,
        input: EnrollmentRequest,
    ) -> Result<MessageResponse> {
        let state = ctx.data::<AppState>()?;
        input.validate().map_err(|e| AppError::from(e).extend())?;

        state
            .enrollment_service
            .cancel(&input.learner_id, &input.course_id)
            .await
            .map_err(|e| e.extend())
    }

    async fn assign_learners(
        &self,
        ctx: &Context<'_>,
        course_id: String,
        input: AssignLearnersRequest,
    ) -> Result<AssignmentResponse> {
        let state = ctx.data::<AppState>()?;
        input.validate().map_err(|e| AppError::from(e).extend())?;

        state
            .enrollment_service
            .assign_learners(&course_id, &input.learner_ids)
            .await
            .map_err(|e| e.extend())
    }
}

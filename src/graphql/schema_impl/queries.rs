use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::{
    app_state::AppState,
    models::{domain::Enrollment, dto::response::ProgressResponse},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Current progress of a learner in a course. The stored enrollment
    /// status is reconciled as part of the lookup.
    async fn progress(
        &self,
        ctx: &Context<'_>,
        learner_id: String,
        course_id: String,
    ) -> Result<ProgressResponse> {
        let state = ctx.data::<AppState>()?;
        state
            .progress_service
            .get_progress(&learner_id, &course_id)
            .await
            .map_err(|e| e.extend())
    }

    async fn enrollments(&self, ctx: &Context<'_>, learner_id: String) -> Result<Vec<Enrollment>> {
        let state = ctx.data::<AppState>()?;
        state
            .enrollment_service
            .list_enrollments(&learner_id)
            .await
            .map_err(|e| e.extend())
    }
}

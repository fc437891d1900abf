use std::sync::Arc;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    models::{
        domain::{Enrollment, EnrollmentStatus},
        dto::response::ProgressResponse,
    },
    repositories::{ContentRepository, EnrollmentRepository, ProgressRepository},
    services::{
        enrollment_state::derive_status,
        key_locks::KeyLocks,
        lifecycle_guard::require_id,
        progress_aggregator::{aggregate, ProgressBreakdown},
    },
};

/// Result of evaluating a learner against the current progress store,
/// before anything is written back.
#[derive(Debug, Clone)]
pub struct ProgressEvaluation {
    pub enrollment: Enrollment,
    pub breakdown: ProgressBreakdown,
    pub status: EnrollmentStatus,
}

impl ProgressEvaluation {
    fn into_response(self) -> ProgressResponse {
        ProgressResponse {
            learner_id: self.enrollment.learner_id,
            course_id: self.enrollment.course_id,
            overall_percentage: self.breakdown.overall_percentage,
            status: self.status,
            breakdown: self.breakdown,
        }
    }
}

pub struct ProgressService {
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    locks: Arc<KeyLocks>,
    clock: Arc<dyn Clock>,
}

impl ProgressService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        locks: Arc<KeyLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            progress,
            enrollments,
            locks,
            clock,
        }
    }

    /// Computes percentage and status without touching the stored enrollment.
    pub async fn evaluate(&self, learner_id: &str, course_id: &str) -> AppResult<ProgressEvaluation> {
        require_id("learner_id", learner_id)?;
        require_id("course_id", course_id)?;

        // Existence first: no point aggregating for someone who is not enrolled.
        let enrollment = self
            .enrollments
            .find(learner_id, course_id)
            .await?
            .ok_or_else(|| {
                AppError::NotEnrolled(format!(
                    "Learner '{}' is not enrolled in course '{}'",
                    learner_id, course_id
                ))
            })?;

        let lessons = self.content.find_lessons_by_course(course_id).await?;
        let tests = self.content.find_tests_by_course(course_id).await?;

        let lesson_ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();
        let test_ids: Vec<String> = tests.iter().map(|t| t.id.clone()).collect();

        let lesson_progress = self
            .progress
            .find_lesson_progress(learner_id, &lesson_ids)
            .await?;
        let test_results = self.progress.find_test_results(learner_id, &test_ids).await?;

        let breakdown = aggregate(&lessons, &tests, &lesson_progress, &test_results);
        let status = derive_status(breakdown.overall_percentage, breakdown.attempt_completeness);

        Ok(ProgressEvaluation {
            enrollment,
            breakdown,
            status,
        })
    }

    /// Evaluates and writes the derived status back when it drifted from the
    /// stored one. Runs under the (learner, course) lock so two reconciles
    /// for the same pair cannot interleave their read and write.
    pub async fn reconcile(&self, learner_id: &str, course_id: &str) -> AppResult<ProgressResponse> {
        let _guard = self.locks.lock(learner_id, course_id).await;

        let mut evaluation = self.evaluate(learner_id, course_id).await?;

        let mut enrollment = evaluation.enrollment.clone();
        let previous = enrollment.status;
        if enrollment.apply_progress(
            evaluation.breakdown.overall_percentage,
            evaluation.status,
            self.clock.now(),
        ) {
            evaluation.enrollment = self.enrollments.update(enrollment).await?;

            if previous != evaluation.status {
                log::info!(
                    "Enrollment of learner {} in course {} moved {} -> {} ({:.2}%)",
                    learner_id,
                    course_id,
                    previous.as_str(),
                    evaluation.status.as_str(),
                    evaluation.breakdown.overall_percentage
                );
            }
        }

        Ok(evaluation.into_response())
    }

    /// GetProgress: the reconciled percentage and status for one learner.
    pub async fn get_progress(&self, learner_id: &str, course_id: &str) -> AppResult<ProgressResponse> {
        self.reconcile(learner_id, course_id).await
    }
}

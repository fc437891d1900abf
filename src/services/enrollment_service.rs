use std::sync::Arc;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    models::{
        domain::{Course, Enrollment},
        dto::response::{AssignmentResponse, MessageResponse},
    },
    repositories::{ContentRepository, EnrollmentRepository},
    services::{
        assignment::AssignmentPlan,
        key_locks::KeyLocks,
        lifecycle_guard::{check_cancel, check_enroll, require_id, visible_course},
    },
};

pub struct EnrollmentService {
    content: Arc<dyn ContentRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    locks: Arc<KeyLocks>,
    clock: Arc<dyn Clock>,
}

impl EnrollmentService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        locks: Arc<KeyLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            enrollments,
            locks,
            clock,
        }
    }

    async fn load_visible_course(&self, course_id: &str) -> AppResult<Course> {
        let course = self.content.find_course(course_id).await?;
        visible_course(course, course_id)
    }

    pub async fn enroll(&self, learner_id: &str, course_id: &str) -> AppResult<MessageResponse> {
        require_id("learner_id", learner_id)?;
        require_id("course_id", course_id)?;

        let _guard = self.locks.lock(learner_id, course_id).await;
        let now = self.clock.now();

        let course = self.load_visible_course(course_id).await?;
        let existing = self.enrollments.find(learner_id, course_id).await?;
        let enrolled_count = match course.capacity() {
            Some(_) => self.enrollments.count_by_course(course_id).await?,
            None => 0,
        };

        if let Err(err) = check_enroll(&course, existing.as_ref(), enrolled_count, now) {
            log::debug!(
                "Rejected enrollment of learner {} in course {}: {}",
                learner_id,
                course_id,
                err
            );
            return Err(err);
        }

        // The count above is only a fast path; the insert re-checks seats and
        // uniqueness atomically.
        self.enrollments
            .insert(
                Enrollment::self_enrolled(learner_id, course_id, now),
                course.capacity(),
            )
            .await?;

        log::info!("Learner {} enrolled in course {}", learner_id, course_id);
        Ok(MessageResponse::new(format!(
            "Enrolled in course '{}'",
            course.title
        )))
    }

    pub async fn cancel(&self, learner_id: &str, course_id: &str) -> AppResult<MessageResponse> {
        require_id("learner_id", learner_id)?;
        require_id("course_id", course_id)?;

        let _guard = self.locks.lock(learner_id, course_id).await;
        let now = self.clock.now();

        let course = self.load_visible_course(course_id).await?;
        let existing = self.enrollments.find(learner_id, course_id).await?;

        if let Err(err) = check_cancel(&course, existing.as_ref(), learner_id, now) {
            log::debug!(
                "Rejected cancellation of learner {} in course {}: {}",
                learner_id,
                course_id,
                err
            );
            return Err(err);
        }

        self.enrollments.delete(learner_id, course_id).await?;

        log::info!("Learner {} cancelled enrollment in course {}", learner_id, course_id);
        Ok(MessageResponse::new(format!(
            "Enrollment in course '{}' cancelled",
            course.title
        )))
    }

    /// Reconciles the course's mandatory enrollments with `learner_ids`.
    /// Capacity and registration windows do not apply to administrators.
    pub async fn assign_learners(
        &self,
        course_id: &str,
        learner_ids: &[String],
    ) -> AppResult<AssignmentResponse> {
        require_id("course_id", course_id)?;
        for learner_id in learner_ids {
            require_id("learner_id", learner_id)?;
        }

        let course = self.content.find_course(course_id).await?;
        if course.map(|c| c.is_deleted).unwrap_or(true) {
            return Err(AppError::NotFound(format!(
                "Course with id '{}' not found",
                course_id
            )));
        }

        let existing = self.enrollments.find_by_course(course_id).await?;
        let plan = AssignmentPlan::compute(&existing, learner_ids);

        log::info!(
            "Assignment plan for course {}: +{} -{} promote {} keep {}",
            course_id,
            plan.to_add.len(),
            plan.to_remove.len(),
            plan.to_promote.len(),
            plan.unchanged.len()
        );

        for learner_id in &plan.to_remove {
            let _guard = self.locks.lock(learner_id, course_id).await;
            match self.enrollments.delete(learner_id, course_id).await {
                // already gone by the time we got the lock
                Ok(()) | Err(AppError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        for learner_id in &plan.to_promote {
            let _guard = self.locks.lock(learner_id, course_id).await;
            if let Some(mut enrollment) = self.enrollments.find(learner_id, course_id).await? {
                enrollment.promote_to_mandatory(self.clock.now());
                self.enrollments.update(enrollment).await?;
            }
        }

        for learner_id in &plan.to_add {
            let _guard = self.locks.lock(learner_id, course_id).await;
            let enrollment = Enrollment::assigned(learner_id, course_id, self.clock.now());
            match self.enrollments.insert(enrollment, None).await {
                Ok(_) => {}
                // self-enrolled in the meantime
                Err(AppError::Conflict(_)) => {
                    if let Some(mut enrollment) = self.enrollments.find(learner_id, course_id).await? {
                        enrollment.promote_to_mandatory(self.clock.now());
                        self.enrollments.update(enrollment).await?;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Ok(AssignmentResponse::from_plan(course_id, plan))
    }

    pub async fn list_enrollments(&self, learner_id: &str) -> AppResult<Vec<Enrollment>> {
        require_id("learner_id", learner_id)?;
        self.enrollments.find_by_learner(learner_id).await
    }
}

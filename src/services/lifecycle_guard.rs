//! Preconditions for self-service enroll and cancel.
//!
//! The checks are pure and run in a fixed order, so the first failing rule
//! decides the error a learner sees.

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Course, Enrollment},
};

pub fn require_id(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Resolves a lookup into a course learners may act on. Missing, private and
/// deleted courses all look the same from the outside.
pub fn visible_course(course: Option<Course>, course_id: &str) -> AppResult<Course> {
    match course {
        Some(course) if course.is_open_to_learners() => Ok(course),
        _ => Err(AppError::NotFound(format!(
            "Course with id '{}' not found",
            course_id
        ))),
    }
}

/// Checks an enroll request against an already loaded course.
pub fn check_enroll(
    course: &Course,
    existing: Option<&Enrollment>,
    enrolled_count: u64,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(existing) = existing {
        return Err(AppError::Conflict(format!(
            "Learner '{}' is already enrolled in course '{}'",
            existing.learner_id, course.id
        )));
    }

    if course.registration_opens_after(now) {
        return Err(AppError::RegistrationNotOpen(format!(
            "Registration for course '{}' has not opened yet",
            course.id
        )));
    }

    if course.registration_closed_at(now) {
        return Err(AppError::DeadlinePassed(format!(
            "Registration for course '{}' is closed",
            course.id
        )));
    }

    if let Some(max) = course.capacity() {
        if enrolled_count >= u64::from(max) {
            return Err(AppError::CapacityExceeded(format!(
                "Course '{}' is full ({} participants)",
                course.id, max
            )));
        }
    }

    Ok(())
}

/// Checks a cancel request and hands back the enrollment to remove.
pub fn check_cancel<'a>(
    course: &Course,
    existing: Option<&'a Enrollment>,
    learner_id: &str,
    now: DateTime<Utc>,
) -> AppResult<&'a Enrollment> {
    let enrollment = existing.ok_or_else(|| {
        AppError::NotFound(format!(
            "Learner '{}' is not enrolled in course '{}'",
            learner_id, course.id
        ))
    })?;

    if enrollment.is_admin_assigned() {
        return Err(AppError::Forbidden(format!(
            "Enrollment in course '{}' is mandatory and cannot be cancelled",
            course.id
        )));
    }

    if course.registration_closed_at(now) {
        return Err(AppError::DeadlinePassed(format!(
            "Registration for course '{}' is closed",
            course.id
        )));
    }

    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn course() -> Course {
        Course::new("c-1", "Fire safety")
    }

    #[test]
    fn hidden_courses_are_not_found() {
        assert!(matches!(visible_course(None, "c-1"), Err(AppError::NotFound(_))));

        let mut private = course();
        private.is_private = true;
        assert!(matches!(
            visible_course(Some(private), "c-1"),
            Err(AppError::NotFound(_))
        ));

        let mut deleted = course();
        deleted.is_deleted = true;
        assert!(matches!(
            visible_course(Some(deleted), "c-1"),
            Err(AppError::NotFound(_))
        ));

        assert!(visible_course(Some(course()), "c-1").is_ok());
    }

    #[test]
    fn enroll_conflict_is_reported_before_deadline() {
        let now = Utc::now();
        let mut closed = course();
        closed.registration_closing_date = Some(now - Duration::days(1));
        let existing = Enrollment::self_enrolled("l-1", "c-1", now);

        let result = check_enroll(&closed, Some(&existing), 0, now);
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let result = check_enroll(&closed, None, 0, now);
        assert!(matches!(result, Err(AppError::DeadlinePassed(_))));
    }

    #[test]
    fn enroll_before_window_opens_is_rejected() {
        let now = Utc::now();
        let mut upcoming = course();
        upcoming.registration_start_date = Some(now + Duration::hours(1));

        let result = check_enroll(&upcoming, None, 0, now);
        assert!(matches!(result, Err(AppError::RegistrationNotOpen(_))));
    }

    #[test]
    fn capacity_boundary() {
        let now = Utc::now();
        let mut capped = course();
        capped.max_participants = Some(3);

        assert!(check_enroll(&capped, None, 2, now).is_ok());
        assert!(matches!(
            check_enroll(&capped, None, 3, now),
            Err(AppError::CapacityExceeded(_))
        ));

        capped.max_participants = Some(0);
        assert!(check_enroll(&capped, None, 500, now).is_ok());
    }

    #[test]
    fn cancel_mandatory_is_forbidden_even_after_deadline() {
        let now = Utc::now();
        let mut closed = course();
        closed.registration_closing_date = Some(now - Duration::days(1));
        let mandatory = Enrollment::assigned("l-1", "c-1", now);

        let result = check_cancel(&closed, Some(&mandatory), "l-1", now);
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let open = course();
        let result = check_cancel(&open, Some(&mandatory), "l-1", now);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn cancel_rules() {
        let now = Utc::now();
        let optional = Enrollment::self_enrolled("l-1", "c-1", now);

        assert!(matches!(
            check_cancel(&course(), None, "l-1", now),
            Err(AppError::NotFound(_))
        ));

        let mut closed = course();
        closed.registration_closing_date = Some(now - Duration::minutes(5));
        assert!(matches!(
            check_cancel(&closed, Some(&optional), "l-1", now),
            Err(AppError::DeadlinePassed(_))
        ));

        let found = check_cancel(&course(), Some(&optional), "l-1", now).expect("cancel allowed");
        assert_eq!(found.learner_id, "l-1");
    }

    #[test]
    fn blank_ids_fail_validation() {
        assert!(matches!(require_id("learner_id", "  "), Err(AppError::ValidationError(_))));
        assert!(require_id("learner_id", "l-1").is_ok());
    }
}

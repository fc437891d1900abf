use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `optional_flag` value for learners who enrolled themselves.
pub const SELF_ENROLLED: i32 = 0;
/// `optional_flag` value for administrative assignments.
pub const ADMIN_ASSIGNED: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Enum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Assigned => "ASSIGNED",
            EnrollmentStatus::InProgress => "IN_PROGRESS",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Failed)
    }
}

/// One learner's membership in one course. `status` and `percent_complete`
/// are a cache of what the progress store says; they are rewritten on
/// reconcile, never edited by hand.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct Enrollment {
    pub id: String,
    pub learner_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
    pub percent_complete: f64,
    pub is_mandatory: bool,
    pub optional_flag: i32,
    pub assigned_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn self_enrolled(learner_id: &str, course_id: &str, now: DateTime<Utc>) -> Self {
        Self::fresh(learner_id, course_id, SELF_ENROLLED, now)
    }

    pub fn assigned(learner_id: &str, course_id: &str, now: DateTime<Utc>) -> Self {
        Self::fresh(learner_id, course_id, ADMIN_ASSIGNED, now)
    }

    fn fresh(learner_id: &str, course_id: &str, optional_flag: i32, now: DateTime<Utc>) -> Self {
        Enrollment {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            course_id: course_id.to_string(),
            status: EnrollmentStatus::Assigned,
            percent_complete: 0.0,
            is_mandatory: optional_flag == ADMIN_ASSIGNED,
            optional_flag,
            assigned_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin_assigned(&self) -> bool {
        self.optional_flag == ADMIN_ASSIGNED
    }

    /// Turns a self-service enrollment into a mandatory one in place,
    /// keeping its history.
    pub fn promote_to_mandatory(&mut self, now: DateTime<Utc>) {
        self.optional_flag = ADMIN_ASSIGNED;
        self.is_mandatory = true;
        self.updated_at = now;
    }

    /// Stores a freshly derived percentage/status pair. Returns whether
    /// anything actually changed.
    pub fn apply_progress(
        &mut self,
        percent_complete: f64,
        status: EnrollmentStatus,
        now: DateTime<Utc>,
    ) -> bool {
        if self.status == status && self.percent_complete == percent_complete {
            return false;
        }
        self.percent_complete = percent_complete;
        self.status = status;
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_enrollment_starts_optional_and_assigned() {
        let enrollment = Enrollment::self_enrolled("l-1", "c-1", Utc::now());
        assert_eq!(enrollment.status, EnrollmentStatus::Assigned);
        assert_eq!(enrollment.optional_flag, SELF_ENROLLED);
        assert!(!enrollment.is_mandatory);
        assert_eq!(enrollment.percent_complete, 0.0);
    }

    #[test]
    fn admin_assignment_is_mandatory() {
        let enrollment = Enrollment::assigned("l-1", "c-1", Utc::now());
        assert!(enrollment.is_admin_assigned());
        assert!(enrollment.is_mandatory);
    }

    #[test]
    fn promote_keeps_assigned_at() {
        let start = Utc::now();
        let mut enrollment = Enrollment::self_enrolled("l-1", "c-1", start);
        enrollment.promote_to_mandatory(start + chrono::Duration::days(3));

        assert!(enrollment.is_admin_assigned());
        assert_eq!(enrollment.assigned_at, start);
    }

    #[test]
    fn apply_progress_reports_changes_only() {
        let now = Utc::now();
        let mut enrollment = Enrollment::self_enrolled("l-1", "c-1", now);

        assert!(!enrollment.apply_progress(0.0, EnrollmentStatus::Assigned, now));
        assert!(enrollment.apply_progress(40.0, EnrollmentStatus::InProgress, now));
        assert!(!enrollment.apply_progress(40.0, EnrollmentStatus::InProgress, now));
        assert_eq!(enrollment.status, EnrollmentStatus::InProgress);
    }

    #[test]
    fn status_serializes_in_upper_snake_case() {
        let json = serde_json::to_string(&EnrollmentStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(EnrollmentStatus::InProgress.as_str(), "IN_PROGRESS");
        assert!(EnrollmentStatus::Failed.is_terminal());
        assert!(!EnrollmentStatus::Assigned.is_terminal());
    }
}

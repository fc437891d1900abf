use crate::models::domain::EnrollmentStatus;

/// Status an enrollment should hold for a given overall percentage.
///
/// Recomputed from scratch on every evaluation; the previous status plays no
/// part. A learner who has touched every lesson and test but is still short
/// of 100% has nothing left to do, so the attempt is marked failed rather
/// than left in progress.
pub fn derive_status(overall_percentage: f64, attempt_completeness: bool) -> EnrollmentStatus {
    if !overall_percentage.is_finite() || overall_percentage <= 0.0 {
        EnrollmentStatus::Assigned
    } else if overall_percentage >= 100.0 {
        EnrollmentStatus::Completed
    } else if attempt_completeness {
        EnrollmentStatus::Failed
    } else {
        EnrollmentStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_percent_is_assigned_even_when_complete() {
        assert_eq!(derive_status(0.0, false), EnrollmentStatus::Assigned);
        assert_eq!(derive_status(0.0, true), EnrollmentStatus::Assigned);
    }

    #[test]
    fn full_percent_is_completed() {
        assert_eq!(derive_status(100.0, true), EnrollmentStatus::Completed);
        assert_eq!(derive_status(100.0, false), EnrollmentStatus::Completed);
    }

    #[test]
    fn partial_percent_splits_on_completeness() {
        assert_eq!(derive_status(25.0, true), EnrollmentStatus::Failed);
        assert_eq!(derive_status(50.0, false), EnrollmentStatus::InProgress);
        assert_eq!(derive_status(99.999, false), EnrollmentStatus::InProgress);
        assert_eq!(derive_status(0.001, true), EnrollmentStatus::Failed);
    }

    #[test]
    fn non_finite_percent_is_assigned() {
        assert_eq!(derive_status(f64::NAN, true), EnrollmentStatus::Assigned);
        assert_eq!(derive_status(f64::INFINITY, true), EnrollmentStatus::Assigned);
    }
}

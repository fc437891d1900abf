use async_graphql::SimpleObject;
use serde::Serialize;

use crate::{
    models::domain::EnrollmentStatus,
    services::{assignment::AssignmentPlan, progress_aggregator::ProgressBreakdown},
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ProgressResponse {
    pub learner_id: String,
    pub course_id: String,
    pub overall_percentage: f64,
    pub status: EnrollmentStatus,
    pub breakdown: ProgressBreakdown,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AssignmentResponse {
    pub course_id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub promoted: Vec<String>,
    pub unchanged: usize,
}

impl AssignmentResponse {
    pub fn from_plan(course_id: &str, plan: AssignmentPlan) -> Self {
        AssignmentResponse {
            course_id: course_id.to_string(),
            added: plan.to_add,
            removed: plan.to_remove,
            promoted: plan.to_promote,
            unchanged: plan.unchanged.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_response_counts_unchanged() {
        let plan = AssignmentPlan {
            to_add: vec!["e".to_string()],
            to_remove: vec!["a".to_string()],
            to_promote: vec![],
            unchanged: vec!["b".to_string(), "c".to_string()],
        };

        let response = AssignmentResponse::from_plan("c-1", plan);
        assert_eq!(response.added, vec!["e".to_string()]);
        assert_eq!(response.removed, vec!["a".to_string()]);
        assert_eq!(response.unchanged, 2);
    }

    #[test]
    fn progress_response_serializes_status_name() {
        let response = ProgressResponse {
            learner_id: "l-1".to_string(),
            course_id: "c-1".to_string(),
            overall_percentage: 25.0,
            status: EnrollmentStatus::Failed,
            breakdown: ProgressBreakdown {
                lessons_progress: 25.0,
                tests_progress: 0.0,
                overall_percentage: 25.0,
                attempt_completeness: true,
                lessons: vec![],
                tests: vec![],
            },
        };

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["overall_percentage"], 25.0);
    }
}

use async_graphql::InputObject;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct EnrollmentRequest {
    #[validate(length(min = 1, max = 100))]
    pub learner_id: String,

    #[validate(length(min = 1, max = 100))]
    pub course_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct AssignLearnersRequest {
    #[validate(length(max = 10000))]
    pub learner_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_request_requires_both_ids() {
        let request = EnrollmentRequest {
            learner_id: String::new(),
            course_id: "c-1".to_string(),
        };
        assert!(request.validate().is_err());

        let request = EnrollmentRequest {
            learner_id: "l-1".to_string(),
            course_id: "c-1".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_assignment_is_valid() {
        let request: AssignLearnersRequest =
            serde_json::from_str(r#"{"learner_ids": []}"#).expect("deserialize");
        assert!(request.validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseTest {
    pub id: String,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub question_count: u32,
}

impl CourseTest {
    pub fn new(id: &str, course_id: &str, question_count: u32) -> Self {
        CourseTest {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: None,
            question_count,
        }
    }
}

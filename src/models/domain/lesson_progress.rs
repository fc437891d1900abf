use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A learner's position within one lesson. Written by the player, read here.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LessonProgress {
    pub learner_id: String,
    pub lesson_id: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    pub fn started(learner_id: &str, lesson_id: &str) -> Self {
        LessonProgress {
            learner_id: learner_id.to_string(),
            lesson_id: lesson_id.to_string(),
            is_completed: false,
            current_time_seconds: None,
            current_page: None,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn completed(learner_id: &str, lesson_id: &str) -> Self {
        LessonProgress {
            is_completed: true,
            ..Self::started(learner_id, lesson_id)
        }
    }

    pub fn at_time(learner_id: &str, lesson_id: &str, seconds: f64) -> Self {
        LessonProgress {
            current_time_seconds: Some(seconds),
            ..Self::started(learner_id, lesson_id)
        }
    }

    pub fn at_page(learner_id: &str, lesson_id: &str, page: u32) -> Self {
        LessonProgress {
            current_page: Some(page),
            ..Self::started(learner_id, lesson_id)
        }
    }
}

use serde::{Deserialize, Serialize};

/// A lesson is tracked either by playback time or by pages read.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl Lesson {
    pub fn timed(id: &str, course_id: &str, total_duration_seconds: f64) -> Self {
        Lesson {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: None,
            total_duration_seconds: Some(total_duration_seconds),
            total_pages: None,
        }
    }

    pub fn paged(id: &str, course_id: &str, total_pages: u32) -> Self {
        Lesson {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: None,
            total_duration_seconds: None,
            total_pages: Some(total_pages),
        }
    }

    /// Duration usable as a divisor: present, finite and positive.
    pub fn positive_duration(&self) -> Option<f64> {
        self.total_duration_seconds
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn positive_page_count(&self) -> Option<u32> {
        self.total_pages.filter(|p| *p > 0)
    }
}

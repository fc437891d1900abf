use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_closing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_private: bool,
}

impl Course {
    pub fn new(id: &str, title: &str) -> Self {
        Course {
            id: id.to_string(),
            title: title.to_string(),
            max_participants: None,
            registration_start_date: None,
            registration_closing_date: None,
            is_deleted: false,
            is_private: false,
        }
    }

    /// Whether learners can see the course and self-enroll or cancel.
    pub fn is_open_to_learners(&self) -> bool {
        !self.is_deleted && !self.is_private
    }

    /// Seat limit, if one is configured. A cap of zero means unlimited.
    pub fn capacity(&self) -> Option<u32> {
        self.max_participants.filter(|max| *max > 0)
    }

    pub fn registration_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.registration_closing_date
            .map(|closing| closing < now)
            .unwrap_or(false)
    }

    pub fn registration_opens_after(&self, now: DateTime<Utc>) -> bool {
        self.registration_start_date
            .map(|start| start > now)
            .unwrap_or(false)
    }
}

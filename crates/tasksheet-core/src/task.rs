use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Display format for the creation timestamp. The string is captured
/// once at creation and never parsed back; it exists for the reader,
/// not for ordering or logic.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One to-do record. Status labels come from configuration
/// (`status.values`), so they stay plain strings here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,

    pub title: String,

    pub status: String,

    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Task {
    pub fn new(id: i64, title: String, status: String, created: DateTime<Local>) -> Self {
        Self {
            id,
            title,
            status,
            created_at: created.format(CREATED_AT_FORMAT).to_string(),
        }
    }
}

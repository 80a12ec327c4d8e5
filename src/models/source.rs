use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// An inspiration feed. Rows are seeded outside this job; we only move the
/// watermark forward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_inspiration_date: Option<DateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Source {
    pub fn watermark(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_inspiration_date.map(|d| d.to_chrono())
    }
}

use chrono::{DateTime, Utc};

/// A feed item newer than the source watermark, reduced to a prompt-sized excerpt.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspiration {
    pub content: String,
    pub link: String,
    pub iso_date: DateTime<Utc>,
}

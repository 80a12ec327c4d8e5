use bson::DateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

const PERMALINK_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
const PERMALINK_LEN: usize = 21;

/// One idea exactly as the model returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedIdea {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A generated idea tied to its origin, waiting for a publication slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftIdea {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub source: String,
    pub inspiration: String,
    pub permalink: String,
}

impl DraftIdea {
    pub fn from_generated(idea: GeneratedIdea, source: &str, inspiration: &str) -> Self {
        Self {
            title: idea.title,
            description: idea.description,
            tags: idea.tags,
            source: source.to_string(),
            inspiration: inspiration.to_string(),
            permalink: generate_permalink(),
        }
    }

    pub fn into_idea(self, pub_date: chrono::DateTime<chrono::Utc>) -> Idea {
        Idea {
            title: self.title,
            description: self.description,
            source: self.source,
            inspiration: self.inspiration,
            permalink: self.permalink,
            tags: self.tags,
            following_count: 0,
            pub_date: DateTime::from_chrono(pub_date),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Document stored in the `ideas` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub title: String,
    pub description: String,
    pub source: String,

    #[serde(default)]
    pub inspiration: String,

    pub permalink: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub following_count: i32,

    pub pub_date: DateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Idea {
    pub fn touch(&mut self, now: DateTime) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}

/// Random URL-safe identifier, 21 symbols from a 64-symbol alphabet.
pub fn generate_permalink() -> String {
    let mut rng = rand::thread_rng();
    (0..PERMALINK_LEN)
        .map(|_| PERMALINK_ALPHABET[rng.gen_range(0..PERMALINK_ALPHABET.len())] as char)
        .collect()
}

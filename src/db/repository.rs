use async_trait::async_trait;
use bson::{doc, Bson, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Utc};
use mongodb::{Client, Collection, Database};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Idea, Source, Tag};

use super::schema::{
    index_models, IntoIndexes, IDEA_COLLECTION, SOURCE_COLLECTION, TAG_COLLECTION,
};

/// Persistence boundary for the generation cycle.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Ideas whose `pubDate` is at or after `now`.
    async fn count_future_publications(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Latest `pubDate` at or after `now`, if any.
    async fn furthest_publication(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>>;

    async fn find_source(&self, key: &str) -> Result<Option<Source>>;

    async fn tag_keys(&self) -> Result<Vec<String>>;

    async fn insert_tags(&self, tags: Vec<Tag>) -> Result<()>;

    async fn insert_ideas(&self, ideas: Vec<Idea>) -> Result<usize>;

    /// Move the source watermark to `date`. Never moves it backward.
    async fn advance_watermark(&self, key: &str, date: DateTime<Utc>) -> Result<()>;
}

/// The only field the anchor lookup reads. Other fields of shared `ideas`
/// documents are neither fetched nor decoded.
#[derive(Debug, Deserialize)]
struct PublicationDate {
    #[serde(rename = "pubDate")]
    pub_date: BsonDateTime,
}

fn publication_date_projection() -> Document {
    doc! { "_id": 0, "pubDate": 1 }
}

pub struct Repository {
    client: Client,
    db: Database,
}

impl Repository {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("Connected to MongoDB database '{}'", db_name);

        let repository = Self { client, db };
        repository.apply_indexes::<Source>(SOURCE_COLLECTION).await?;
        repository.apply_indexes::<Tag>(TAG_COLLECTION).await?;
        repository.apply_indexes::<Idea>(IDEA_COLLECTION).await?;

        Ok(repository)
    }

    async fn apply_indexes<T>(&self, name: &str) -> Result<()>
    where
        T: IntoIndexes,
    {
        let indexes = index_models::<T>();
        if indexes.is_empty() {
            return Ok(());
        }
        self.db
            .collection::<Document>(name)
            .create_indexes(indexes)
            .await?;
        Ok(())
    }

    /// Release the connection pool.
    pub async fn close(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB connection closed");
    }

    fn sources(&self) -> Collection<Source> {
        self.db.collection(SOURCE_COLLECTION)
    }

    fn tags(&self) -> Collection<Tag> {
        self.db.collection(TAG_COLLECTION)
    }

    fn ideas(&self) -> Collection<Idea> {
        self.db.collection(IDEA_COLLECTION)
    }

    fn publication_dates(&self) -> Collection<PublicationDate> {
        self.db.collection(IDEA_COLLECTION)
    }
}

#[async_trait]
impl IdeaStore for Repository {
    async fn count_future_publications(&self, now: DateTime<Utc>) -> Result<u64> {
        let count = self
            .ideas()
            .count_documents(doc! { "pubDate": { "$gte": BsonDateTime::from_chrono(now) } })
            .await?;
        Ok(count)
    }

    async fn furthest_publication(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let furthest = self
            .publication_dates()
            .find_one(doc! { "pubDate": { "$gte": BsonDateTime::from_chrono(now) } })
            .sort(doc! { "pubDate": -1 })
            .projection(publication_date_projection())
            .await?;
        Ok(furthest.map(|p| p.pub_date.to_chrono()))
    }

    async fn find_source(&self, key: &str) -> Result<Option<Source>> {
        let source = self.sources().find_one(doc! { "key": key }).await?;
        Ok(source)
    }

    async fn tag_keys(&self) -> Result<Vec<String>> {
        let keys = self
            .tags()
            .distinct("key", doc! {})
            .await?
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(key) => Some(key),
                _ => None,
            })
            .collect();
        Ok(keys)
    }

    async fn insert_tags(&self, mut tags: Vec<Tag>) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let now = BsonDateTime::now();
        tags.iter_mut().for_each(|t| t.touch(now));
        self.tags().insert_many(tags).await?;
        Ok(())
    }

    async fn insert_ideas(&self, mut ideas: Vec<Idea>) -> Result<usize> {
        if ideas.is_empty() {
            return Ok(0);
        }
        let now = BsonDateTime::now();
        ideas.iter_mut().for_each(|i| i.touch(now));
        let result = self.ideas().insert_many(ideas).await?;
        Ok(result.inserted_ids.len())
    }

    async fn advance_watermark(&self, key: &str, date: DateTime<Utc>) -> Result<()> {
        let date = BsonDateTime::from_chrono(date);
        let result = self
            .sources()
            .update_one(
                doc! {
                    "key": key,
                    "$or": [
                        { "lastInspirationDate": Bson::Null },
                        { "lastInspirationDate": { "$lt": date } },
                    ],
                },
                doc! {
                    "$set": {
                        "lastInspirationDate": date,
                        "updatedAt": BsonDateTime::now(),
                    }
                },
            )
            .await?;

        if result.modified_count == 0 {
            tracing::debug!("Watermark for '{}' already at or past {}", key, date);
        }
        Ok(())
    }
}

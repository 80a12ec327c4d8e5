use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::models::{Idea, Source, Tag};

pub const SOURCE_COLLECTION: &str = "sources";
pub const TAG_COLLECTION: &str = "tags";
pub const IDEA_COLLECTION: &str = "ideas";

/// Index definitions a collection needs before it is used.
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

impl IntoIndexes for Source {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "key": 1 },
            Some(IndexOptions::builder().unique(true).build()),
        )]
    }
}

impl IntoIndexes for Tag {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "key": 1 },
            Some(IndexOptions::builder().unique(true).build()),
        )]
    }
}

impl IntoIndexes for Idea {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // listing: newest and most followed first
            (doc! { "createdAt": -1, "followingCount": -1 }, None),
            (doc! { "permalink": 1 }, None),
            // publication queue
            (doc! { "pubDate": -1 }, None),
        ]
    }
}

pub fn index_models<T: IntoIndexes>() -> Vec<IndexModel> {
    T::into_indices()
        .into_iter()
        .map(|(keys, options)| IndexModel::builder().keys(keys).options(options).build())
        .collect()
}

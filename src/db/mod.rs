mod repository;
pub mod schema;

pub use repository::{IdeaStore, Repository};

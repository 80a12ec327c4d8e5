pub mod chunker;
mod fetcher;

pub use fetcher::{FeedFetcher, InspirationSource};

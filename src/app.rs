use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::ai::IdeaGenerator;
use crate::config::Config;
use crate::db::IdeaStore;
use crate::error::{AppError, Result};
use crate::feed::InspirationSource;
use crate::models::{DraftIdea, Inspiration};
use crate::services::{scheduler, tags};

/// How a generation cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Enough ideas are already queued.
    Skipped { future_publications: u64 },
    NoSource,
    NoInspiration,
    NoIdeas,
    Inserted(usize),
}

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub source_key: String,
    pub safe_future_pub_count: u64,
    pub tokens_per_inspiration: usize,
    pub generation_concurrency: usize,
}

impl From<&Config> for CycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            source_key: config.source_key.clone(),
            safe_future_pub_count: config.safe_future_pub_count,
            tokens_per_inspiration: config.tokens_per_inspiration,
            generation_concurrency: config.generation_concurrency,
        }
    }
}

/// Results of independent fallible jobs, split by outcome.
/// Failures keep the index of the job that produced them.
pub struct Settled<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(usize, AppError)>,
}

/// Run every job to completion (at most `limit` at a time) and partition
/// the results. One failure never cancels the others; successes keep
/// their input order.
pub async fn gather_settled<I, Fut, T>(jobs: I, limit: usize) -> Settled<T>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T>>,
{
    let results: Vec<Result<T>> = stream::iter(jobs).buffered(limit.max(1)).collect().await;

    let mut settled = Settled {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => settled.succeeded.push(value),
            Err(e) => settled.failed.push((index, e)),
        }
    }
    settled
}

pub struct App<'a> {
    store: &'a dyn IdeaStore,
    fetcher: &'a dyn InspirationSource,
    generator: &'a dyn IdeaGenerator,
    settings: CycleSettings,
}

impl<'a> App<'a> {
    pub fn new(
        store: &'a dyn IdeaStore,
        fetcher: &'a dyn InspirationSource,
        generator: &'a dyn IdeaGenerator,
        settings: CycleSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            generator,
            settings,
        }
    }

    /// One pass of fetch, generate, reconcile, schedule and persist.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleOutcome> {
        let future_count = self.store.count_future_publications(now).await?;
        tracing::info!(
            "Future publications: {} (safe count {})",
            future_count,
            self.settings.safe_future_pub_count
        );
        if future_count >= self.settings.safe_future_pub_count {
            return Ok(CycleOutcome::Skipped {
                future_publications: future_count,
            });
        }

        let Some(source) = self.store.find_source(&self.settings.source_key).await? else {
            tracing::warn!("{}", AppError::SourceNotFound(self.settings.source_key.clone()));
            return Ok(CycleOutcome::NoSource);
        };

        let inspirations = self
            .fetcher
            .fetch_inspirations(
                source.feed_link.as_deref(),
                source.watermark(),
                self.settings.tokens_per_inspiration,
            )
            .await?;
        tracing::info!("Got {} inspirations from '{}'", inspirations.len(), source.key);

        // newest first, so the head is the new watermark
        let Some(newest) = inspirations.first().map(|i| i.iso_date) else {
            return Ok(CycleOutcome::NoInspiration);
        };

        let known_keys = self.store.tag_keys().await?;
        tracing::info!("Generating ideas, this can take a few minutes");
        let drafts = self.generate_drafts(&inspirations, &known_keys).await;
        tracing::info!("Generated {} ideas", drafts.len());

        let known_keys: HashSet<String> = known_keys.into_iter().collect();
        let new_tags = tags::reconcile(&known_keys, &drafts);
        if !new_tags.is_empty() {
            tracing::info!("Adding {} new tags", new_tags.len());
            self.store.insert_tags(new_tags).await?;
        }

        self.store.advance_watermark(&source.key, newest).await?;

        if drafts.is_empty() {
            return Ok(CycleOutcome::NoIdeas);
        }

        let anchor = if future_count > 0 {
            self.store.furthest_publication(now).await?.unwrap_or(now)
        } else {
            now
        };
        tracing::info!("Scheduling from {}", anchor);

        let ideas = scheduler::schedule(anchor, drafts);
        let inserted = self.store.insert_ideas(ideas).await?;
        tracing::info!("Inserted {} ideas", inserted);

        Ok(CycleOutcome::Inserted(inserted))
    }

    async fn generate_drafts(
        &self,
        inspirations: &[Inspiration],
        known_keys: &[String],
    ) -> Vec<DraftIdea> {
        let jobs = inspirations.iter().map(|inspiration| async move {
            let ideas = self.generator.generate(&inspiration.content, known_keys).await?;
            Ok::<_, AppError>(
                ideas
                    .into_iter()
                    .map(|idea| DraftIdea::from_generated(idea, &inspiration.link, &inspiration.content))
                    .collect::<Vec<_>>(),
            )
        });

        let settled = gather_settled(jobs, self.settings.generation_concurrency).await;

        for (index, e) in &settled.failed {
            tracing::warn!(
                "Dropping inspiration {}: {}",
                inspirations[*index].link,
                e
            );
        }

        settled.succeeded.into_iter().flatten().collect()
    }
}

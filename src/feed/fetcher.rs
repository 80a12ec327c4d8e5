use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::feed::chunker::first_chunk;
use crate::models::Inspiration;

const TEXT_WIDTH: usize = 1000;

/// Where inspirations come from.
#[async_trait]
pub trait InspirationSource: Send + Sync {
    /// Items strictly newer than `from_date`, newest first, each trimmed to
    /// about `token_budget` tokens. A missing feed link yields nothing.
    async fn fetch_inspirations(
        &self,
        feed_link: Option<&str>,
        from_date: Option<DateTime<Utc>>,
        token_budget: usize,
    ) -> Result<Vec<Inspiration>>;
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("idea-forge/1.0")
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<Feed> {
        let url = Url::parse(url)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;
        Ok(feed)
    }
}

#[async_trait]
impl InspirationSource for FeedFetcher {
    async fn fetch_inspirations(
        &self,
        feed_link: Option<&str>,
        from_date: Option<DateTime<Utc>>,
        token_budget: usize,
    ) -> Result<Vec<Inspiration>> {
        let Some(feed_link) = feed_link.filter(|l| !l.trim().is_empty()) else {
            tracing::debug!("Source has no feed link");
            return Ok(Vec::new());
        };

        let feed = self.fetch_feed(feed_link).await?;
        tracing::debug!("Fetched {} entries from {}", feed.entries.len(), feed_link);

        Ok(collect_inspirations(feed, from_date, token_budget))
    }
}

/// Turn parsed feed entries into inspirations.
///
/// Entries without a publication date are skipped. With no watermark every
/// dated entry qualifies.
pub fn collect_inspirations(
    feed: Feed,
    from_date: Option<DateTime<Utc>>,
    token_budget: usize,
) -> Vec<Inspiration> {
    let mut inspirations: Vec<Inspiration> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let iso_date = entry.published.or(entry.updated)?;
            if from_date.is_some_and(|from| iso_date <= from) {
                return None;
            }

            // Try content first, then fall back to summary
            let content_html = entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_ref())
                .or_else(|| entry.summary.as_ref().map(|s| &s.content));

            let content_text = content_html
                .and_then(|html| {
                    // no link footnotes
                    html2text::config::plain_no_decorate()
                        .string_from_read(html.as_bytes(), TEXT_WIDTH)
                        .ok()
                })
                .unwrap_or_default();

            Some(Inspiration {
                content: first_chunk(&content_text, token_budget),
                link: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                iso_date,
            })
        })
        .collect();

    inspirations.sort_by(|a, b| b.iso_date.cmp(&a.iso_date));
    inspirations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Startups</title>
    <link>https://news.test</link>
    <description>news</description>
    <item>
      <title>Older</title>
      <link>https://news.test/older</link>
      <description>Old &lt;b&gt;news&lt;/b&gt; item</description>
      <pubDate>Sun, 31 Dec 2023 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Middle</title>
      <link>https://news.test/middle</link>
      <description>Payments startup raises a round</description>
      <pubDate>Tue, 02 Jan 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Newest</title>
      <link>https://news.test/newest</link>
      <description>&lt;p&gt;Robots &lt;em&gt;everywhere&lt;/em&gt;&lt;/p&gt;</description>
      <pubDate>Wed, 03 Jan 2024 12:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://news.test/undated</link>
      <description>no date here</description>
    </item>
  </channel>
</rss>"#;

    fn feed() -> Feed {
        parser::parse(RSS.as_bytes()).unwrap()
    }

    #[test]
    fn keeps_only_items_newer_than_watermark_newest_first() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let items = collect_inspirations(feed(), Some(from), 1000);

        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://news.test/newest", "https://news.test/middle"]
        );
        assert_eq!(
            items[0].iso_date,
            Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn watermark_boundary_is_exclusive() {
        let from = Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap();
        assert!(collect_inspirations(feed(), Some(from), 1000).is_empty());
    }

    #[test]
    fn no_watermark_takes_every_dated_item() {
        let items = collect_inspirations(feed(), None, 1000);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.link.ends_with("undated")));
    }

    #[test]
    fn html_is_flattened_and_trimmed_to_budget() {
        let items = collect_inspirations(feed(), None, 1000);
        assert!(items[0].content.contains("Robots"));
        assert!(!items[0].content.contains("<p>"));

        let short = collect_inspirations(feed(), None, 4);
        assert_eq!(short[1].content, "Payments startup");
    }

    #[test]
    fn link_targets_stay_out_of_the_excerpt() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Startups</title>
    <link>https://news.test</link>
    <description>news</description>
    <item>
      <title>Linked</title>
      <link>https://news.test/linked</link>
      <description><![CDATA[<p>Read the <a href="https://tracker.test/full-story">full story</a> today</p>]]></description>
      <pubDate>Tue, 02 Jan 2024 08:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;
        let feed = parser::parse(rss.as_bytes()).unwrap();
        let items = collect_inspirations(feed, None, 1000);

        assert_eq!(items.len(), 1);
        assert!(items[0].content.contains("full story"));
        assert!(!items[0].content.contains("tracker.test"));
        assert!(!items[0].content.contains("[1]"));
    }

    #[tokio::test]
    async fn missing_feed_link_yields_nothing() {
        let fetcher = FeedFetcher::new().unwrap();
        let items = fetcher.fetch_inspirations(None, None, 100).await.unwrap();
        assert!(items.is_empty());
        let items = fetcher.fetch_inspirations(Some("  "), None, 100).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn malformed_feed_link_is_an_error() {
        let fetcher = FeedFetcher::new().unwrap();
        tokio_test::assert_err!(fetcher.fetch_inspirations(Some("not a url"), None, 100).await);
    }
}

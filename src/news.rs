//! # news — headline feed for the dashboard sidebar
//!
//! `NEWS_URL` may point at an RSS or Atom feed, or at a JSON aggregator of
//! the shape
//!
//! ```json
//! { "Data": [ { "title": "...", "url": "https://...", "published_on": 1767225600 } ] }
//! ```
//!
//! The body decides which parser runs. The feed is decoration: every failure
//! yields an empty list and a `warn!`, nothing here can fail a dashboard
//! refresh.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::NewsConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title:     String,
    pub link:      String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(rename = "Data", default)]
    data: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title:        String,
    url:          String,
    published_on: Option<i64>,
}

/// First `count` headlines; empty when the feed is disabled or failing.
pub async fn fetch_headlines(client: &reqwest::Client, config: &NewsConfig) -> Vec<NewsItem> {
    let Some(url) = &config.url else {
        debug!("NEWS_URL not set, news feed disabled");
        return Vec::new();
    };

    match fetch_feed(client, url).await {
        Ok(body) => match parse_feed(&body, config.count) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "news feed returned an unreadable body");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(error = %e, url = %url, "news feed unreachable");
            Vec::new()
        }
    }
}

async fn fetch_feed(client: &reqwest::Client, url: &str) -> reqwest::Result<String> {
    client
        .get(url)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("unreadable JSON feed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unreadable RSS/Atom feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
}

/// First `count` headlines of an RSS, Atom or JSON body.
pub fn parse_feed(body: &str, count: usize) -> Result<Vec<NewsItem>, NewsError> {
    if body.trim_start().starts_with('{') {
        parse_json(body, count)
    } else {
        parse_xml(body, count)
    }
}

fn parse_json(body: &str, count: usize) -> Result<Vec<NewsItem>, NewsError> {
    let feed: FeedResponse = serde_json::from_str(body)?;
    Ok(feed
        .data
        .into_iter()
        .take(count)
        .map(|entry| NewsItem {
            title:     entry.title,
            link:      entry.url,
            published: entry.published_on.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
        .collect())
}

fn parse_xml(body: &str, count: usize) -> Result<Vec<NewsItem>, NewsError> {
    let feed = feed_rs::parser::parse(body.as_bytes())?;
    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title?.content.trim().to_string();
            Some(NewsItem {
                title,
                link:      entry.links.into_iter().next().map(|l| l.href).unwrap_or_default(),
                published: entry.published.or(entry.updated),
            })
        })
        .take(count)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "Type": 100,
        "Data": [
            { "id": "1", "title": "SOL reclaims 135", "url": "https://news.example/1", "published_on": 1767225600, "source": "x" },
            { "id": "2", "title": "BTC ranges",       "url": "https://news.example/2", "published_on": 1767229200 },
            { "id": "3", "title": "Fees climb",       "url": "https://news.example/3" }
        ]
    }"#;

    #[test]
    fn keeps_only_the_first_count_items() {
        let items = parse_feed(FEED, 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "SOL reclaims 135");
        assert_eq!(items[0].link, "https://news.example/1");
        assert_eq!(items[0].published.unwrap().timestamp(), 1_767_225_600);
    }

    #[test]
    fn missing_timestamp_is_none() {
        let items = parse_feed(FEED, 10).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[2].published.is_none());
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
          <channel>
            <title>Crypto Desk</title>
            <link>https://news.example</link>
            <description>Markets</description>
            <item>
              <title>SOL reclaims 135</title>
              <link>https://news.example/1</link>
              <pubDate>Thu, 01 Jan 2026 00:00:00 GMT</pubDate>
            </item>
            <item>
              <title>BTC ranges</title>
              <link>https://news.example/2</link>
            </item>
            <item>
              <title>Fees climb</title>
              <link>https://news.example/3</link>
            </item>
          </channel>
        </rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
          <title>Crypto Desk</title>
          <id>urn:uuid:60a76c80-d399-11d9-b93c-0003939e0af6</id>
          <updated>2026-01-01T00:00:00Z</updated>
          <entry>
            <title>Liquidity deepens</title>
            <link href="https://news.example/atom/1"/>
            <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
            <updated>2026-01-01T01:00:00Z</updated>
          </entry>
        </feed>"#;

    #[test]
    fn reads_rss_items() {
        let items = parse_feed(RSS, 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "SOL reclaims 135");
        assert_eq!(items[0].link, "https://news.example/1");
        assert_eq!(items[0].published.unwrap().timestamp(), 1_767_225_600);
        assert!(items[1].published.is_none());
    }

    #[test]
    fn reads_atom_entries() {
        let items = parse_feed(ATOM, 5).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Liquidity deepens");
        assert_eq!(items[0].link, "https://news.example/atom/1");
        assert_eq!(items[0].published.unwrap().timestamp(), 1_767_229_200);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(parse_feed("{ not json", 5), Err(NewsError::Json(_))));
        assert!(matches!(parse_feed("<html><body>nope</body></html>", 5), Err(NewsError::Feed(_))));
    }

    #[tokio::test]
    async fn disabled_feed_is_empty() {
        let config = NewsConfig { url: None, count: 5 };
        assert!(fetch_headlines(&reqwest::Client::new(), &config).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_feed_is_empty() {
        let config = NewsConfig { url: Some("http://127.0.0.1:9/news".into()), count: 5 };
        assert!(fetch_headlines(&reqwest::Client::new(), &config).await.is_empty());
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{Article, Brief};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store an article, replacing any previous copy with the same URL.
    /// Returns the article identifier.
    async fn store_article(&self, article: &Article) -> Result<i64>;

    /// Articles of `profile` published within the last `lookback_hours` that
    /// carry both a summary and an embedding, ordered by impact rating
    /// (unrated last) and then by recency.
    async fn fetch_eligible_articles(&self, profile: &str, lookback_hours: u32) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait BriefingStorage: ArticleStorage {
    /// Persist a brief in a single write and return its identifier.
    async fn persist_brief(&self, content: &str, article_ids: &[i64], profile: &str) -> Result<i64>;

    async fn get_brief(&self, id: i64) -> Result<Option<Brief>>;

    /// Most recent briefs of a profile, newest first.
    async fn recent_briefings(&self, profile: &str, limit: usize) -> Result<Vec<Brief>>;

    /// Briefs of a profile created at or after `since`, newest first.
    async fn briefings_since(&self, profile: &str, since: DateTime<Utc>) -> Result<Vec<Brief>>;
}

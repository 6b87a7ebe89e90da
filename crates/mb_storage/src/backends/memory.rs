use std::cmp::Ordering;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::{Article, ArticleStorage, Brief, BriefingStorage, Result};
use tokio::sync::RwLock;
use crate::StorageBackend;
use super::window_start;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    briefs: Vec<Brief>,
    next_article_id: i64,
    next_brief_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_article_id: 1,
            next_brief_id: 1,
            ..Self::default()
        }
    }

    pub fn store_article(&mut self, article: &Article) -> i64 {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.url == article.url) {
            let id = existing.id;
            *existing = Article { id, ..article.clone() };
            return id;
        }
        let id = self.next_article_id;
        self.next_article_id += 1;
        self.articles.push(Article { id, ..article.clone() });
        id
    }

    pub fn eligible_articles(&self, profile: &str, lookback_hours: u32, now: DateTime<Utc>) -> Vec<Article> {
        let since = window_start(now, lookback_hours);
        let mut articles: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| a.profile == profile)
            .filter(|a| a.summary.is_some() && a.has_embedding())
            .filter(|a| a.published_at >= since && a.published_at <= now)
            .cloned()
            .collect();
        articles.sort_by(rank_for_briefing);
        articles
    }

    pub fn persist_brief(&mut self, content: &str, article_ids: &[i64], profile: &str) -> i64 {
        let id = self.next_brief_id;
        self.next_brief_id += 1;
        self.briefs.push(Brief {
            id,
            profile: profile.to_string(),
            content: content.to_string(),
            article_ids: article_ids.to_vec(),
            created_at: Utc::now(),
        });
        id
    }

    fn briefs_newest_first<'a>(&'a self, profile: &'a str) -> impl Iterator<Item = &'a Brief> + 'a {
        // Briefs are appended in creation order.
        self.briefs.iter().rev().filter(move |b| b.profile == profile)
    }
}

/// Impact rating descending with unrated articles last, then newest first.
fn rank_for_briefing(a: &Article, b: &Article) -> Ordering {
    match (a.impact_rating, b.impact_rating) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.published_at.cmp(&a.published_at))
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> {
        Ok(MemoryStorage::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn store_article(&self, article: &Article) -> Result<i64> {
        let mut store = self.store.write().await;
        Ok(store.store_article(article))
    }

    async fn fetch_eligible_articles(&self, profile: &str, lookback_hours: u32) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.eligible_articles(profile, lookback_hours, Utc::now()))
    }
}

#[async_trait]
impl BriefingStorage for MemoryStorage {
    async fn persist_brief(&self, content: &str, article_ids: &[i64], profile: &str) -> Result<i64> {
        let mut store = self.store.write().await;
        Ok(store.persist_brief(content, article_ids, profile))
    }

    async fn get_brief(&self, id: i64) -> Result<Option<Brief>> {
        let store = self.store.read().await;
        Ok(store.briefs.iter().find(|b| b.id == id).cloned())
    }

    async fn recent_briefings(&self, profile: &str, limit: usize) -> Result<Vec<Brief>> {
        let store = self.store.read().await;
        Ok(store.briefs_newest_first(profile).take(limit).cloned().collect())
    }

    async fn briefings_since(&self, profile: &str, since: DateTime<Utc>) -> Result<Vec<Brief>> {
        let store = self.store.read().await;
        Ok(store
            .briefs_newest_first(profile)
            .filter(|b| b.created_at >= since)
            .cloned()
            .collect())
    }
}

// Shared doubles for the pipeline integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mb_briefing::clustering::{ClusterError, KMeans, VectorPartitioner};
use mb_core::{Article, ArticleStorage, Brief, BriefingStorage, ChatModel, Error, Result};
use tokio::time::Instant;

pub fn article(id: i64, embedding: Option<Vec<f32>>, impact: Option<i32>) -> Article {
    Article {
        id,
        url: format!("https://news.example.com/{}", id),
        title: format!("Headline {}", id),
        source: "example".to_string(),
        published_at: Utc::now() - Duration::minutes(id),
        summary: Some(format!("summary {}", id)),
        embedding,
        impact_rating: impact,
        profile: "default".to_string(),
    }
}

/// `n` articles with ids `1..=n`, embedded on a line so k-means has something to split.
pub fn embedded_articles(n: usize) -> Vec<Article> {
    (1..=n as i64)
        .map(|id| article(id, Some(vec![id as f32, (id % 3) as f32]), None))
        .collect()
}

/// Chat model answering analysis and synthesis prompts from a script.
/// `None` makes that kind of call fail.
pub struct ScriptedChat {
    analysis: Option<String>,
    synthesis: Option<String>,
    calls: Mutex<Vec<(Instant, Instant, String)>>,
}

impl ScriptedChat {
    pub fn new(analysis: Option<&str>, synthesis: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            analysis: analysis.map(str::to_string),
            synthesis: synthesis.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn working() -> Arc<Self> {
        Self::new(Some("A coherent story about one event."), Some("## Daily Brief\n\nAll quiet."))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, _, p)| p.clone()).collect()
    }

    pub fn timings(&self) -> Vec<(Instant, Instant)> {
        self.calls.lock().unwrap().iter().map(|(s, e, _)| (*s, *e)).collect()
    }

    pub fn synthesis_prompt(&self) -> Option<String> {
        self.prompts().into_iter().find(|p| is_final_prompt(p))
    }

    pub fn analysis_prompts(&self) -> Vec<String> {
        self.prompts().into_iter().filter(|p| !is_final_prompt(p)).collect()
    }
}

fn is_final_prompt(prompt: &str) -> bool {
    prompt.contains("--- Cluster ") || prompt.contains("**")
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        self.calls
            .lock()
            .unwrap()
            .push((started, Instant::now(), prompt.to_string()));

        let reply = if is_final_prompt(prompt) { &self.synthesis } else { &self.analysis };
        reply
            .clone()
            .ok_or_else(|| Error::Inference("scripted failure".to_string()))
    }
}

pub enum Partition {
    KMeans,
    Fixed(Vec<usize>),
    Fail,
}

/// Records every `k` it is asked for.
pub struct RecordingPartitioner {
    behaviour: Partition,
    ks: Mutex<Vec<usize>>,
}

impl RecordingPartitioner {
    pub fn new(behaviour: Partition) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            ks: Mutex::new(Vec::new()),
        })
    }

    pub fn ks(&self) -> Vec<usize> {
        self.ks.lock().unwrap().clone()
    }
}

impl VectorPartitioner for RecordingPartitioner {
    fn partition(&self, vectors: &[Vec<f32>], k: usize) -> std::result::Result<Vec<usize>, ClusterError> {
        self.ks.lock().unwrap().push(k);
        match &self.behaviour {
            Partition::KMeans => KMeans::default().partition(vectors, k),
            Partition::Fixed(labels) => Ok(labels.clone()),
            Partition::Fail => Err(ClusterError::Failed("did not converge".to_string())),
        }
    }
}

/// Store returning a fixed article list, whatever the query.
pub struct FixedStore {
    articles: Vec<Article>,
    fail_persist: bool,
    briefs: Mutex<Vec<Brief>>,
}

impl FixedStore {
    pub fn new(articles: Vec<Article>) -> Arc<Self> {
        Arc::new(Self {
            articles,
            fail_persist: false,
            briefs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_persist(articles: Vec<Article>) -> Arc<Self> {
        Arc::new(Self {
            articles,
            fail_persist: true,
            briefs: Mutex::new(Vec::new()),
        })
    }

    pub fn persisted(&self) -> Vec<Brief> {
        self.briefs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleStorage for FixedStore {
    async fn store_article(&self, article: &Article) -> Result<i64> {
        Ok(article.id)
    }

    async fn fetch_eligible_articles(&self, _profile: &str, _lookback_hours: u32) -> Result<Vec<Article>> {
        Ok(self.articles.clone())
    }
}

#[async_trait]
impl BriefingStorage for FixedStore {
    async fn persist_brief(&self, content: &str, article_ids: &[i64], profile: &str) -> Result<i64> {
        if self.fail_persist {
            return Err(Error::Database("database is locked".to_string()));
        }
        let mut briefs = self.briefs.lock().unwrap();
        let id = briefs.len() as i64 + 1;
        briefs.push(Brief {
            id,
            profile: profile.to_string(),
            content: content.to_string(),
            article_ids: article_ids.to_vec(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get_brief(&self, id: i64) -> Result<Option<Brief>> {
        Ok(self.briefs.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn recent_briefings(&self, profile: &str, limit: usize) -> Result<Vec<Brief>> {
        let briefs = self.briefs.lock().unwrap();
        Ok(briefs.iter().rev().filter(|b| b.profile == profile).take(limit).cloned().collect())
    }

    async fn briefings_since(&self, profile: &str, since: DateTime<Utc>) -> Result<Vec<Brief>> {
        let briefs = self.briefs.lock().unwrap();
        Ok(briefs
            .iter()
            .rev()
            .filter(|b| b.profile == profile && b.created_at >= since)
            .cloned()
            .collect())
    }
}

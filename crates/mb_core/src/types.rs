use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A processed article as the briefing pipeline sees it.
///
/// `summary` and `embedding` are filled in by the processing stage; an article
/// missing either one is not eligible for briefing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub impact_rating: Option<i32>,
    pub profile: String,
}

impl Article {
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().map_or(false, |e| !e.is_empty())
    }

    /// Summary text used in prompts, empty when the article was never processed.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }
}

/// A persisted briefing document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    pub id: i64,
    pub profile: String,
    pub content: String,
    pub article_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingSummary {
    pub id: i64,
    pub content: String,
    pub article_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Brief> for BriefingSummary {
    fn from(brief: Brief) -> Self {
        Self {
            id: brief.id,
            article_count: brief.article_ids.len(),
            content: brief.content,
            created_at: brief.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingsPerDay {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingTrends {
    pub total_briefings: usize,
    pub avg_articles_per_brief: f64,
    pub briefings_per_day: Vec<BriefingsPerDay>,
}

use std::cmp::Reverse;
use std::sync::Arc;
use chrono::Utc;
use mb_core::config::{BriefOptions, BriefingConfig};
use mb_core::logging::Logger;
use mb_core::profiles::ProfileRegistry;
use mb_core::{Article, BriefingStorage, BriefingSummary, BriefingTrends, ChatModel};
use mb_inference::pacing::PacedChatModel;
use serde::Serialize;
use crate::analyzer::ClusterAnalyzer;
use crate::clustering::{effective_k, scatter, single_group, SimilarityClusterer, VectorPartitioner};
use crate::error::BriefError;
use crate::history::{compute_trends, trends_cutoff};
use crate::synthesizer::{rank_by_size, BriefSynthesizer};

pub const DEFAULT_SIMPLE_BRIEF_ARTICLES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefStats {
    pub articles_analyzed: usize,
    pub clusters_generated: usize,
    pub clusters_used: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBrief {
    pub briefing_id: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BriefStats>,
}

/// Outcome of a run in the flat shape printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct BriefResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub briefing_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BriefStats>,
}

impl From<Result<GeneratedBrief, BriefError>> for BriefResult {
    fn from(result: Result<GeneratedBrief, BriefError>) -> Self {
        match result {
            Ok(brief) => Self {
                success: true,
                briefing_id: Some(brief.briefing_id),
                content: Some(brief.content),
                error: None,
                stats: brief.stats,
            },
            Err(e) => Self {
                success: false,
                briefing_id: None,
                content: None,
                error: Some(e.to_string()),
                stats: None,
            },
        }
    }
}

pub struct BriefingPipeline {
    store: Arc<dyn BriefingStorage>,
    chat: Arc<dyn ChatModel>,
    clusterer: SimilarityClusterer,
    config: BriefingConfig,
    profiles: ProfileRegistry,
}

impl BriefingPipeline {
    /// Every chat call made by the pipeline goes through a pacing wrapper
    /// honouring `config.llm_interval_ms`.
    pub fn new(
        store: Arc<dyn BriefingStorage>,
        chat: Arc<dyn ChatModel>,
        config: BriefingConfig,
        profiles: ProfileRegistry,
    ) -> Self {
        let chat: Arc<dyn ChatModel> = Arc::new(PacedChatModel::new(chat, config.llm_interval()));
        Self {
            store,
            chat,
            clusterer: SimilarityClusterer::default(),
            config,
            profiles,
        }
    }

    pub fn with_partitioner(mut self, partitioner: Arc<dyn VectorPartitioner>) -> Self {
        self.clusterer = SimilarityClusterer::new(partitioner);
        self
    }

    pub fn config(&self) -> &BriefingConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Clusters the profile's recent articles, has each cluster analyzed and
    /// synthesizes the analyses into one persisted brief.
    pub async fn generate_brief(&self, profile: &str, options: &BriefOptions) -> Result<GeneratedBrief, BriefError> {
        let settings = self.config.resolve(&self.profiles, profile, options);
        let logger = Logger::new().with_prefix(format!("[{}]", profile));

        logger.info(&format!(
            "📰 Generating brief (last {}h, min {} articles, up to {} clusters)",
            settings.lookback_hours, settings.min_articles, settings.n_clusters
        ));

        let articles = self
            .store
            .fetch_eligible_articles(profile, settings.lookback_hours)
            .await?;
        if articles.len() < settings.min_articles {
            return Err(BriefError::NotEnoughArticles {
                found: articles.len(),
                profile: profile.to_string(),
                required: settings.min_articles,
            });
        }

        let embedded: Vec<&Article> = articles.iter().filter(|a| a.has_embedding()).collect();
        if embedded.len() < articles.len() {
            logger.warn(&format!(
                "⚠️ {} articles have no embedding and are left out",
                articles.len() - embedded.len()
            ));
        }
        if embedded.len() < settings.min_articles {
            return Err(BriefError::NotEnoughEmbedded {
                found: embedded.len(),
                required: settings.min_articles,
            });
        }

        let clusters = effective_k(embedded.len(), settings.n_clusters);
        if clusters < 2 {
            return Err(BriefError::TooFewClusters);
        }

        let vectors: Vec<Vec<f32>> = embedded
            .iter()
            .map(|a| a.embedding.clone().unwrap_or_default())
            .collect();
        let labels = match self.clusterer.try_assign(&vectors, settings.n_clusters) {
            Ok(labels) => labels,
            Err(e) => {
                logger.warn(&format!("⚠️ Clustering failed, using a single cluster: {}", e));
                single_group(embedded.len())
            }
        };
        logger.info(&format!("🧩 Grouped {} articles into {} clusters", embedded.len(), clusters));

        let analyzer = ClusterAnalyzer::new(self.chat.as_ref(), settings.max_summaries_per_cluster);
        let mut analyses = Vec::new();
        for (index, group) in scatter(embedded.iter().copied(), &labels, clusters).into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            if let Some(analysis) = analyzer
                .analyze(group, profile, index, &settings.cluster_analysis_prompt, &logger)
                .await
            {
                analyses.push(analysis);
            }
        }

        if analyses.is_empty() {
            logger.error("❌ No cluster produced a usable analysis");
            return Err(BriefError::NoClusters);
        }
        rank_by_size(&mut analyses);

        let content = BriefSynthesizer::new(self.chat.as_ref())
            .synthesize(
                &analyses,
                profile,
                &settings.brief_synthesis_prompt,
                settings.max_clusters_in_synthesis,
                &logger,
            )
            .await
            .ok_or(BriefError::SynthesisFailed)?;

        let article_ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let briefing_id = self.store.persist_brief(&content, &article_ids, profile).await?;
        logger.info(&format!("💾 Saved brief {} ({} articles)", briefing_id, article_ids.len()));

        Ok(GeneratedBrief {
            briefing_id,
            content,
            stats: Some(BriefStats {
                articles_analyzed: embedded.len(),
                clusters_generated: clusters,
                clusters_used: analyses.len(),
            }),
        })
    }

    /// Single-prompt brief over the highest-impact recent articles.
    /// A `max_articles` of zero means the default of ten.
    pub async fn generate_simple_brief(&self, profile: &str, max_articles: usize) -> Result<GeneratedBrief, BriefError> {
        let settings = self.config.resolve(&self.profiles, profile, &BriefOptions::default());
        let logger = Logger::new().with_prefix(format!("[{}]", profile));
        let max_articles = if max_articles == 0 { DEFAULT_SIMPLE_BRIEF_ARTICLES } else { max_articles };

        let articles = self
            .store
            .fetch_eligible_articles(profile, settings.lookback_hours)
            .await?;
        if articles.is_empty() {
            return Err(BriefError::NoArticles);
        }

        let mut selected: Vec<&Article> = articles.iter().collect();
        selected.sort_by_key(|a| Reverse(a.impact_rating.unwrap_or(0)));
        selected.truncate(max_articles);

        let content = BriefSynthesizer::new(self.chat.as_ref())
            .simple(&selected, profile, &logger)
            .await
            .ok_or(BriefError::ContentGenerationFailed)?;

        let article_ids: Vec<i64> = selected.iter().map(|a| a.id).collect();
        let briefing_id = self.store.persist_brief(&content, &article_ids, profile).await?;
        logger.info(&format!("💾 Saved simple brief {} ({} articles)", briefing_id, article_ids.len()));

        Ok(GeneratedBrief {
            briefing_id,
            content,
            stats: None,
        })
    }

    pub async fn recent_briefings(&self, profile: &str, limit: usize) -> mb_core::Result<Vec<BriefingSummary>> {
        let briefs = self.store.recent_briefings(profile, limit).await?;
        Ok(briefs.into_iter().map(BriefingSummary::from).collect())
    }

    pub async fn briefing_trends(&self, profile: &str, days: u32) -> mb_core::Result<BriefingTrends> {
        let now = Utc::now();
        let briefs = self
            .store
            .briefings_since(profile, trends_cutoff(now, days))
            .await?;
        Ok(compute_trends(&briefs, days, now))
    }
}

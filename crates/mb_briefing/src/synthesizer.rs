use mb_core::config::{format_prompt, SIMPLE_BRIEF_PROMPT};
use mb_core::logging::Logger;
use mb_core::{Article, ChatModel};
use crate::analyzer::ClusterAnalysis;

/// Largest clusters first; equal sizes keep their analysis order.
pub fn rank_by_size(analyses: &mut [ClusterAnalysis<'_>]) {
    analyses.sort_by(|a, b| b.size.cmp(&a.size));
}

pub fn cluster_analyses_text(analyses: &[ClusterAnalysis<'_>], limit: usize) -> String {
    analyses
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, cluster)| {
            format!(
                "--- Cluster {} ({} articles) ---\nAnalysis: {}\n",
                i + 1,
                cluster.size,
                cluster.analysis
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered article list for the single-prompt brief.
pub fn article_summaries_text(articles: &[&Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let impact = article
                .impact_rating
                .filter(|rating| *rating != 0)
                .map_or_else(|| "N/A".to_string(), |rating| rating.to_string());
            format!(
                "{}. **{}** (Impact: {})\n   {}\n",
                i + 1,
                article.title,
                impact,
                article.summary_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct BriefSynthesizer<'m> {
    chat: &'m dyn ChatModel,
}

impl<'m> BriefSynthesizer<'m> {
    pub fn new(chat: &'m dyn ChatModel) -> Self {
        Self { chat }
    }

    /// Turns ranked cluster analyses into the final brief.
    pub async fn synthesize(
        &self,
        analyses: &[ClusterAnalysis<'_>],
        profile: &str,
        template: &str,
        limit: usize,
        logger: &Logger,
    ) -> Option<String> {
        let prompt = format_prompt(
            template,
            &[
                ("feed_profile", profile),
                ("cluster_analyses_text", &cluster_analyses_text(analyses, limit)),
            ],
        );

        logger.info(&format!("✍️ Synthesizing brief from {} clusters", analyses.len().min(limit)));
        self.ask(&prompt, logger).await
    }

    /// One prompt over the top articles, no clustering involved.
    pub async fn simple(&self, articles: &[&Article], profile: &str, logger: &Logger) -> Option<String> {
        let prompt = format_prompt(
            SIMPLE_BRIEF_PROMPT,
            &[
                ("feed_profile", profile),
                ("article_summaries_text", &article_summaries_text(articles)),
            ],
        );

        logger.info(&format!("✍️ Writing simple brief from {} articles", articles.len()));
        self.ask(&prompt, logger).await
    }

    async fn ask(&self, prompt: &str, logger: &Logger) -> Option<String> {
        match self.chat.complete(prompt).await {
            Ok(content) if !content.trim().is_empty() => Some(content.trim().to_string()),
            Ok(_) => {
                logger.warn("⚠️ Model returned an empty brief");
                None
            }
            Err(e) => {
                logger.error(&format!("❌ Brief generation failed: {}", e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn analysis(size: usize, text: &str) -> ClusterAnalysis<'static> {
        ClusterAnalysis {
            topic: format!("Cluster {}", size),
            analysis: text.to_string(),
            size,
            articles: Vec::new(),
        }
    }

    #[test]
    fn test_rank_is_stable() {
        let mut analyses = vec![analysis(2, "a"), analysis(5, "b"), analysis(2, "c"), analysis(5, "d")];
        rank_by_size(&mut analyses);
        let order: Vec<&str> = analyses.iter().map(|a| a.analysis.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_analyses_text_is_limited() {
        let analyses: Vec<_> = (0..7).map(|i| analysis(10 - i, &format!("topic {}", i))).collect();
        let text = cluster_analyses_text(&analyses, 5);
        assert!(text.starts_with("--- Cluster 1 (10 articles) ---\nAnalysis: topic 0\n\n--- Cluster 2 (9 articles) ---"));
        assert!(text.contains("--- Cluster 5 (6 articles) ---"));
        assert!(!text.contains("Cluster 6"));
        assert!(!text.contains("topic 5"));
    }

    #[test]
    fn test_article_summaries_text() {
        let make = |title: &str, rating: Option<i32>| Article {
            id: 1,
            url: format!("https://example.com/{}", title),
            title: title.to_string(),
            source: "test".to_string(),
            published_at: Utc::now(),
            summary: Some(format!("{} happened", title)),
            embedding: None,
            impact_rating: rating,
            profile: "default".to_string(),
        };
        let rated = make("Rated", Some(8));
        let unrated = make("Unrated", None);

        let text = article_summaries_text(&[&rated, &unrated]);
        assert_eq!(
            text,
            "1. **Rated** (Impact: 8)\n   Rated happened\n\n2. **Unrated** (Impact: N/A)\n   Unrated happened\n"
        );
    }
}

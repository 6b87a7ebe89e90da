use mb_core::config::format_prompt;
use mb_core::logging::Logger;
use mb_core::{Article, ChatModel};

/// Language-model reading of one cluster.
#[derive(Debug, Clone)]
pub struct ClusterAnalysis<'a> {
    pub topic: String,
    pub analysis: String,
    /// Size of the whole cluster, not just the part shown to the model.
    pub size: usize,
    pub articles: Vec<&'a Article>,
}

/// Summary lines fed to the cluster prompt, one `- ` bullet per article.
pub fn cluster_summaries_text(articles: &[&Article]) -> String {
    articles
        .iter()
        .map(|article| format!("- {}", article.summary_text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A reply that calls a tiny cluster unrelated is noise.
pub fn is_degenerate(analysis: &str, cluster_size: usize) -> bool {
    cluster_size <= 2 && analysis.to_lowercase().contains("unrelated")
}

pub struct ClusterAnalyzer<'m> {
    chat: &'m dyn ChatModel,
    max_summaries: usize,
}

impl<'m> ClusterAnalyzer<'m> {
    pub fn new(chat: &'m dyn ChatModel, max_summaries: usize) -> Self {
        Self { chat, max_summaries }
    }

    /// Asks the model what `articles` have in common. A failed call, an empty
    /// reply or a degenerate one yields `None`.
    pub async fn analyze<'a>(
        &self,
        articles: Vec<&'a Article>,
        profile: &str,
        index: usize,
        template: &str,
        logger: &Logger,
    ) -> Option<ClusterAnalysis<'a>> {
        let size = articles.len();
        let shown = &articles[..size.min(self.max_summaries)];

        let prompt = format_prompt(
            template,
            &[
                ("feed_profile", profile),
                ("cluster_summaries_text", &cluster_summaries_text(shown)),
            ],
        );

        logger.info(&format!("🔍 Analyzing cluster {} ({} articles)", index + 1, size));

        let analysis = match self.chat.complete(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                logger.warn(&format!("⚠️ Empty analysis for cluster {}", index + 1));
                return None;
            }
            Err(e) => {
                logger.warn(&format!("⚠️ Analysis failed for cluster {}: {}", index + 1, e));
                return None;
            }
        };

        if is_degenerate(&analysis, size) {
            logger.debug(&format!("🗑️ Dropping cluster {}: unrelated articles", index + 1));
            return None;
        }

        Some(ClusterAnalysis {
            topic: format!("Cluster {}", index + 1),
            analysis,
            size,
            articles,
        })
    }
}

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::profiles::ProfileRegistry;
use crate::{Error, Result};

/// Upper bound on the summaries quoted in one cluster analysis prompt.
pub const MAX_SUMMARIES_PER_CLUSTER: usize = 10;
/// Upper bound on the cluster analyses fed to the synthesis prompt.
pub const MAX_CLUSTERS_IN_SYNTHESIS: usize = 5;

pub const DEFAULT_CLUSTER_ANALYSIS_PROMPT: &str = "
These are summaries of potentially related news articles from a '{feed_profile}' context:

{cluster_summaries_text}

What is the core event or topic discussed? Summarize the key developments and significance in 3-5 sentences based *only* on the provided text. If the articles seem unrelated, state that clearly.
";

pub const DEFAULT_BRIEF_SYNTHESIS_PROMPT: &str = "
You are an AI assistant writing a Presidential-style daily intelligence briefing using Markdown, specifically for the '{feed_profile}' category.
Synthesize the following analyzed news clusters into a coherent, high-level executive summary.
Start with the 2-3 most critical overarching themes globally or within this category based *only* on these inputs.
Then, provide concise bullet points summarizing key developments within the most significant clusters (roughly 3-5 clusters).
Maintain an objective, analytical tone relevant to the '{feed_profile}' context. Avoid speculation.

Analyzed News Clusters (Most significant first):
{cluster_analyses_text}
";

pub const SIMPLE_BRIEF_PROMPT: &str = "Create a concise briefing for the '{feed_profile}' profile based on these recent articles:

{article_summaries_text}

Format as a professional briefing with:
1. Executive Summary (2-3 key themes)
2. Key Developments (bullet points)
3. Analysis and Implications

Use Markdown formatting.";

/// Process-wide defaults for brief generation.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    pub default_profile: String,
    pub lookback_hours: u32,
    pub min_articles: usize,
    pub n_clusters: usize,
    pub max_summaries_per_cluster: usize,
    pub max_clusters_in_synthesis: usize,
    pub llm_interval_ms: u64,
    pub chat_model: String,
    pub embedding_model: String,
    pub cluster_analysis_prompt: String,
    pub brief_synthesis_prompt: String,
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            default_profile: "default".to_string(),
            lookback_hours: 24,
            min_articles: 5,
            n_clusters: 10,
            max_summaries_per_cluster: MAX_SUMMARIES_PER_CLUSTER,
            max_clusters_in_synthesis: MAX_CLUSTERS_IN_SYNTHESIS,
            llm_interval_ms: 1000,
            chat_model: "deepseek-chat".to_string(),
            embedding_model: "togethercomputer/m2-bert-80M-32k-retrieval".to_string(),
            cluster_analysis_prompt: DEFAULT_CLUSTER_ANALYSIS_PROMPT.to_string(),
            brief_synthesis_prompt: DEFAULT_BRIEF_SYNTHESIS_PROMPT.to_string(),
        }
    }
}

impl BriefingConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn llm_interval(&self) -> Duration {
        Duration::from_millis(self.llm_interval_ms)
    }

    /// Checks every setting and reports all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.lookback_hours == 0 {
            errors.push("lookback_hours must be positive".to_string());
        }
        if self.min_articles == 0 {
            errors.push("min_articles must be positive".to_string());
        }
        if self.n_clusters == 0 {
            errors.push("n_clusters must be positive".to_string());
        }
        for (key, value, max) in [
            ("max_summaries_per_cluster", self.max_summaries_per_cluster, MAX_SUMMARIES_PER_CLUSTER),
            ("max_clusters_in_synthesis", self.max_clusters_in_synthesis, MAX_CLUSTERS_IN_SYNTHESIS),
        ] {
            if value == 0 || value > max {
                errors.push(format!("{} must be between 1 and {}", key, max));
            }
        }
        if self.chat_model.trim().is_empty() {
            errors.push("chat_model cannot be empty".to_string());
        }
        if self.embedding_model.trim().is_empty() {
            errors.push("embedding_model cannot be empty".to_string());
        }
        if self.default_profile.trim().is_empty() {
            errors.push("default_profile cannot be empty".to_string());
        }
        for (key, prompt) in [
            ("cluster_analysis_prompt", &self.cluster_analysis_prompt),
            ("brief_synthesis_prompt", &self.brief_synthesis_prompt),
        ] {
            if prompt.trim().is_empty() {
                errors.push(format!("Prompt '{}' cannot be empty", key));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }

    /// Layers call-time options over the profile definition over these defaults.
    pub fn resolve(&self, profiles: &ProfileRegistry, profile: &str, options: &BriefOptions) -> ResolvedBriefing {
        let definition = profiles.get(profile);

        let lookback_hours = options
            .lookback_hours
            .filter(|h| *h > 0)
            .or_else(|| definition.and_then(|d| d.lookback_hours))
            .unwrap_or(self.lookback_hours);
        let min_articles = options
            .min_articles
            .filter(|m| *m > 0)
            .or_else(|| definition.and_then(|d| d.min_articles))
            .unwrap_or(self.min_articles);
        let n_clusters = options
            .n_clusters
            .filter(|n| *n > 0)
            .or_else(|| definition.and_then(|d| d.n_clusters))
            .unwrap_or(self.n_clusters);

        let cluster_analysis_prompt = non_empty(options.custom_prompts.cluster_analysis.as_deref())
            .or_else(|| definition.and_then(|d| non_empty(d.prompts.cluster_analysis.as_deref())))
            .unwrap_or(self.cluster_analysis_prompt.as_str())
            .to_string();
        let brief_synthesis_prompt = non_empty(options.custom_prompts.brief_synthesis.as_deref())
            .or_else(|| definition.and_then(|d| non_empty(d.prompts.brief_synthesis.as_deref())))
            .unwrap_or(self.brief_synthesis_prompt.as_str())
            .to_string();

        ResolvedBriefing {
            profile: profile.to_string(),
            lookback_hours,
            min_articles,
            n_clusters,
            max_summaries_per_cluster: self.max_summaries_per_cluster.clamp(1, MAX_SUMMARIES_PER_CLUSTER),
            max_clusters_in_synthesis: self.max_clusters_in_synthesis.clamp(1, MAX_CLUSTERS_IN_SYNTHESIS),
            cluster_analysis_prompt,
            brief_synthesis_prompt,
        }
    }
}

fn non_empty(template: Option<&str>) -> Option<&str> {
    template.filter(|t| !t.trim().is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomPrompts {
    pub cluster_analysis: Option<String>,
    pub brief_synthesis: Option<String>,
}

/// Per-call overrides for a single brief generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefOptions {
    pub lookback_hours: Option<u32>,
    pub min_articles: Option<usize>,
    pub n_clusters: Option<usize>,
    pub custom_prompts: CustomPrompts,
}

/// Effective settings of one run after all layers were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBriefing {
    pub profile: String,
    pub lookback_hours: u32,
    pub min_articles: usize,
    pub n_clusters: usize,
    pub max_summaries_per_cluster: usize,
    pub max_clusters_in_synthesis: usize,
    pub cluster_analysis_prompt: String,
    pub brief_synthesis_prompt: String,
}

/// Replaces every `{key}` in `template` with its value.
pub fn format_prompt(template: &str, variables: &[(&str, &str)]) -> String {
    variables.iter().fold(template.to_string(), |prompt, (key, value)| {
        prompt.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_prompt_replaces_every_occurrence() {
        let rendered = format_prompt(
            "{feed_profile} / {feed_profile}: {cluster_summaries_text} {unknown}",
            &[("feed_profile", "technology"), ("cluster_summaries_text", "- a")],
        );
        assert_eq!(rendered, "technology / technology: - a {unknown}");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BriefingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = BriefingConfig {
            min_articles: 0,
            n_clusters: 0,
            chat_model: " ".to_string(),
            brief_synthesis_prompt: String::new(),
            ..BriefingConfig::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("min_articles must be positive"));
        assert!(message.contains("n_clusters must be positive"));
        assert!(message.contains("chat_model cannot be empty"));
        assert!(message.contains("Prompt 'brief_synthesis_prompt' cannot be empty"));
    }

    #[test]
    fn test_options_override_profile_and_defaults() {
        let config = BriefingConfig::default();
        let profiles = ProfileRegistry::builtin();

        let resolved = config.resolve(&profiles, "technology", &BriefOptions::default());
        assert_eq!(resolved.lookback_hours, 24);
        assert_eq!(resolved.min_articles, 5);
        assert_eq!(resolved.n_clusters, 10);
        assert_ne!(resolved.brief_synthesis_prompt, config.brief_synthesis_prompt);
        assert_eq!(resolved.cluster_analysis_prompt, config.cluster_analysis_prompt);

        let options = BriefOptions {
            lookback_hours: Some(48),
            min_articles: Some(0),
            n_clusters: Some(4),
            custom_prompts: CustomPrompts {
                cluster_analysis: Some("custom {cluster_summaries_text}".to_string()),
                brief_synthesis: Some("   ".to_string()),
            },
        };
        let resolved = config.resolve(&profiles, "technology", &options);
        assert_eq!(resolved.lookback_hours, 48);
        assert_eq!(resolved.min_articles, 5);
        assert_eq!(resolved.n_clusters, 4);
        assert_eq!(resolved.cluster_analysis_prompt, "custom {cluster_summaries_text}");
        assert_eq!(
            resolved.brief_synthesis_prompt,
            profiles.get("technology").unwrap().prompts.brief_synthesis.clone().unwrap()
        );
    }

    #[test]
    fn test_unknown_profile_uses_global_defaults() {
        let config = BriefingConfig::default();
        let resolved = config.resolve(&ProfileRegistry::builtin(), "gardening", &BriefOptions::default());
        assert_eq!(resolved.profile, "gardening");
        assert_eq!(resolved.cluster_analysis_prompt, DEFAULT_CLUSTER_ANALYSIS_PROMPT);
        assert_eq!(resolved.brief_synthesis_prompt, DEFAULT_BRIEF_SYNTHESIS_PROMPT);
    }

    #[test]
    fn test_from_file_applies_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"n_clusters": 15, "llm_interval_ms": 250}}"#).unwrap();

        let config = BriefingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.n_clusters, 15);
        assert_eq!(config.llm_interval(), Duration::from_millis(250));
        assert_eq!(config.min_articles, 5);
    }

    #[test]
    fn test_from_file_rejects_raised_caps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_clusters_in_synthesis": 7, "max_summaries_per_cluster": 50}}"#).unwrap();

        let message = BriefingConfig::from_file(file.path()).unwrap_err().to_string();
        assert!(message.contains("max_summaries_per_cluster must be between 1 and 10"));
        assert!(message.contains("max_clusters_in_synthesis must be between 1 and 5"));
    }

    #[test]
    fn test_resolve_clamps_caps() {
        let config = BriefingConfig {
            max_summaries_per_cluster: 50,
            max_clusters_in_synthesis: 7,
            ..BriefingConfig::default()
        };
        let resolved = config.resolve(&ProfileRegistry::builtin(), "default", &BriefOptions::default());
        assert_eq!(resolved.max_summaries_per_cluster, MAX_SUMMARIES_PER_CLUSTER);
        assert_eq!(resolved.max_clusters_in_synthesis, MAX_CLUSTERS_IN_SYNTHESIS);

        let lower = BriefingConfig {
            max_clusters_in_synthesis: 3,
            ..BriefingConfig::default()
        };
        assert!(lower.validate().is_ok());
        let resolved = lower.resolve(&ProfileRegistry::builtin(), "default", &BriefOptions::default());
        assert_eq!(resolved.max_clusters_in_synthesis, 3);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lookback_hours": 0}}"#).unwrap();

        let err = BriefingConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

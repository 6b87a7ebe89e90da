use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

const TECHNOLOGY_BRIEF_SYNTHESIS_PROMPT: &str = "You are an AI assistant writing a daily intelligence briefing for a tech and politics youtuber using Markdown. The quality of this briefing is vital for the development of the channel. Synthesize the following analyzed news clusters into a coherent, high-level executive summary. Start with the 2-3 most critical overarching themes globally based *only* on these inputs. Then, provide concise bullet points summarizing key developments within the most significant clusters (roughly 7-10 clusters) and a paragraph summarizing connections and conclusions between the points. Maintain an objective, analytical tone. Avoid speculation.

Analyzed News Clusters (Most significant first):
{cluster_analyses_text}";

const BRASIL_CLUSTER_ANALYSIS_PROMPT: &str = "Estes são resumos de artigos de notícias potencialmente relacionados de um contexto '{feed_profile}':

{cluster_summaries_text}

Qual é o evento ou tópico principal discutido? Resuma os principais desenvolvimentos e a importância em 3 a 5 frases, com base *apenas* no texto fornecido. Se os artigos parecerem não relacionados, informe isso claramente.";

const BRASIL_BRIEF_SYNTHESIS_PROMPT: &str = "Você é um assistente de IA escrevendo um briefing diário de inteligência no estilo presidencial usando Markdown, especificamente para a categoria '{feed_profile}'.
Sintetize os seguintes grupos de notícias analisados em um resumo executivo coerente e de alto nível.

Comece com os 4 ou 5 temas abrangentes mais críticos em relação ao Brasil ou dentro desta categoria, com base *apenas* nestas informações.
Em seguida, forneça tópicos concisos resumindo os principais desenvolvimentos dentro dos grupos mais significativos (aproximadamente 5 a 7 grupos).
Mantenha um tom objetivo e analítico relevante para o contexto '{feed_profile}'. Evite especulações.

Grupos de Notícias Analisados (Mais significativos primeiro):
{cluster_analyses_text}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssFeed {
    pub url: String,
    pub name: String,
    pub category: Option<String>,
    pub enabled: bool,
}

impl RssFeed {
    fn new(url: &str, name: &str, category: &str) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            category: Some(category.to_string()),
            enabled: true,
        }
    }
}

/// Prompt templates a profile may override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePrompts {
    pub cluster_analysis: Option<String>,
    pub brief_synthesis: Option<String>,
}

/// A topical stream with its feeds and its overrides of the global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDefinition {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub feeds: Vec<RssFeed>,
    pub prompts: ProfilePrompts,
    pub lookback_hours: Option<u32>,
    pub min_articles: Option<usize>,
    pub n_clusters: Option<usize>,
}

impl ProfileDefinition {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            enabled: true,
            feeds: Vec::new(),
            prompts: ProfilePrompts::default(),
            lookback_hours: None,
            min_articles: None,
            n_clusters: None,
        }
    }

    pub fn with_feeds(mut self, feeds: Vec<RssFeed>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_prompts(mut self, prompts: ProfilePrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn enabled_feeds(&self) -> impl Iterator<Item = &RssFeed> {
        self.feeds.iter().filter(|f| f.enabled)
    }

    /// Distinct feed categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.feeds.iter().filter_map(|f| f.category.as_deref()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}

/// Profile definitions keyed by name, assembled once at startup.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ProfileDefinition>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(
            ProfileDefinition::new("default", "General news using the global prompts").with_feeds(vec![
                RssFeed::new("https://feeds.bbci.co.uk/news/world/rss.xml", "BBC World", "world"),
                RssFeed::new("https://www.theguardian.com/world/rss", "The Guardian World", "world"),
            ]),
        );

        registry.register(
            ProfileDefinition::new("technology", "Technology, security and hardware news")
                .with_feeds(vec![
                    RssFeed::new("https://techcrunch.com/feed/", "TechCrunch", "startup"),
                    RssFeed::new("https://www.theverge.com/rss/index.xml", "The Verge", "consumer-tech"),
                    RssFeed::new("https://arstechnica.com/feed/", "Ars Technica", "technical"),
                    RssFeed::new("https://krebsonsecurity.com/feed/", "Krebs on Security", "cybersecurity"),
                    RssFeed::new("https://www.bleepingcomputer.com/feed/", "BleepingComputer", "cybersecurity"),
                    RssFeed::new("https://www.tomshardware.com/feeds/all", "Tom's Hardware", "hardware"),
                    RssFeed::new("https://www.wired.com/feed/rss", "WIRED", "tech-culture"),
                ])
                .with_prompts(ProfilePrompts {
                    cluster_analysis: None,
                    brief_synthesis: Some(TECHNOLOGY_BRIEF_SYNTHESIS_PROMPT.to_string()),
                }),
        );

        registry.register(
            ProfileDefinition::new("brasil", "Brazilian politics and society")
                .with_feeds(vec![
                    RssFeed::new("https://www.brasildefato.com.br/rss", "Brasil de Fato", "news"),
                    RssFeed::new("https://www.intercept.com.br/feed/", "Intercept", "news"),
                    RssFeed::new("https://agenciabrasil.ebc.com.br/rss/politica.xml", "Agência Brasil", "politics"),
                ])
                .with_prompts(ProfilePrompts {
                    cluster_analysis: Some(BRASIL_CLUSTER_ANALYSIS_PROMPT.to_string()),
                    brief_synthesis: Some(BRASIL_BRIEF_SYNTHESIS_PROMPT.to_string()),
                }),
        );

        registry
    }

    pub fn register(&mut self, profile: ProfileDefinition) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&ProfileDefinition> {
        self.profiles.get(name)
    }

    /// Whether `name` is registered and switched on.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).map_or(false, |p| p.enabled)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.iter().filter(|p| p.enabled).map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileDefinition> {
        self.profiles.values()
    }
}

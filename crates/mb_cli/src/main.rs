use clap::Parser;
use mb_briefing::prelude::*;
use mb_core::{BriefingStorage, Error, Result};
use mb_inference::health::{check_connectivity, HealthReport};
use mb_inference::{create_chat_model, create_embedding_model};
use mb_storage::StorageKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num: u64 = current_number
                .parse()
                .map_err(|_| format!("Invalid character in duration: {}", c))?;
            let unit = match c {
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = add_seconds(total_seconds, num, unit)?;
            current_number.clear();
        }

        // A bare number means hours
        if !current_number.is_empty() {
            let num: u64 = current_number
                .parse()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = add_seconds(total_seconds, num, 3600)?;
        }

        if total_seconds == 0 {
            return Err("Duration must be at least one minute".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

fn add_seconds(total: u64, count: u64, unit: u64) -> std::result::Result<u64, String> {
    count
        .checked_mul(unit)
        .and_then(|seconds| total.checked_add(seconds))
        .ok_or_else(|| "Duration is too long".to_string())
}

impl HumanDuration {
    /// Whole hours, rounded up.
    fn hours(&self) -> u32 {
        let hours = (self.0.as_secs() + 3599) / 3600;
        u32::try_from(hours).unwrap_or(u32::MAX)
    }
}

#[derive(Parser, Debug)]
#[command(name = "meridian", author, version, about = "Clustered news briefings from processed RSS articles", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "sqlite", help = "Storage backend: memory, sqlite")]
    storage: String,
    #[arg(long, help = "SQLite database file")]
    database: Option<String>,
    #[arg(long, default_value = "deepseek", help = "Model to use for inference. Available models: deepseek (default), dummy")]
    model: String,
    #[arg(long, help = "Feed profile to brief (defaults to the configured default profile)")]
    feed: Option<String>,
    #[arg(long, help = "JSON file overriding the briefing defaults")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Cluster recent articles and synthesize a full brief
    Generate {
        /// How far back to look (e.g. 24h, 2d, 36h30m)
        #[arg(long)]
        lookback: Option<HumanDuration>,
        #[arg(long)]
        min_articles: Option<usize>,
        #[arg(long)]
        clusters: Option<usize>,
        /// File with a cluster analysis prompt template
        #[arg(long)]
        cluster_prompt: Option<PathBuf>,
        /// File with a brief synthesis prompt template
        #[arg(long)]
        synthesis_prompt: Option<PathBuf>,
    },
    /// Single-prompt brief over the highest-impact articles
    Simple {
        #[arg(long, default_value_t = DEFAULT_SIMPLE_BRIEF_ARTICLES)]
        max_articles: usize,
    },
    /// List the latest briefs
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Brief counts per day
    Trends {
        #[arg(long, default_value_t = DEFAULT_TREND_DAYS)]
        days: u32,
    },
    /// Show the available feed profiles
    Profiles,
    /// Check storage and model connectivity
    Status,
}

fn read_prompt(path: Option<PathBuf>) -> Result<Option<String>> {
    path.map(std::fs::read_to_string).transpose().map_err(Error::from)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(result: std::result::Result<GeneratedBrief, BriefError>, json: bool) -> Result<()> {
    let outcome = BriefResult::from(result);
    if json {
        print_json(&outcome)?;
    } else if let Some(content) = &outcome.content {
        if let Some(stats) = &outcome.stats {
            info!(
                "📊 {} articles, {} clusters generated, {} used",
                stats.articles_analyzed, stats.clusters_generated, stats.clusters_used
            );
        }
        info!("✨ Brief {} saved", outcome.briefing_id.unwrap_or_default());
        println!("{}", content);
    }

    if let Some(e) = &outcome.error {
        error!("❌ Brief generation failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn check_profile(profiles: &ProfileRegistry, profile: &str) -> Result<()> {
    if profiles.is_enabled(profile) {
        return Ok(());
    }
    let reason = if profiles.get(profile).is_some() { "Disabled" } else { "Unknown" };
    Err(Error::Config(format!(
        "{} profile '{}'. Available profiles: {}",
        reason,
        profile,
        profiles.enabled_names().join(", ")
    )))
}

fn print_profiles(profiles: &ProfileRegistry, config: &BriefingConfig, json: bool) -> Result<()> {
    if json {
        let all: Vec<_> = profiles.iter().collect();
        return print_json(&all);
    }

    for profile in profiles.iter() {
        let marker = match (profile.enabled, profile.name == config.default_profile) {
            (false, _) => "-",
            (true, true) => "*",
            (true, false) => " ",
        };
        println!(
            "{} {:<12} {} ({} feeds: {})",
            marker,
            profile.name,
            profile.description,
            profile.enabled_feeds().count(),
            profile.categories().join(", ")
        );
    }
    Ok(())
}

async fn status(
    inference: &mb_inference::Config,
    storage: &dyn BriefingStorage,
    profile: &str,
    json: bool,
) -> Result<()> {
    let last = storage.recent_briefings(profile, 1).await?;
    match last.first() {
        Some(brief) => info!("💾 Storage reachable, last '{}' brief #{} at {}", profile, brief.id, brief.created_at),
        None => info!("💾 Storage reachable, no '{}' briefs yet", profile),
    }

    let report = match (create_chat_model(inference), create_embedding_model(inference)) {
        (Ok(chat), Ok(embedding)) => check_connectivity(chat.as_ref(), embedding.as_ref(), HEALTH_CHECK_TIMEOUT).await,
        (chat, embedding) => HealthReport {
            chat: false,
            embedding: false,
            errors: [chat.err(), embedding.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect(),
        },
    };

    if json {
        print_json(&report)?;
    }

    if report.is_healthy() {
        info!("✓ All APIs are accessible");
        return Ok(());
    }
    for e in &report.errors {
        warn!("  - {}", e);
    }
    if !report.chat && !report.embedding {
        error!("❌ Both APIs are unavailable. Please check your configuration.");
        std::process::exit(1);
    }
    warn!("⚠️ Some APIs are unavailable. Functionality may be limited.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BriefingConfig::from_file(path)?,
        None => BriefingConfig::default(),
    };
    let profiles = ProfileRegistry::builtin();

    if matches!(cli.command, Commands::Profiles) {
        return print_profiles(&profiles, &config, cli.json);
    }

    let profile = cli.feed.clone().unwrap_or_else(|| config.default_profile.clone());
    check_profile(&profiles, &profile)?;

    let storage_kind: StorageKind = cli.storage.parse()?;
    let storage = mb_storage::create_storage(storage_kind, cli.database.as_deref()).await?;
    info!("🏦 Storage initialized successfully (using {})", cli.storage);

    let inference = mb_inference::Config {
        kind: cli.model.parse()?,
        chat_model: config.chat_model.clone(),
        embedding_model: config.embedding_model.clone(),
        ..mb_inference::Config::default()
    }
    .with_env_keys();

    if matches!(cli.command, Commands::Status) {
        return status(&inference, storage.as_ref(), &profile, cli.json).await;
    }

    let chat = create_chat_model(&inference)?;
    info!("🧠 Inference model initialized successfully (using {})", chat.name());
    let pipeline = BriefingPipeline::new(storage, chat, config, profiles);

    match cli.command {
        Commands::Generate {
            lookback,
            min_articles,
            clusters,
            cluster_prompt,
            synthesis_prompt,
        } => {
            let options = BriefOptions {
                lookback_hours: lookback.map(|l| l.hours()),
                min_articles,
                n_clusters: clusters,
                custom_prompts: CustomPrompts {
                    cluster_analysis: read_prompt(cluster_prompt)?,
                    brief_synthesis: read_prompt(synthesis_prompt)?,
                },
            };
            report(pipeline.generate_brief(&profile, &options).await, cli.json)
        }
        Commands::Simple { max_articles } => report(pipeline.generate_simple_brief(&profile, max_articles).await, cli.json),
        Commands::Recent { limit } => {
            let briefs = pipeline.recent_briefings(&profile, limit).await?;
            if cli.json {
                return print_json(&briefs);
            }
            if briefs.is_empty() {
                info!("📭 No briefs for '{}' yet", profile);
            }
            for brief in briefs {
                let headline = brief.content.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
                println!(
                    "#{:<5} {}  {:>3} articles  {}",
                    brief.id,
                    brief.created_at.format("%Y-%m-%d %H:%M"),
                    brief.article_count,
                    headline
                );
            }
            Ok(())
        }
        Commands::Trends { days } => {
            let trends = pipeline.briefing_trends(&profile, days).await?;
            if cli.json {
                return print_json(&trends);
            }
            println!(
                "{} briefs in the last {} days, {:.2} articles per brief",
                trends.total_briefings, days, trends.avg_articles_per_brief
            );
            for day in &trends.briefings_per_day {
                println!("{}  {}", day.date, "#".repeat(day.count));
            }
            Ok(())
        }
        Commands::Profiles | Commands::Status => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_human_duration() {
        assert_eq!("24h".parse::<HumanDuration>().unwrap().hours(), 24);
        assert_eq!("2d".parse::<HumanDuration>().unwrap().hours(), 48);
        assert_eq!("1d 6h".parse::<HumanDuration>().unwrap().hours(), 30);
        assert_eq!("36".parse::<HumanDuration>().unwrap().hours(), 36);
        assert_eq!("90m".parse::<HumanDuration>().unwrap().hours(), 2);
        assert!("10x".parse::<HumanDuration>().is_err());
        assert!("h".parse::<HumanDuration>().is_err());
        assert!("0h".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_human_duration_overflow_is_an_error() {
        let err = "300000000000000d".parse::<HumanDuration>().unwrap_err();
        assert_eq!(err, "Duration is too long");
        assert!(format!("{}h", u64::MAX).parse::<HumanDuration>().is_err());
        assert!("213503982334601d 1d".parse::<HumanDuration>().is_err());
        assert_eq!("213503982334601d".parse::<HumanDuration>().unwrap().hours(), u32::MAX);
    }

    #[test]
    fn test_check_profile() {
        let mut profiles = ProfileRegistry::builtin();
        assert!(check_profile(&profiles, "technology").is_ok());

        let err = check_profile(&profiles, "gardening").unwrap_err().to_string();
        assert!(err.contains("Unknown profile 'gardening'"));

        let mut brasil = mb_core::profiles::ProfileDefinition::new("brasil", "paused");
        brasil.enabled = false;
        profiles.register(brasil);
        let err = check_profile(&profiles, "brasil").unwrap_err().to_string();
        assert!(err.contains("Disabled profile 'brasil'"));
        assert!(err.ends_with("Available profiles: default, technology"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["meridian", "--feed", "technology", "generate", "--lookback", "48h", "--clusters", "8"]).unwrap();
        assert_eq!(cli.feed.as_deref(), Some("technology"));
        match cli.command {
            Commands::Generate { lookback, clusters, .. } => {
                assert_eq!(lookback.unwrap().hours(), 48);
                assert_eq!(clusters, Some(8));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["meridian", "recent", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.storage, "sqlite");
    }
}

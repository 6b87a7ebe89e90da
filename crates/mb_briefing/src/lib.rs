pub mod analyzer;
pub mod clustering;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod synthesizer;

pub use error::BriefError;
pub use pipeline::{BriefResult, BriefStats, BriefingPipeline, GeneratedBrief};

pub mod prelude {
    pub use super::analyzer::{ClusterAnalysis, ClusterAnalyzer};
    pub use super::clustering::{ClusterError, KMeans, SimilarityClusterer, VectorPartitioner};
    pub use super::history::{DEFAULT_RECENT_LIMIT, DEFAULT_TREND_DAYS};
    pub use super::pipeline::DEFAULT_SIMPLE_BRIEF_ARTICLES;
    pub use super::{BriefError, BriefResult, BriefStats, BriefingPipeline, GeneratedBrief};
    pub use mb_core::config::{BriefOptions, BriefingConfig, CustomPrompts};
    pub use mb_core::profiles::ProfileRegistry;
}

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod profiles;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{ChatModel, EmbeddingModel};
pub use storage::{ArticleStorage, BriefingStorage};
pub use types::{Article, Brief, BriefingSummary, BriefingTrends, BriefingsPerDay};

use thiserror::Error;

/// Why a brief could not be produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BriefError {
    #[error("Not enough recent articles ({found}) for profile '{profile}'. Min required: {required}.")]
    NotEnoughArticles {
        found: usize,
        profile: String,
        required: usize,
    },

    #[error("Not enough articles ({found}) with embeddings to cluster. Min required: {required}.")]
    NotEnoughEmbedded { found: usize, required: usize },

    #[error("Not enough articles to form meaningful clusters")]
    TooFewClusters,

    #[error("No articles found for briefing")]
    NoArticles,

    #[error("No meaningful clusters found or analyzed.")]
    NoClusters,

    #[error("Could not synthesize final brief.")]
    SynthesisFailed,

    #[error("Failed to generate brief content")]
    ContentGenerationFailed,

    #[error("{0}")]
    Storage(String),
}

impl BriefError {
    /// True when the run stopped because there was too little material,
    /// as opposed to a failing model or store.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughArticles { .. } | Self::NotEnoughEmbedded { .. } | Self::TooFewClusters | Self::NoArticles
        )
    }
}

impl From<mb_core::Error> for BriefError {
    fn from(error: mb_core::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

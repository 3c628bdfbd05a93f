//! Environment-driven server configuration

use anyhow::Context;

use stuntreel_sanity::SanityConfig;

/// Settings read once at startup. Only the project id is hard-required:
/// a missing write token or webhook secret degrades the affected endpoints
/// to per-request configuration errors instead of refusing to start.
pub struct ServerConfig {
    pub sanity: SanityConfig,
    pub revalidate_secret: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let project_id =
            std::env::var("SANITY_PROJECT_ID").context("SANITY_PROJECT_ID is not set")?;
        let dataset =
            std::env::var("SANITY_DATASET").unwrap_or_else(|_| "production".to_string());

        let mut sanity = SanityConfig::new(project_id, dataset)
            .with_token(std::env::var("SANITY_API_TOKEN").ok());
        if let Ok(version) = std::env::var("SANITY_API_VERSION") {
            sanity = sanity.with_api_version(version);
        }

        Ok(Self {
            sanity,
            revalidate_secret: std::env::var("REVALIDATE_SECRET").ok(),
        })
    }
}

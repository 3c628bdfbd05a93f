//! Sanity project configuration

/// Connection settings for one Sanity project/dataset pair.
///
/// The token is the write credential; read-only queries work without it,
/// but every mutation and asset upload requires it.
#[derive(Clone, Debug)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    /// Serve queries from the CDN edge instead of the live API. Must stay
    /// off for the write client so reads-before-writes see fresh data.
    pub use_cdn: bool,
}

impl SanityConfig {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            api_version: "2025-01-01".to_string(),
            token: None,
            use_cdn: false,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Base URL for queries; honors the CDN flag.
    pub fn query_base(&self) -> String {
        let host = if self.use_cdn { "apicdn" } else { "api" };
        format!(
            "https://{}.{}.sanity.io/v{}",
            self.project_id, host, self.api_version
        )
    }

    /// Base URL for mutations and asset uploads; always the live API.
    pub fn write_base(&self) -> String {
        format!(
            "https://{}.api.sanity.io/v{}",
            self.project_id, self.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_urls() {
        let config = SanityConfig::new("1rztdp97", "production");
        assert_eq!(
            config.query_base(),
            "https://1rztdp97.api.sanity.io/v2025-01-01"
        );

        let mut cdn = config.clone();
        cdn.use_cdn = true;
        assert_eq!(
            cdn.query_base(),
            "https://1rztdp97.apicdn.sanity.io/v2025-01-01"
        );
        assert_eq!(
            cdn.write_base(),
            "https://1rztdp97.api.sanity.io/v2025-01-01"
        );
    }
}

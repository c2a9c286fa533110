use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the Yahoo Finance endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YahooConfig {
    /// Scheme and host of the API, e.g. `https://query2.finance.yahoo.com`.
    pub base_url: String,
    /// `User-Agent` header; Yahoo rejects requests without a browser-like agent.
    pub user_agent: String,
    /// Session crumb appended as a query parameter when present.
    pub crumb: Option<String>,
    /// Session cookie sent with every request when present.
    pub cookie: Option<String>,
    /// Transport-level timeout for a single HTTP request.
    pub timeout: Duration,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            crumb: None,
            cookie: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP client settings shared by every data-source fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "tickerwatch/0.1".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            retry_delay_seconds: 1,
        }
    }
}

/// Scheduler cadence and pipeline thresholds.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Seconds between cycles while the market is open.
    pub open_poll_secs: u64,
    /// Seconds between cycles outside trading hours.
    pub closed_poll_secs: u64,
    /// Company-news lookback window in days.
    pub news_lookback_days: u32,
    /// Minimum sentiment level that triggers a notification.
    pub notify_level: u8,
    /// Budget for a single enrichment call; a timeout degrades to the
    /// neutral placeholder like any other enrichment failure.
    pub enrich_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            open_poll_secs: 45,
            closed_poll_secs: 300,
            news_lookback_days: 3,
            notify_level: 4,
            enrich_timeout_secs: 30,
        }
    }
}

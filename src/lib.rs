pub mod config;
pub mod fetcher;
pub mod market_hours;
pub mod monitor;
pub mod notify;
pub mod sentiment;
pub mod sources;
pub mod store;
pub mod types;

pub use config::{FetchConfig, MonitorConfig};
pub use fetcher::Fetcher;
pub use monitor::MonitorService;
pub use notify::{LogNotifier, Notifier};
pub use sentiment::{GeminiSentiment, MockSentiment, SentimentAdapter};
pub use sources::{FinnhubClient, MarketData, MarketDataHub, YahooChart};
pub use store::Store;
pub use types::*;

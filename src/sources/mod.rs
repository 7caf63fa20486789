pub mod finnhub;
pub mod yahoo;

use crate::types::{NewsItem, Quote};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub use finnhub::FinnhubClient;
pub use yahoo::YahooChart;

/// Pipeline-facing view of the market-data collaborators.
///
/// Every method absorbs upstream failures into an explicit absence
/// (`None` or an empty vec); no error crosses this boundary. Turning that
/// absence into degraded `QuoteUpdate` fields is the monitor's decision.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Option<Quote>;

    /// Intraday close series normalized to percent change from the first
    /// sample, empty on failure.
    async fn fetch_intraday(&self, ticker: &str) -> Vec<f64>;

    async fn fetch_company_news(&self, ticker: &str) -> Vec<NewsItem>;

    /// Market-wide news already attributed to watched tickers,
    /// first match wins.
    async fn fetch_general_news(&self, tickers: &[String]) -> Vec<NewsItem>;
}

/// Concrete [`MarketData`] backed by Finnhub (quotes, news) and the Yahoo
/// chart endpoint (intraday series).
pub struct MarketDataHub {
    finnhub: FinnhubClient,
    yahoo: YahooChart,
}

impl MarketDataHub {
    pub fn new(finnhub: FinnhubClient, yahoo: YahooChart) -> Self {
        Self { finnhub, yahoo }
    }
}

#[async_trait]
impl MarketData for MarketDataHub {
    async fn fetch_quote(&self, ticker: &str) -> Option<Quote> {
        match self.finnhub.quote(ticker).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Failed to fetch quote for {}: {}", ticker, e);
                None
            }
        }
    }

    async fn fetch_intraday(&self, ticker: &str) -> Vec<f64> {
        match self.yahoo.intraday_sparkline(ticker).await {
            Ok(series) => series,
            Err(e) => {
                warn!("Failed to fetch intraday series for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    async fn fetch_company_news(&self, ticker: &str) -> Vec<NewsItem> {
        match self.finnhub.company_news(ticker).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to fetch company news for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    async fn fetch_general_news(&self, tickers: &[String]) -> Vec<NewsItem> {
        match self.finnhub.general_news(tickers).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to fetch general news: {}", e);
                Vec::new()
            }
        }
    }
}

/// Build the default hub over a shared transport.
pub fn default_hub(
    fetcher: Arc<crate::Fetcher>,
    finnhub_token: Option<String>,
    news_lookback_days: u32,
) -> MarketDataHub {
    MarketDataHub::new(
        FinnhubClient::new(fetcher.clone(), finnhub_token).with_lookback_days(news_lookback_days),
        YahooChart::new(fetcher),
    )
}

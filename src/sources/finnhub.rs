use crate::fetcher::Fetcher;
use crate::types::{NewsItem, Quote, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub REST adapter for quotes, company news, and general news.
pub struct FinnhubClient {
    fetcher: Arc<Fetcher>,
    token: Option<String>,
    lookback_days: u32,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "c")]
    current: Option<f64>,
    #[serde(rename = "d")]
    change: Option<f64>,
    #[serde(rename = "dp")]
    percent: Option<f64>,
    #[serde(rename = "h")]
    high: Option<f64>,
    #[serde(rename = "l")]
    low: Option<f64>,
    #[serde(rename = "pc")]
    prev_close: Option<f64>,
    #[serde(rename = "t")]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct NewsEntry {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    summary: Option<String>,
}

impl FinnhubClient {
    pub fn new(fetcher: Arc<Fetcher>, token: Option<String>) -> Self {
        if token.is_none() {
            warn!("FINNHUB_TOKEN is not set; quote and news requests will likely fail");
        }
        Self {
            fetcher,
            token,
            lookback_days: 3,
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{BASE_URL}{path}");
        let mut query: Vec<(&str, &str)> = params.to_vec();
        if let Some(token) = self.token.as_deref() {
            query.push(("token", token));
        }
        self.fetcher.get_json(&url, &query).await
    }

    /// Real-time quote snapshot for one ticker.
    pub async fn quote(&self, ticker: &str) -> Result<Quote> {
        let symbol = ticker.to_uppercase();
        let response: QuoteResponse = self.get("/quote", &[("symbol", symbol.as_str())]).await?;
        Ok(Quote {
            price: response.current,
            change: response.change,
            percent: response.percent,
            high: response.high,
            low: response.low,
            prev_close: response.prev_close,
            timestamp: response.timestamp,
        })
    }

    /// Company-specific news over the configured lookback window.
    pub async fn company_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let symbol = ticker.to_uppercase();
        let today = Utc::now().date_naive();
        let start = today - Duration::days(i64::from(self.lookback_days));
        let from = start.format("%Y-%m-%d").to_string();
        let to = today.format("%Y-%m-%d").to_string();

        let entries: Vec<NewsEntry> = self
            .get(
                "/company-news",
                &[
                    ("symbol", symbol.as_str()),
                    ("from", from.as_str()),
                    ("to", to.as_str()),
                ],
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| NewsItem {
                ticker: symbol.clone(),
                headline: entry.headline,
                url: entry.url,
                published_at: entry.datetime,
                summary: entry.summary,
            })
            .collect())
    }

    /// Market-wide news filtered down to items mentioning a watched
    /// ticker. Each item is attributed to the first matching ticker only,
    /// so one url maps to exactly one ticker per cycle.
    pub async fn general_news(&self, tickers: &[String]) -> Result<Vec<NewsItem>> {
        let entries: Vec<NewsEntry> = self.get("/news", &[("category", "general")]).await?;

        let mut items = Vec::new();
        for entry in entries {
            let summary = entry.summary.unwrap_or_default();
            if let Some(ticker) = attribute_to_ticker(tickers, &entry.headline, &summary) {
                items.push(NewsItem {
                    ticker: ticker.to_string(),
                    headline: entry.headline,
                    url: entry.url,
                    published_at: entry.datetime,
                    summary: Some(summary),
                });
            }
        }
        Ok(items)
    }
}

/// First watched ticker whose symbol appears (case-sensitive) in the
/// headline or summary. Iteration order is the caller's watchlist order,
/// which the store keeps sorted, so attribution is deterministic.
pub fn attribute_to_ticker<'a>(
    tickers: &'a [String],
    headline: &str,
    summary: &str,
) -> Option<&'a str> {
    tickers
        .iter()
        .find(|ticker| headline.contains(ticker.as_str()) || summary.contains(ticker.as_str()))
        .map(|ticker| ticker.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchlist(tickers: &[&str]) -> Vec<String> {
        tickers.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn attribution_first_match_wins() {
        let watch = watchlist(&["AAPL", "MSFT"]);
        let headline = "AAPL and MSFT both rally on earnings";
        assert_eq!(attribute_to_ticker(&watch, headline, ""), Some("AAPL"));

        // Reversing the iteration order flips the winner.
        let reversed = watchlist(&["MSFT", "AAPL"]);
        assert_eq!(attribute_to_ticker(&reversed, headline, ""), Some("MSFT"));
    }

    #[test]
    fn attribution_checks_summary_too() {
        let watch = watchlist(&["TSLA"]);
        assert_eq!(
            attribute_to_ticker(&watch, "EV maker beats estimates", "TSLA deliveries up 20%"),
            Some("TSLA")
        );
    }

    #[test]
    fn attribution_is_case_sensitive() {
        let watch = watchlist(&["AAPL"]);
        assert_eq!(attribute_to_ticker(&watch, "aapl drifts lower", ""), None);
    }

    #[test]
    fn no_match_no_item() {
        let watch = watchlist(&["AAPL", "MSFT"]);
        assert_eq!(attribute_to_ticker(&watch, "Oil prices slip", ""), None);
    }
}

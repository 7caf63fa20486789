use crate::fetcher::Fetcher;
use crate::types::Result;
use serde::Deserialize;
use std::sync::Arc;

/// Yahoo Finance chart adapter used for intraday sparklines and a
/// fallback latest-close lookup.
pub struct YahooChart {
    fetcher: Arc<Fetcher>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooChart {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    async fn closes(&self, ticker: &str, range: &str, interval: &str) -> Result<Vec<f64>> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}",
            ticker.to_uppercase()
        );
        let response: ChartResponse = self
            .fetcher
            .get_json(&url, &[("range", range), ("interval", interval)])
            .await?;

        let closes = response
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|result| result.indicators.quote.into_iter().next())
            .map(|quote| quote.close)
            .unwrap_or_default();

        Ok(closes.into_iter().flatten().collect())
    }

    /// Percent-change-from-first-sample series for sparkline rendering,
    /// so the visual scale is comparable across tickers.
    pub async fn intraday_sparkline(&self, ticker: &str) -> Result<Vec<f64>> {
        let closes = self.closes(ticker, "1d", "5m").await?;
        Ok(normalize_series(&closes))
    }

    /// Latest daily close, used as a price fallback.
    pub async fn latest_close(&self, ticker: &str) -> Result<Option<f64>> {
        let closes = self.closes(ticker, "1d", "1d").await?;
        Ok(closes.last().copied())
    }
}

/// Normalize raw closes to percent change from the first sample.
pub fn normalize_series(prices: &[f64]) -> Vec<f64> {
    let Some(&first) = prices.first() else {
        return Vec::new();
    };
    let base = if first == 0.0 { 1.0 } else { first };
    prices.iter().map(|p| ((p - base) / base) * 100.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_empty_series() {
        assert!(normalize_series(&[]).is_empty());
    }

    #[test]
    fn normalize_anchors_on_first_sample() {
        let series = normalize_series(&[100.0, 101.0, 99.0]);
        assert_eq!(series.len(), 3);
        assert!((series[0] - 0.0).abs() < 1e-9);
        assert!((series[1] - 1.0).abs() < 1e-9);
        assert!((series[2] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_survives_zero_base() {
        // A zero first sample must not divide by zero.
        let series = normalize_series(&[0.0, 2.0]);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|v| v.is_finite()));
    }
}

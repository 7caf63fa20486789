use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment direction assigned by the enrichment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Positive,
    Negative,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
        }
    }

    /// Parse a textual label, mapping anything unknown to neutral.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Emotion::Positive,
            "negative" => Emotion::Negative,
            _ => Emotion::Neutral,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw quote payload as returned by the market-data adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub percent: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub timestamp: Option<i64>,
}

/// Per-ticker quote snapshot published to the event channel.
///
/// Fields are optional because an upstream fetch failure degrades to
/// "unknown" instead of blocking the rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub ticker: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub percent: Option<f64>,
    /// Intraday close series normalized to percent change from the first
    /// sample, empty when the series fetch failed.
    pub sparkline: Vec<f64>,
}

/// A single news article. Identity is the `url`; two items sharing a url
/// are the same item no matter which ticker query surfaced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: String,
    pub headline: String,
    pub url: String,
    /// Publication time in epoch seconds.
    pub published_at: i64,
    pub summary: Option<String>,
}

/// Structured sentiment judgment for one news item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub ticker: String,
    pub emotion: Emotion,
    /// Severity from 1 (minor) to 5 (critical).
    pub level: u8,
    pub summary: String,
    pub reasoning: String,
    pub risks: String,
}

impl SentimentResult {
    /// Neutral placeholder used whenever enrichment fails. Always
    /// well-formed so enrichment errors never escape the pipeline.
    pub fn neutral(ticker: &str, summary: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            emotion: Emotion::Neutral,
            level: 3,
            summary: summary.into(),
            reasoning: "No detailed model reasoning available; holding a neutral stance.".to_string(),
            risks: "No additional risks noted.".to_string(),
        }
    }
}

/// A news item paired with its sentiment, published exactly once per
/// unique url per process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEvent {
    pub item: NewsItem,
    pub sentiment: SentimentResult,
}

/// Tagged payload of the outbound event channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MonitorEvent {
    Quote(QuoteUpdate),
    News(NewsEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Sentiment backend error: {0}")]
    Sentiment(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_label_round_trip() {
        assert_eq!(Emotion::from_label("positive"), Emotion::Positive);
        assert_eq!(Emotion::from_label("NEGATIVE"), Emotion::Negative);
        assert_eq!(Emotion::from_label("bullish"), Emotion::Neutral);
        assert_eq!(Emotion::Negative.as_str(), "negative");
    }

    #[test]
    fn neutral_placeholder_is_well_formed() {
        let result = SentimentResult::neutral("aapl", "Some headline");
        assert_eq!(result.ticker, "AAPL");
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.level, 3);
        assert_eq!(result.summary, "Some headline");
        assert!(!result.reasoning.is_empty());
        assert!(!result.risks.is_empty());
    }
}

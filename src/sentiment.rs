//! AI sentiment enrichment.
//!
//! The adapter contract is infallible by design: an adapter always hands
//! back a well-formed [`SentimentResult`], substituting the neutral
//! placeholder for any internal failure (missing credentials, transport
//! errors, malformed model output). Nothing downstream ever sees an
//! enrichment error.

use crate::fetcher::Fetcher;
use crate::types::{Emotion, MonitorError, Result, SentimentResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[async_trait]
pub trait SentimentAdapter: Send + Sync {
    fn adapter_name(&self) -> String;

    /// Judge one news item. Must never fail; internal errors are absorbed
    /// into a neutral placeholder carrying the headline as summary.
    async fn analyze(&self, ticker: &str, headline: &str, summary: Option<&str>)
        -> SentimentResult;
}

/// Gemini-backed adapter enforcing structured JSON output.
pub struct GeminiSentiment {
    fetcher: Arc<Fetcher>,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Loosely-typed model output; every field may be absent or out of range
/// and is normalized before leaving the adapter.
#[derive(Debug, Default, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub risks: Option<String>,
}

impl GeminiSentiment {
    pub fn new(fetcher: Arc<Fetcher>, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("GEMINI_API_KEY not set; sentiment falls back to neutral placeholders");
        }
        Self {
            fetcher,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn request_analysis(
        &self,
        api_key: &str,
        ticker: &str,
        headline: &str,
        summary: Option<&str>,
    ) -> Result<RawAnalysis> {
        let prompt = "You are a Wall Street event-driven analyst. Given the news headline \
                      and optional summary below, produce a structured trading-impact \
                      judgment. The output must strictly match the provided JSON schema.";
        let content = format!(
            "Ticker: {}\nHeadline: {}\nSummary: {}",
            ticker,
            headline,
            summary.unwrap_or("N/A")
        );

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "text": content },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "object",
                    "properties": {
                        "ticker": { "type": "string" },
                        "emotion": { "type": "string", "enum": ["positive", "negative", "neutral"] },
                        "level": { "type": "integer", "minimum": 1, "maximum": 5 },
                        "summary": { "type": "string" },
                        "reasoning": { "type": "string" },
                        "risks": { "type": "string" },
                    },
                    "required": ["ticker", "emotion", "level", "summary", "reasoning", "risks"],
                },
            },
        });

        let url = format!(
            "{GEMINI_BASE_URL}/models/{}:generateContent?key={api_key}",
            self.model
        );
        let response = self
            .fetcher
            .client()
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let generated: GenerateResponse = response.json().await?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| MonitorError::Sentiment("empty model response".to_string()))?;

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SentimentAdapter for GeminiSentiment {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    async fn analyze(
        &self,
        ticker: &str,
        headline: &str,
        summary: Option<&str>,
    ) -> SentimentResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return SentimentResult::neutral(ticker, headline);
        };

        match self.request_analysis(api_key, ticker, headline, summary).await {
            Ok(raw) => {
                debug!("Sentiment analysis succeeded for {}", ticker);
                normalize_analysis(ticker, headline, raw)
            }
            Err(e) => {
                warn!("Sentiment analysis failed for {}: {}; using neutral fallback", ticker, e);
                SentimentResult::neutral(ticker, headline)
            }
        }
    }
}

/// Clamp and default the model's output into a guaranteed-valid result.
pub fn normalize_analysis(ticker: &str, headline: &str, raw: RawAnalysis) -> SentimentResult {
    SentimentResult {
        ticker: raw
            .ticker
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string())
            .to_uppercase(),
        emotion: raw
            .emotion
            .map(|label| Emotion::from_label(&label))
            .unwrap_or(Emotion::Neutral),
        level: raw.level.unwrap_or(3).clamp(1, 5) as u8,
        summary: raw
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| headline.to_string()),
        reasoning: raw.reasoning.unwrap_or_else(|| "Not provided.".to_string()),
        risks: raw.risks.unwrap_or_else(|| "Not provided.".to_string()),
    }
}

/// Canned adapter for development and tests.
pub struct MockSentiment {
    emotion: Emotion,
    level: u8,
    delay_ms: u64,
}

impl MockSentiment {
    pub fn new() -> Self {
        Self {
            emotion: Emotion::Neutral,
            level: 3,
            delay_ms: 0,
        }
    }

    pub fn with_judgment(mut self, emotion: Emotion, level: u8) -> Self {
        self.emotion = emotion;
        self.level = level.clamp(1, 5);
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

impl Default for MockSentiment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentAdapter for MockSentiment {
    fn adapter_name(&self) -> String {
        "Mock sentiment".to_string()
    }

    async fn analyze(
        &self,
        ticker: &str,
        headline: &str,
        _summary: Option<&str>,
    ) -> SentimentResult {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        SentimentResult {
            emotion: self.emotion,
            level: self.level,
            ..SentimentResult::neutral(ticker, headline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_level_into_range() {
        let low = normalize_analysis(
            "AAPL",
            "h",
            RawAnalysis {
                level: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(low.level, 1);

        let high = normalize_analysis(
            "AAPL",
            "h",
            RawAnalysis {
                level: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(high.level, 5);
    }

    #[test]
    fn normalize_defaults_missing_fields() {
        let result = normalize_analysis("aapl", "Apple beats estimates", RawAnalysis::default());
        assert_eq!(result.ticker, "AAPL");
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.level, 3);
        assert_eq!(result.summary, "Apple beats estimates");
        assert_eq!(result.reasoning, "Not provided.");
    }

    #[test]
    fn normalize_maps_unknown_emotion_to_neutral() {
        let result = normalize_analysis(
            "AAPL",
            "h",
            RawAnalysis {
                emotion: Some("bullish".to_string()),
                level: Some(4),
                ..Default::default()
            },
        );
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.level, 4);
    }

    #[tokio::test]
    async fn missing_api_key_yields_neutral() {
        let fetcher = Arc::new(Fetcher::new(crate::config::FetchConfig::default()));
        let adapter = GeminiSentiment::new(fetcher, None);
        let result = adapter.analyze("MSFT", "Microsoft announces layoffs", None).await;
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.level, 3);
        assert_eq!(result.summary, "Microsoft announces layoffs");
    }
}

use crate::types::{Emotion, NewsItem, Result, SentimentResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed persistence for the watchlist, raw news, and sentiment
/// records. A single connection mirrors the single-writer access pattern
/// of the pipeline.
pub struct Store {
    db: SqlitePool,
}

impl Store {
    /// Open (and create if missing) the database at `url`, e.g.
    /// `sqlite:tickerwatch.db` or `sqlite::memory:`, and ensure the
    /// schema exists.
    pub async fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS watchlist (
                ticker TEXT PRIMARY KEY,
                created_at INTEGER DEFAULT (strftime('%s','now'))
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                headline TEXT NOT NULL,
                url TEXT NOT NULL,
                published_at INTEGER NOT NULL,
                summary TEXT,
                UNIQUE(url)
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                emotion TEXT NOT NULL,
                level INTEGER NOT NULL,
                summary TEXT NOT NULL,
                reasoning TEXT NOT NULL,
                risks TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s','now'))
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Seed the default watchlist when the table is empty, so a fresh
    /// install has something to monitor.
    pub async fn seed_watchlist_if_empty(&self, tickers: &[&str]) -> Result<()> {
        if self.fetch_watchlist().await?.is_empty() {
            info!("Seeding default watchlist: {:?}", tickers);
            let owned: Vec<String> = tickers.iter().map(|t| t.to_string()).collect();
            self.add_tickers(&owned).await?;
        }
        Ok(())
    }

    pub async fn add_ticker(&self, ticker: &str) -> Result<()> {
        self.add_tickers(&[ticker.to_string()]).await
    }

    pub async fn add_tickers(&self, tickers: &[String]) -> Result<()> {
        for ticker in tickers {
            sqlx::query("INSERT OR IGNORE INTO watchlist(ticker) VALUES (?)")
                .bind(ticker.to_uppercase())
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }

    pub async fn remove_ticker(&self, ticker: &str) -> Result<()> {
        sqlx::query("DELETE FROM watchlist WHERE ticker = ?")
            .bind(ticker.to_uppercase())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Current watchlist, sorted and uppercase. Read fresh every cycle so
    /// additions and removals take effect without a restart.
    pub async fn fetch_watchlist(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT ticker FROM watchlist ORDER BY ticker")
            .fetch_all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("ticker"))
            .collect())
    }

    /// Persist a raw news item. Idempotent on url: a duplicate insert is
    /// a no-op, not an error. Returns whether a new row was written.
    pub async fn record_news(&self, item: &NewsItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO news(ticker, headline, url, published_at, summary)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.ticker)
        .bind(&item.headline)
        .bind(&item.url)
        .bind(item.published_at)
        .bind(&item.summary)
        .execute(&self.db)
        .await?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!("News item already recorded: {}", item.url);
        }
        Ok(inserted)
    }

    pub async fn record_sentiment(&self, result: &SentimentResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analysis(ticker, emotion, level, summary, reasoning, risks)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.ticker)
        .bind(result.emotion.as_str())
        .bind(i64::from(result.level))
        .bind(&result.summary)
        .bind(&result.reasoning)
        .bind(&result.risks)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn fetch_recent_news(&self, limit: u32) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query(
            r#"
            SELECT ticker, headline, url, published_at, summary
            FROM news ORDER BY published_at DESC LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| NewsItem {
                ticker: row.get("ticker"),
                headline: row.get("headline"),
                url: row.get("url"),
                published_at: row.get("published_at"),
                summary: row.get("summary"),
            })
            .collect())
    }

    pub async fn fetch_latest_sentiment(&self, ticker: &str) -> Result<Option<SentimentResult>> {
        let row = sqlx::query(
            r#"
            SELECT ticker, emotion, level, summary, reasoning, risks
            FROM analysis WHERE ticker = ? ORDER BY id DESC LIMIT 1
            "#,
        )
        .bind(ticker.to_uppercase())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|row| SentimentResult {
            ticker: row.get("ticker"),
            emotion: Emotion::from_label(row.get::<String, _>("emotion").as_str()),
            level: row.get::<i64, _>("level").clamp(1, 5) as u8,
            summary: row.get("summary"),
            reasoning: row.get("reasoning"),
            risks: row.get("risks"),
        }))
    }

    /// Count of persisted news rows, used by tests and status output.
    pub async fn news_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Count of persisted sentiment rows.
    pub async fn sentiment_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analysis")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

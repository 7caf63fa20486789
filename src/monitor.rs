//! Background monitoring service.
//!
//! The monitor polls the market-data collaborators and pushes typed
//! events onto an outbound channel for the display layer to consume. It
//! keeps no reference to any consumer state; the channel is the only
//! coupling.

use crate::config::MonitorConfig;
use crate::market_hours::poll_interval;
use crate::notify::Notifier;
use crate::sentiment::SentimentAdapter;
use crate::sources::MarketData;
use crate::store::Store;
use crate::types::{MonitorEvent, NewsEvent, NewsItem, QuoteUpdate, SentimentResult};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Fetches quotes, news, and sentiment on an adaptive cadence.
///
/// Error containment policy: nothing raised inside a cycle terminates the
/// loop. Fetch failures degrade to missing data, enrichment failures to a
/// neutral placeholder, persistence and notification failures are logged;
/// only [`MonitorService::stop`] ends [`MonitorService::run`].
pub struct MonitorService {
    store: Arc<Store>,
    market: Arc<dyn MarketData>,
    sentiment: Arc<dyn SentimentAdapter>,
    notifier: Arc<dyn Notifier>,
    config: MonitorConfig,
    events: mpsc::UnboundedSender<MonitorEvent>,
    /// Urls already handled this process lifetime. A url is inserted
    /// before any persistence/publish/notify side effect for its item.
    seen_urls: Mutex<HashSet<String>>,
    is_running: RwLock<bool>,
    stop_signal: Notify,
}

impl MonitorService {
    pub fn new(
        store: Arc<Store>,
        market: Arc<dyn MarketData>,
        sentiment: Arc<dyn SentimentAdapter>,
        notifier: Arc<dyn Notifier>,
        config: MonitorConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            store,
            market,
            sentiment,
            notifier,
            config,
            events,
            seen_urls: Mutex::new(HashSet::new()),
            is_running: RwLock::new(true),
            stop_signal: Notify::new(),
        });
        (service, receiver)
    }

    /// Cooperative, idempotent stop. An in-flight cycle always runs to
    /// completion; the flag is observed at the next loop checkpoint.
    pub async fn stop(&self) {
        let mut running = self.is_running.write().await;
        *running = false;
        self.stop_signal.notify_waiters();
        info!("Monitor stop requested");
    }

    async fn running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Main polling loop. Runs until [`stop`](Self::stop) is observed.
    pub async fn run(self: Arc<Self>) {
        info!("Monitor loop started");
        loop {
            if !self.running().await {
                break;
            }
            Arc::clone(&self).poll_cycle().await;
            if !self.running().await {
                break;
            }

            let wait = poll_interval(&self.config, Utc::now());
            debug!("Sleeping {:?} until next cycle", wait);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.stop_signal.notified() => {}
            }
        }
        info!("Monitor loop stopped");
    }

    /// One full cycle: fan out over the watchlist, join, then the
    /// general-news pass. Public so manual refreshes and tests can drive
    /// the pipeline without the loop.
    pub async fn poll_cycle(self: Arc<Self>) {
        let watchlist = match self.store.fetch_watchlist().await {
            Ok(watchlist) => watchlist,
            Err(e) => {
                error!("Failed to read watchlist, skipping cycle: {}", e);
                return;
            }
        };
        if watchlist.is_empty() {
            debug!("Watchlist empty, skipping cycle");
            return;
        }

        let mut tasks = JoinSet::new();
        for ticker in &watchlist {
            let service = Arc::clone(&self);
            let ticker = ticker.clone();
            tasks.spawn(async move { service.process_ticker(&ticker).await });
        }
        // Join barrier: general news waits for every per-ticker pipeline.
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Per-ticker task did not complete: {}", e);
            }
        }

        self.process_general_news(&watchlist).await;
    }

    /// Out-of-band single-ticker refresh. Independent of the loop and of
    /// its cancellation state; safe to call concurrently with `run`.
    pub async fn poll_once(&self, ticker: &str) {
        self.process_ticker(ticker).await;
    }

    async fn process_ticker(&self, ticker: &str) {
        let ticker = ticker.to_uppercase();
        // The three fetches are independent; one failure never blocks the
        // other two.
        let (quote, sparkline, news) = tokio::join!(
            self.market.fetch_quote(&ticker),
            self.market.fetch_intraday(&ticker),
            self.market.fetch_company_news(&ticker),
        );

        let update = QuoteUpdate {
            ticker: ticker.clone(),
            price: quote.as_ref().and_then(|q| q.price),
            change: quote.as_ref().and_then(|q| q.change),
            percent: quote.as_ref().and_then(|q| q.percent),
            sparkline,
        };
        self.publish(MonitorEvent::Quote(update));

        self.handle_news_items(news).await;
    }

    async fn process_general_news(&self, watchlist: &[String]) {
        let items = self.market.fetch_general_news(watchlist).await;
        self.handle_news_items(items).await;
    }

    /// Shared news-handling routine. Steps for one item are strictly
    /// sequential: dedup mark, persist raw, enrich, persist sentiment,
    /// publish, then the optional alert.
    async fn handle_news_items(&self, items: Vec<NewsItem>) {
        for item in items {
            {
                let mut seen = self.seen_urls.lock().await;
                if !seen.insert(item.url.clone()) {
                    continue;
                }
            }

            if let Err(e) = self.store.record_news(&item).await {
                // The in-memory event still goes out: freshness beats
                // durability for a monitoring view.
                warn!("Failed to persist news item {}: {}", item.url, e);
            }

            let sentiment = self.enrich(&item).await;

            if let Err(e) = self.store.record_sentiment(&sentiment).await {
                warn!("Failed to persist sentiment for {}: {}", item.url, e);
            }

            let alert = (sentiment.level >= self.config.notify_level).then(|| {
                (
                    format!("{} L{} {}", sentiment.ticker, sentiment.level, sentiment.emotion),
                    item.headline.clone(),
                )
            });

            self.publish(MonitorEvent::News(NewsEvent { item, sentiment }));

            if let Some((title, body)) = alert {
                if let Err(e) = self.notifier.notify(&title, &body).await {
                    warn!("Failed to dispatch notification: {}", e);
                }
            }
        }
    }

    /// Enrichment never fails outward: adapter errors are absorbed by the
    /// adapter contract, and the timeout budget here degrades to the same
    /// neutral placeholder.
    async fn enrich(&self, item: &NewsItem) -> SentimentResult {
        let analysis = self
            .sentiment
            .analyze(&item.ticker, &item.headline, item.summary.as_deref());
        match tokio::time::timeout(Duration::from_secs(self.config.enrich_timeout_secs), analysis)
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("Sentiment analysis timed out for {}", item.url);
                SentimentResult::neutral(&item.ticker, &item.headline)
            }
        }
    }

    fn publish(&self, event: MonitorEvent) {
        // The channel is unbounded, so a send only fails once the consumer
        // is gone; the monitor keeps running regardless.
        if self.events.send(event).is_err() {
            debug!("Event consumer dropped; discarding update");
        }
    }
}

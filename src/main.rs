use clap::{Parser, Subcommand};
use std::env;
use std::sync::Arc;
use tickerwatch::sources;
use tickerwatch::{
    FetchConfig, Fetcher, GeminiSentiment, LogNotifier, MonitorConfig, MonitorEvent,
    MonitorService, SentimentAdapter, Store,
};
use tracing::info;

const DEFAULT_WATCHLIST: &[&str] = &["AAPL", "MSFT", "TSLA"];

#[derive(Parser)]
#[command(name = "tickerwatch", about = "Watchlist quote and news monitor")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "TICKERWATCH_DB", default_value = "tickerwatch.db")]
    db: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitoring loop (the default).
    Run,
    /// Add tickers to the watchlist.
    Add { tickers: Vec<String> },
    /// Remove a ticker from the watchlist.
    Remove { ticker: String },
    /// Print the current watchlist.
    List,
    /// Refresh a single ticker once and print its events.
    Poll { ticker: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = Arc::new(Store::open(&format!("sqlite:{}", cli.db)).await?);

    match cli.command.unwrap_or(Command::Run) {
        Command::Add { tickers } => {
            store.add_tickers(&tickers).await?;
            info!("Added {} ticker(s)", tickers.len());
        }
        Command::Remove { ticker } => {
            store.remove_ticker(&ticker).await?;
            info!("Removed {}", ticker.to_uppercase());
        }
        Command::List => {
            for ticker in store.fetch_watchlist().await? {
                println!("{ticker}");
            }
        }
        Command::Poll { ticker } => {
            let (monitor, mut events) = build_monitor(store);
            monitor.poll_once(&ticker).await;
            drop(monitor);
            while let Some(event) = events.recv().await {
                report_event(&event);
            }
        }
        Command::Run => {
            store.seed_watchlist_if_empty(DEFAULT_WATCHLIST).await?;
            let (monitor, mut events) = build_monitor(store);

            let consumer = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    report_event(&event);
                }
            });
            let runner = tokio::spawn(Arc::clone(&monitor).run());

            tokio::signal::ctrl_c().await?;
            monitor.stop().await;
            runner.await?;
            drop(monitor);
            consumer.await?;
        }
    }

    Ok(())
}

fn build_monitor(
    store: Arc<Store>,
) -> (
    Arc<MonitorService>,
    tokio::sync::mpsc::UnboundedReceiver<MonitorEvent>,
) {
    let config = MonitorConfig::default();
    let fetcher = Arc::new(Fetcher::new(FetchConfig::default()));
    let market = Arc::new(sources::default_hub(
        Arc::clone(&fetcher),
        env::var("FINNHUB_TOKEN").ok(),
        config.news_lookback_days,
    ));
    let sentiment: Arc<dyn SentimentAdapter> =
        Arc::new(GeminiSentiment::new(fetcher, env::var("GEMINI_API_KEY").ok()));

    MonitorService::new(store, market, sentiment, Arc::new(LogNotifier), config)
}

/// Minimal textual consumer; the real display layer drains the same
/// channel.
fn report_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Quote(update) => {
            info!(
                "Quote {}: price {} change {} ({}%) [{} samples]",
                update.ticker,
                fmt_opt(update.price),
                fmt_opt(update.change),
                fmt_opt(update.percent),
                update.sparkline.len(),
            );
        }
        MonitorEvent::News(event) => {
            info!(
                "News {} [L{} {}] {}: {}",
                event.sentiment.ticker,
                event.sentiment.level,
                event.sentiment.emotion,
                event.item.headline,
                event.sentiment.summary,
            );
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

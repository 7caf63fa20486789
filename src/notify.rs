use crate::types::Result;
use async_trait::async_trait;
use tracing::info;

/// Side-channel alert sink for high-severity news. Dispatch failures are
/// logged by the caller and never abort the pipeline.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Default sink that surfaces alerts on the log stream.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!(target: "tickerwatch::alert", "{}: {}", title, message);
        Ok(())
    }
}

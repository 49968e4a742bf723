use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::OnboardService;
use crate::service::outbox::Mailer;

/// Configuration for the background outbox worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to drain the mail outbox (seconds).
    pub poll_interval: u64,
    /// Entries failing this many delivery attempts are marked failed.
    pub max_attempts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: 15,
            max_attempts: 5,
        }
    }
}

/// Start the background outbox worker.
///
/// Periodically attempts delivery of pending notifications. Delivery
/// failures stay in the outbox for the next pass; they never surface
/// to the workflows that enqueued them.
///
/// Returns a CancellationToken that stops the worker when cancelled.
pub fn start(
    service: Arc<OnboardService>,
    mailer: Arc<dyn Mailer>,
    config: WorkerConfig,
) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let interval = Duration::from_secs(config.poll_interval);
        let max_attempts = config.max_attempts;

        tokio::spawn(async move {
            info!("mail outbox worker started (interval={interval:?})");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("mail outbox worker stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        debug!("outbox drain pass");
                        match service.process_outbox_once(mailer.as_ref(), max_attempts) {
                            Ok(0) => {}
                            Ok(n) => info!("outbox worker: delivered {n} notifications"),
                            Err(e) => error!("outbox worker error: {e}"),
                        }
                    }
                }
            }
        });
    }

    cancel
}

use crate::server::ControlResult;

use std::future::Future;

use fp_config::RetrySettings;
use tracing::{info, warn};

/// Retry `op` on transient errors with capped exponential backoff.
///
/// Only for idempotent work (probes, reads). Process-control commands must
/// not go through here.
pub(crate) async fn with_retry<T, F, Fut>(
    settings: &RetrySettings,
    what: &str,
    mut op: F,
) -> ControlResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ControlResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{what} succeeded after {attempt} attempts");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < settings.max_attempts => {
                let delay = settings.backoff(attempt);
                warn!(
                    "{what} failed (attempt {attempt}/{}), retrying in {delay:?}: {e}",
                    settings.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

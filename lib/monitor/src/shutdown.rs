use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `cancel` when the operator presses Ctrl+C.
///
/// The watcher also exits quietly if the token is cancelled by someone else.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Cancellation requested via Ctrl+C");
                    cancel.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watcher_exits_when_token_is_cancelled_elsewhere() {
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(cancel.clone());

        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), watcher)
            .await
            .expect("watcher should stop")
            .unwrap();
    }
}

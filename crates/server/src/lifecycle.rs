//! Session lifecycle
//!
//! Active sessions that go quiet are marked abandoned. Nothing is deleted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use lead_agent_config::ConversationConfig;
use lead_agent_core::{SessionStatus, SessionUpdate};
use lead_agent_persistence::{ConversationStore, PersistenceError};

/// Mark active sessions idle for longer than `idle_for` as abandoned
///
/// Returns the number of sessions marked.
pub async fn sweep_abandoned(
    store: &dyn ConversationStore,
    idle_for: Duration,
) -> Result<usize, PersistenceError> {
    let idle_for = chrono::Duration::from_std(idle_for)
        .map_err(|e| PersistenceError::Storage(format!("Invalid idle timeout: {}", e)))?;
    let idle = store.idle_sessions(idle_for).await?;

    let mut marked = 0;
    for session_id in idle {
        match store
            .update(&session_id, SessionUpdate::default().status(SessionStatus::Abandoned))
            .await
        {
            Ok(_) => marked += 1,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to mark session abandoned"
                );
            }
        }
    }
    Ok(marked)
}

/// Start the periodic abandon sweep
///
/// Returns a shutdown sender; send `true` to stop the task.
pub fn start_abandon_sweeper(
    store: Arc<dyn ConversationStore>,
    config: &ConversationConfig,
) -> watch::Sender<bool> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let sweep_interval = Duration::from_secs(config.sweep_interval_seconds.max(1));
    let idle_for = Duration::from_secs(config.idle_timeout_minutes * 60);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(sweep_interval);
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    match sweep_abandoned(store.as_ref(), idle_for).await {
                        Ok(0) => {}
                        Ok(count) => {
                            crate::metrics::record_abandoned(count as u64);
                            tracing::info!(count, "Marked idle sessions abandoned");
                        }
                        Err(e) => tracing::warn!(error = %e, "Abandon sweep failed"),
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Abandon sweeper shutting down");
                        break;
                    }
                }
            }
        }
    });

    shutdown_tx
}

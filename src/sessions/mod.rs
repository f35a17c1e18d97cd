pub mod repo;

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub use repo::{PgSessionStore, SessionStore};

/// Random bytes behind a session id (32 hex chars).
pub const SESSION_ID_BYTES: usize = 16;

/// A session about to be persisted.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub expires_at: OffsetDateTime,
}

impl NewSession {
    pub fn issue(ttl: time::Duration, now: OffsetDateTime) -> Self {
        Self {
            id: generate_session_id(),
            expires_at: now + ttl,
        }
    }
}

pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Periodically deletes expired sessions until the task is aborted.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, every: std::time::Duration) -> JoinHandle<()> {
    info!(every_secs = every.as_secs(), "session sweeper started");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired sessions"),
                Err(e) => error!(error = %e, "session sweep failed"),
            }
        }
    })
}

//! Coordination core for the rental marketplace: conversation registry,
//! message log, match resolver, and the realtime notifier that fans
//! stored messages out to gateway connections.
//!
//! Every operation degrades instead of failing hard: when the backing
//! store is unreachable the caller gets `Unavailable`, an empty list, or
//! a zero count, and the underlying error lands in the logs at `warn`.
//! The mobile app renders empty states; it never renders a stack trace.

use thiserror::Error;
use tracing::warn;

pub mod matches;
pub mod messages;
pub mod notify;
pub mod registry;

pub use matches::{LikeOutcome, LikeTarget, MatchResolver};
pub use messages::{MessageLog, SendError};
pub use notify::{Notifier, Subscription};
pub use registry::ConversationRegistry;

/// Sentinel for "the backing store did not answer". Callers branch on
/// this, so it is a typed value rather than a stringly error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("backing store unavailable")]
pub struct Unavailable;

/// Runs a synchronous store closure off the async runtime and applies
/// the fail-soft policy in one place: any storage error is logged and
/// collapsed into `Unavailable`.
pub(crate) async fn run_store<T, F>(op: &'static str, f: F) -> Result<T, Unavailable>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!("{} failed, store treated as unavailable: {:#}", op, e);
            Err(Unavailable)
        }
        Err(e) => {
            warn!("{} worker did not complete: {}", op, e);
            Err(Unavailable)
        }
    }
}

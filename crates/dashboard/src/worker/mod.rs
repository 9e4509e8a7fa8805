pub mod refresher;
pub mod state;
pub mod timer;
pub mod watcher;

use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

pub use refresher::DashboardRefresher;
pub use state::{DashboardState, DashboardStatus};
pub use timer::RefreshTimer;
pub use watcher::BlockWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Timer,
    NewBlock(u64),
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer => write!(f, "timer"),
            Self::NewBlock(height) => write!(f, "new block {height}"),
        }
    }
}

/// Producer side of the refresh queue.
///
/// The queue holds a single pending request: triggers arriving while one is
/// already queued collapse into it, so an in-flight refresh is followed by at
/// most one more.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshReason>,
}

impl RefreshHandle {
    pub(crate) fn channel() -> (Self, mpsc::Receiver<RefreshReason>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Returns `false` when the request was coalesced or the worker is gone.
    pub fn request(&self, reason: RefreshReason) -> bool {
        match self.tx.try_send(reason) {
            Ok(()) => {
                debug!(%reason, "refresh requested");
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(%reason, "refresh already pending, coalescing");
                metrics::counter!("chain_dashboard_refresh_coalesced").increment(1);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%reason, "refresh worker stopped, dropping request");
                false
            }
        }
    }
}

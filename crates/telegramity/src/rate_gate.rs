//! Shared interval ticker limiting how often deliveries may start.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Every waiter consumes one tick, so starts are spaced by `period`.
///
/// The ticker is created on first use so that a gate can be built outside a
/// tokio runtime.
pub(crate) struct RateGate {
    period: Duration,
    ticker: Mutex<Option<Interval>>,
    shutdown: CancellationToken,
}

impl RateGate {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            ticker: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Wait for the next tick.
    ///
    /// Fails with [`Error::Cancelled`] when `cancel` fires first and with
    /// [`Error::Closed`] once the gate is stopped.
    pub(crate) async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.shutdown.cancelled() => Err(Error::Closed),
            _ = self.tick() => Ok(()),
        }
    }

    async fn tick(&self) {
        let mut ticker = self.ticker.lock().await;
        let ticker = ticker.get_or_insert_with(|| {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
    }

    /// Stop ticking and wake every waiter with [`Error::Closed`].
    pub(crate) fn stop(&self) {
        self.shutdown.cancel();
        // Waiters hold the lock only while parked; they release it on shutdown.
        if let Ok(mut ticker) = self.ticker.try_lock() {
            ticker.take();
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

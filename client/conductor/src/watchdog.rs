//! Conductor-side timer policy (§4.4, §5): handshake, stuck-turn,
//! cancel-grace, and provider-status-refresh deadlines. Each watchdog is a
//! one-shot deadline the conductor loop races against incoming events.

use std::time::Duration;

use tokio::time::Instant;
use tokio::time::sleep_until;

/// Handshake must resolve within this long or the workspace runtime is
/// marked in error (§4.4).
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(25);

/// A turn with no forward progress this long is reset (§5).
pub const STUCK_TURN_TIMEOUT: Duration = Duration::from_secs(90);

/// After `cancel`, how long the server gets to actually stop before the
/// connection is reset out from under it (§5).
pub const CANCEL_GRACE: Duration = Duration::from_secs(15);

/// `refresh_provider_status` round trip budget (§4.4).
pub const PROVIDER_STATUS_TIMEOUT: Duration = Duration::from_secs(20);

/// A single armed deadline. `None` means disarmed — `wait()` never
/// resolves, which keeps a `tokio::select!` branch inert without an
/// `Option`-unwrapping dance at every call site.
pub struct Watchdog {
    deadline: Option<Instant>,
}

impl Watchdog {
    pub fn disarmed() -> Self {
        Self { deadline: None }
    }

    pub fn arm(&mut self, timeout: Duration) {
        self.deadline = Some(Instant::now() + timeout);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the armed deadline passes; pending forever otherwise.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::disarmed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn disarmed_watchdog_never_fires() {
        let watchdog = Watchdog::disarmed();
        assert!(!watchdog.is_armed());
        tokio::select! {
            _ = watchdog.wait() => panic!("disarmed watchdog fired"),
            _ = tokio::time::sleep(Duration::from_secs(3600)) => {}
        }
    }

    #[tokio::test(start_paused = true)]
    async fn armed_watchdog_fires_after_its_timeout() {
        let mut watchdog = Watchdog::disarmed();
        watchdog.arm(Duration::from_secs(5));
        assert!(watchdog.is_armed());
        watchdog.wait().await;
    }
}

//! # Maintainer
//!
//! The self-tuning maintenance loop. Each cycle: acquire a fresh store
//! session, project the parameters table into the configuration namespace,
//! release the session, re-derive its own log threshold and poll interval
//! from the (possibly just-updated) namespace, sleep, repeat.
//!
//! ```text
//! parameters table ──► Row Projector ──► ConfigStore
//!        ▲                                   │
//!        │          LOG_LEVEL / RELOAD_CONF  │
//! StoreClient ◄── Maintainer ◄───────────────┘  (re-tune feedback)
//! ```
//!
//! ## Guarantees
//! - At most one cycle in flight; the loop suspends on connect, query and
//!   sleep, never spawning a second concurrent cycle
//! - Acquire and release are paired on every path, including early-failure
//!   paths
//! - Namespace writes of a cycle complete (or the cycle has failed) before
//!   that cycle's re-tune reads them
//! - Stops promptly on the shutdown signal, including mid-sleep
//!
//! ## Usage
//!
//! ```rust,ignore
//! let maintainer = Maintainer::new(MaintainerConfig::default(), namespace, log);
//! let status = maintainer.status_handle();
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! tokio::spawn(maintainer.run(shutdown_rx));
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{keys, ConfigStore};
use crate::logging::LogControl;
use crate::projector;
use crate::store::{ConnectParams, StoreClient, StoreError, PARAMETERS_TABLE};
use crate::tuning::{parse_poll_interval, Verbosity};

// ---------------------------------------------------------------------------
// MaintainerConfig
// ---------------------------------------------------------------------------

/// Configuration for the maintenance loop.
#[derive(Debug, Clone)]
pub struct MaintainerConfig {
    /// Table to project from.
    pub table: String,
    /// Sleep between cycles until the namespace overrides it.
    pub poll_interval: Duration,
    /// Consecutive connect failures tolerated before the loop gives up.
    /// `1` restores a hard stop on the first failed connect.
    pub max_connect_failures: u32,
    /// Base delay before retrying a failed connect; doubles per consecutive
    /// failure.
    pub connect_backoff: Duration,
}

impl Default for MaintainerConfig {
    fn default() -> Self {
        Self {
            table: PARAMETERS_TABLE.to_string(),
            poll_interval: Duration::from_secs(60),
            max_connect_failures: 5,
            connect_backoff: Duration::from_secs(2),
        }
    }
}

// ---------------------------------------------------------------------------
// MaintainerStatus
// ---------------------------------------------------------------------------

/// Loop counters, readable from outside while the loop runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintainerStatus {
    /// Cycles that acquired a session and ran through release.
    pub cycles_completed: u64,
    /// Parameter rows applied to the namespace since start.
    pub rows_applied: u64,
    /// Connect attempts that failed since start.
    pub connect_failures: u64,
    /// Whether the loop is currently running.
    pub running: bool,
    /// Most recent cycle-level error, cleared by the next clean projection.
    pub last_error: Option<String>,
}

/// Cloneable handle to the shared status.
pub type StatusHandle = Arc<Mutex<MaintainerStatus>>;

// ---------------------------------------------------------------------------
// Maintainer
// ---------------------------------------------------------------------------

/// Outcome of one cycle's acquire step, as seen by the outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Keep looping.
    Continue,
    /// Retry budget exhausted; the loop terminates.
    GiveUp,
}

/// The self-tuning loop. Construct, hand out [`status_handle`], then consume
/// with [`run`].
///
/// [`status_handle`]: Maintainer::status_handle
/// [`run`]: Maintainer::run
pub struct Maintainer {
    config: MaintainerConfig,
    namespace: ConfigStore,
    log: Arc<LogControl>,
    status: StatusHandle,
    /// Live sleep duration, overridden by a valid `RELOAD_CONF` each cycle.
    poll_interval: Duration,
    consecutive_connect_failures: u32,
}

impl Maintainer {
    pub fn new(config: MaintainerConfig, namespace: ConfigStore, log: Arc<LogControl>) -> Self {
        let poll_interval = config.poll_interval;
        Self {
            config,
            namespace,
            log,
            status: Arc::new(Mutex::new(MaintainerStatus::default())),
            poll_interval,
            consecutive_connect_failures: 0,
        }
    }

    /// Cloneable handle to the shared status (for the front door and tests).
    pub fn status_handle(&self) -> StatusHandle {
        Arc::clone(&self.status)
    }

    /// Copy of the current status without holding the lock for long.
    pub fn status_snapshot(&self) -> MaintainerStatus {
        self.status.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The sleep duration currently in force.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The log threshold currently in force.
    pub fn verbosity(&self) -> Verbosity {
        self.log.current()
    }

    fn with_status(&self, f: impl FnOnce(&mut MaintainerStatus)) {
        if let Ok(mut status) = self.status.lock() {
            f(&mut status);
        }
    }

    /// Run the loop until the shutdown signal fires or the connect retry
    /// budget is exhausted.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.with_status(|s| s.running = true);
        info!(table = %self.config.table, "maintainer started");

        loop {
            if *shutdown.borrow() {
                info!("shutdown signal received, maintainer stopping");
                break;
            }

            let outcome = self.run_cycle().await;
            self.retune();

            if outcome == CycleOutcome::GiveUp {
                error!(
                    attempts = self.consecutive_connect_failures,
                    "connect retry budget exhausted, maintainer stopping"
                );
                break;
            }

            let delay = self.next_delay();
            debug!(seconds = delay.as_secs_f64(), "maintainer sleeping");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown signal received, maintainer stopping");
                        break;
                    }
                }
            }
        }

        self.with_status(|s| s.running = false);
        info!("maintainer stopped");
    }

    /// One full acquire / project / release pass.
    ///
    /// `pub` so tests can drive cycles without spawning the loop.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        info!("update system config: started");

        let params = match ConnectParams::from_config(&self.namespace) {
            Ok(params) => params,
            Err(e) => return self.note_connect_failure(e),
        };

        let mut client = StoreClient::new();
        if let Err(e) = client.connect(&params).await {
            return self.note_connect_failure(e);
        }
        self.consecutive_connect_failures = 0;

        match projector::project(&mut client, &self.config.table, &self.namespace).await {
            Ok(applied) => {
                self.with_status(|s| {
                    s.rows_applied += applied as u64;
                    s.last_error = None;
                });
                info!(applied, table = %self.config.table, "parameters refreshed");
            }
            Err(e) => {
                self.with_status(|s| s.last_error = Some(e.to_string()));
                error!(error = %e, table = %self.config.table, "projection failed");
            }
        }

        // Release pairs with acquire even when the projection failed.
        if let Err(e) = client.disconnect().await {
            warn!(error = %e, "store disconnect failed");
        }

        self.with_status(|s| s.cycles_completed += 1);
        info!("update system config: ended");
        CycleOutcome::Continue
    }

    /// Re-derive the log threshold and poll interval from the namespace.
    ///
    /// Absent keys keep the current values; invalid values are logged with
    /// guidance and the previous values retained.
    pub fn retune(&mut self) {
        if let Some(raw) = self.namespace.get(keys::LOG_LEVEL) {
            match Verbosity::from_value(&raw) {
                Ok(verbosity) => self.log.apply(verbosity),
                Err(e) => error!(error = %e, "keeping current log threshold"),
            }
        }

        if let Some(raw) = self.namespace.get(keys::RELOAD_CONF) {
            match parse_poll_interval(&raw) {
                Ok(interval) => {
                    if interval != self.poll_interval {
                        info!(seconds = interval.as_secs(), "poll interval updated");
                    }
                    self.poll_interval = interval;
                }
                Err(e) => error!(error = %e, "keeping current poll interval"),
            }
        }
    }

    fn note_connect_failure(&mut self, error: StoreError) -> CycleOutcome {
        self.consecutive_connect_failures = self.consecutive_connect_failures.saturating_add(1);
        self.with_status(|s| {
            s.connect_failures += 1;
            s.last_error = Some(error.to_string());
        });

        if self.consecutive_connect_failures >= self.config.max_connect_failures {
            error!(
                error = %error,
                attempts = self.consecutive_connect_failures,
                "store connect failed"
            );
            CycleOutcome::GiveUp
        } else {
            warn!(
                error = %error,
                attempts = self.consecutive_connect_failures,
                "store connect failed, will retry with backoff"
            );
            CycleOutcome::Continue
        }
    }

    /// Poll interval on a healthy cycle; exponential backoff (capped at 32x
    /// the base) while connects are failing.
    fn next_delay(&self) -> Duration {
        if self.consecutive_connect_failures == 0 {
            self.poll_interval
        } else {
            let shift = (self.consecutive_connect_failures - 1).min(5);
            self.config.connect_backoff.saturating_mul(1u32 << shift)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

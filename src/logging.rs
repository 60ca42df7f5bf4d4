//! # Log Control
//!
//! Global tracing setup with a reloadable filter, so the maintainer can
//! raise or lower the process-wide log threshold at runtime from a value it
//! pulled out of the parameters store, without a restart.

use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::tuning::Verbosity;

type ReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Handle over the live log threshold.
///
/// Wraps the subscriber's reload handle together with the currently-applied
/// [`Verbosity`], so callers can both change the threshold and ask what it
/// is. Shared behind an `Arc` between `main` and the maintainer.
pub struct LogControl {
    handle: Option<ReloadHandle>,
    current: Mutex<Verbosity>,
}

impl LogControl {
    /// Install the global subscriber and return the control handle.
    ///
    /// `RUST_LOG` wins over `default` for the initial filter when set; the
    /// first successful [`apply`](Self::apply) replaces either.
    ///
    /// Must be called at most once per process.
    pub fn init(default: Verbosity) -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default.directive()));
        let (filter, handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();

        Self {
            handle: Some(handle),
            current: Mutex::new(default),
        }
    }

    /// A control with no subscriber attached. Threshold bookkeeping still
    /// works, which is all tests need.
    pub fn disabled(default: Verbosity) -> Self {
        Self {
            handle: None,
            current: Mutex::new(default),
        }
    }

    /// Apply a new threshold to the global filter.
    ///
    /// A failed reload keeps the previous threshold.
    pub fn apply(&self, verbosity: Verbosity) {
        let previous = self.current();
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.reload(EnvFilter::new(verbosity.directive())) {
                warn!(error = %e, "failed to reload log filter, keeping previous threshold");
                return;
            }
        }
        if let Ok(mut cur) = self.current.lock() {
            *cur = verbosity;
        }
        if previous != verbosity {
            info!(from = %previous, to = %verbosity, "log threshold updated");
        }
    }

    /// The threshold currently in force.
    pub fn current(&self) -> Verbosity {
        self.current
            .lock()
            .map(|cur| *cur)
            .unwrap_or(Verbosity::Warning)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

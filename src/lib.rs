//! # paramsync
//!
//! A self-reconfiguring maintenance daemon. A background loop reconnects to
//! a MySQL store every cycle, republishes the `parameters` table into the
//! process-wide configuration namespace, and re-reads its own log threshold
//! and poll interval from that namespace, adjusting both without a restart.
//! A minimal HTTP front door runs alongside and shares nothing but read
//! access to the namespace.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;
pub mod maintainer;
pub mod projector;
pub mod store;
pub mod tuning;
pub mod web;

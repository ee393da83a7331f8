//! # hina-monitor-types
//!
//! Core types for the Hina bot health monitor. This crate defines the schema
//! written to the dashboard export on every monitoring tick, so the web layer
//! can read it without depending on the monitor itself.
//!
//! ## Features
//!
//! - `serde` (default): JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use hina_monitor_types::{HealthSnapshot, HostMetrics, Latency, BotStatus};
//! use std::time::Duration;
//!
//! let snapshot = HealthSnapshot::new(
//!     HostMetrics { cpu_pct: 12.5, memory_pct: 40.0, ..HostMetrics::default() },
//!     Latency::from_duration(Duration::from_millis(180)),
//!     None,
//! );
//!
//! assert_eq!(snapshot.bot_status(), BotStatus::Online);
//! assert_eq!(snapshot.latency.millis(), Some(180.0));
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. The version is included in every
//! dashboard export so consumers can detect format changes.

mod health;
mod snapshot;
mod version;

pub use health::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the dashboard format.
pub const SCHEMA_VERSION: u32 = 1;

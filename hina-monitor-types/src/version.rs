//! Version stamp of the dashboard document.
//!
//! The web layer reads `web_stats.json` without linking against the monitor,
//! so every document carries the layout version it was written with. A reader
//! built for major version N accepts any N.x document and ignores fields it
//! does not know; a different major means fields were renamed or removed.

use std::fmt;

use crate::SCHEMA_VERSION;

/// Layout version written into every [`DashboardSnapshot`](crate::DashboardSnapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaVersion {
    /// Bumped when a dashboard field is renamed, retyped or dropped.
    pub major: u32,
    /// Bumped when fields are only added.
    pub minor: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The layout this build of the monitor writes.
    pub const fn current() -> Self {
        Self::new(SCHEMA_VERSION, 0)
    }

    /// Whether a dashboard reader built against this crate can parse a
    /// document stamped with `self`.
    pub fn is_compatible(&self) -> bool {
        self.major == SCHEMA_VERSION
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

//! Restart and broadcast counting across process restarts.
//!
//! The counter file holds today's restart count and how many "back online"
//! broadcasts have gone out. Both counters reset when the stored day is not
//! today. The number of broadcasts allowed per day grows slowly with the
//! restart count, so a crash loop cannot flood users.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::StoreError;

/// Persisted per-day counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounterState {
    pub date: NaiveDate,
    pub restart_count: u32,
    pub broadcast_count: u32,
    #[serde(default)]
    pub last_save: Option<NaiveDateTime>,
}

impl DailyCounterState {
    /// Zeroed counters for `today`.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            date: today,
            restart_count: 0,
            broadcast_count: 0,
            last_save: None,
        }
    }

    /// Keep the counters if they belong to `today`, otherwise start over.
    pub fn for_day(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::fresh(today)
        }
    }
}

/// How many startup broadcasts are allowed on a day with `restart_count`
/// restarts.
///
/// Note: above 10 restarts the result is `min(4, restart_count / 4)`, which
/// gives 2 at 11 restarts, below the 3 allowed at 7..=10. This step is kept
/// as-is so existing counter files keep their meaning.
pub fn allowed_broadcasts(restart_count: u32) -> u32 {
    match restart_count {
        0..=3 => 1,
        4..=6 => 2,
        7..=10 => 3,
        n => (n / 4).min(4),
    }
}

/// Durable storage for [`DailyCounterState`].
pub trait CounterStore: Send + Sync {
    /// Load the stored state, `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<DailyCounterState>, StoreError>;

    fn save(&self, state: &DailyCounterState) -> Result<(), StoreError>;
}

/// Counter state kept in a small JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonFileStore {
    fn load(&self) -> Result<Option<DailyCounterState>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::json(&self.path, e))
    }

    fn save(&self, state: &DailyCounterState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(|e| StoreError::json(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Outcome of recording a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupDecision {
    /// Send the startup broadcast; `broadcast` is its number today.
    Broadcast {
        restart: u32,
        broadcast: u32,
        allowed: u32,
    },
    /// Today's broadcast budget is used up.
    Skip { restart: u32, allowed: u32 },
}

/// Owns the daily counters and their store.
pub struct RestartCounter {
    store: Box<dyn CounterStore>,
    state: DailyCounterState,
}

impl RestartCounter {
    /// Load the stored counters for `today`.
    ///
    /// An unreadable store is logged and treated as a fresh day.
    pub fn load(store: Box<dyn CounterStore>, today: NaiveDate) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => {
                if state.date != today {
                    info!(stored = %state.date, %today, "new day, resetting restart counters");
                }
                state.for_day(today)
            }
            Ok(None) => {
                info!("no stored monitoring counters, starting fresh");
                DailyCounterState::fresh(today)
            }
            Err(e) => {
                warn!(error = %e, "could not read monitoring counters, starting fresh");
                DailyCounterState::fresh(today)
            }
        };
        Self { store, state }
    }

    pub fn state(&self) -> &DailyCounterState {
        &self.state
    }

    /// Count this restart and decide whether to broadcast.
    ///
    /// The updated state is persisted before returning, whatever the
    /// decision, so the restart is never lost.
    pub fn record_restart(&mut self, today: NaiveDate, now: NaiveDateTime) -> StartupDecision {
        self.roll_over(today);
        self.state.restart_count += 1;

        let restart = self.state.restart_count;
        let allowed = allowed_broadcasts(restart);

        let decision = if self.state.broadcast_count >= allowed {
            info!(restart, allowed, "daily broadcast limit reached");
            StartupDecision::Skip { restart, allowed }
        } else {
            self.state.broadcast_count += 1;
            StartupDecision::Broadcast {
                restart,
                broadcast: self.state.broadcast_count,
                allowed,
            }
        };

        self.persist(now);
        decision
    }

    /// Write the current state. Failures are logged, never returned.
    pub fn persist(&mut self, now: NaiveDateTime) -> bool {
        self.state.last_save = Some(now);
        match self.store.save(&self.state) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to persist monitoring counters");
                false
            }
        }
    }

    fn roll_over(&mut self, today: NaiveDate) {
        if self.state.date != today {
            self.state = DailyCounterState::fresh(today);
        }
    }
}

impl std::fmt::Debug for RestartCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestartCounter")
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn noon(d: u32) -> NaiveDateTime {
        day(d).and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn allowed_broadcast_buckets() {
        for n in 1..=3 {
            assert_eq!(allowed_broadcasts(n), 1, "restart {}", n);
        }
        for n in 4..=6 {
            assert_eq!(allowed_broadcasts(n), 2, "restart {}", n);
        }
        for n in 7..=10 {
            assert_eq!(allowed_broadcasts(n), 3, "restart {}", n);
        }
    }

    #[test]
    fn allowed_broadcasts_non_decreasing_through_ten() {
        for n in 1..10 {
            assert!(allowed_broadcasts(n) <= allowed_broadcasts(n + 1));
        }
    }

    #[test]
    fn allowed_broadcasts_above_ten_keeps_quarter_step() {
        // Drops from 3 to 2 at 11 restarts; see allowed_broadcasts docs.
        assert_eq!(allowed_broadcasts(11), 2);
        assert_eq!(allowed_broadcasts(12), 3);
        assert_eq!(allowed_broadcasts(16), 4);
        assert_eq!(allowed_broadcasts(100), 4);
    }

    #[test]
    fn yesterday_state_resets_on_load() {
        let store = MemoryStore::with_state(DailyCounterState {
            date: day(13),
            restart_count: 9,
            broadcast_count: 3,
            last_save: None,
        });
        let counter = RestartCounter::load(Box::new(store), day(14));

        assert_eq!(counter.state().restart_count, 0);
        assert_eq!(counter.state().broadcast_count, 0);
        assert_eq!(counter.state().date, day(14));
    }

    #[test]
    fn first_restart_of_the_day_broadcasts() {
        let store = MemoryStore::default();
        let mut counter = RestartCounter::load(Box::new(store.clone()), day(14));

        let decision = counter.record_restart(day(14), noon(14));
        assert_eq!(
            decision,
            StartupDecision::Broadcast {
                restart: 1,
                broadcast: 1,
                allowed: 1
            }
        );

        let saved = store.saved().unwrap();
        assert_eq!(saved.restart_count, 1);
        assert_eq!(saved.broadcast_count, 1);
        assert_eq!(saved.last_save, Some(noon(14)));
    }

    #[test]
    fn fourth_restart_with_budget_spent_is_skipped_but_counted() {
        let store = MemoryStore::with_state(DailyCounterState {
            date: day(14),
            restart_count: 3,
            broadcast_count: 2,
            last_save: None,
        });
        let mut counter = RestartCounter::load(Box::new(store.clone()), day(14));

        let decision = counter.record_restart(day(14), noon(14));
        assert_eq!(decision, StartupDecision::Skip { restart: 4, allowed: 2 });
        assert_eq!(store.saved().unwrap().restart_count, 4);
        assert_eq!(store.saved().unwrap().broadcast_count, 2);
    }

    #[test]
    fn crash_loop_sends_at_most_the_allowed_broadcasts() {
        let store = MemoryStore::default();
        let mut broadcasts = 0;
        for _ in 0..10 {
            let mut counter = RestartCounter::load(Box::new(store.clone()), day(14));
            if let StartupDecision::Broadcast { .. } = counter.record_restart(day(14), noon(14)) {
                broadcasts += 1;
            }
        }
        // Restarts 1, 4 and 7 open a new slot.
        assert_eq!(broadcasts, 3);
        assert_eq!(store.saved().unwrap().restart_count, 10);
    }

    #[test]
    fn day_rollover_mid_process_resets() {
        let mut counter = RestartCounter::load(Box::new(MemoryStore::default()), day(14));
        counter.record_restart(day(14), noon(14));
        let decision = counter.record_restart(day(15), noon(15));
        assert_eq!(
            decision,
            StartupDecision::Broadcast {
                restart: 1,
                broadcast: 1,
                allowed: 1
            }
        );
    }

    #[test]
    fn failed_save_keeps_in_memory_state() {
        let store = MemoryStore::failing();
        let mut counter = RestartCounter::load(Box::new(store), day(14));

        counter.record_restart(day(14), noon(14));
        assert_eq!(counter.state().restart_count, 1);
        assert!(!counter.persist(noon(14)));
    }

    #[test]
    fn json_store_round_trips_through_a_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("monitoring_data.json"));
        assert!(store.load().unwrap().is_none());

        let mut counter = RestartCounter::load(Box::new(store.clone()), day(14));
        counter.record_restart(day(14), noon(14));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.date, day(14));
        assert_eq!(loaded.restart_count, 1);
    }

    #[test]
    fn json_store_reads_legacy_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoring_data.json");
        fs::write(
            &path,
            r#"{"date": "2026-10-14", "restart_count": 2, "broadcast_count": 1,
                "last_save": "2026-10-14T08:30:00.123456"}"#,
        )
        .unwrap();

        let state = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(state.restart_count, 2);
        assert_eq!(state.broadcast_count, 1);
        assert!(state.last_save.is_some());
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoring_data.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json { .. })));

        let counter = RestartCounter::load(Box::new(store), day(14));
        assert_eq!(counter.state(), &DailyCounterState::fresh(day(14)));
    }
}

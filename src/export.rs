//! Output backends for the dashboard snapshot.

use std::path::PathBuf;

use hina_monitor_types::DashboardSnapshot;

use crate::error::StoreError;

/// Destination for per-tick dashboard snapshots.
#[derive(Debug)]
pub enum DashboardOutput {
    /// Write snapshots to a JSON file.
    ///
    /// The file is replaced atomically with each snapshot.
    File(PathBuf),

    /// Send snapshots through a channel.
    ///
    /// Use `DashboardOutput::channel()` to create this variant and get the receiver.
    Channel(tokio::sync::mpsc::Sender<DashboardSnapshot>),
}

impl DashboardOutput {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hina_monitor::DashboardOutput;
    ///
    /// let output = DashboardOutput::file("web_stats.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DashboardOutput::File(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// A full channel drops the snapshot rather than stalling the tick.
    ///
    /// ```rust
    /// use hina_monitor::DashboardOutput;
    ///
    /// # tokio_test::block_on(async {
    /// let (output, mut rx) = DashboardOutput::channel(8);
    /// drop(output);
    /// assert!(rx.recv().await.is_none());
    /// # });
    /// ```
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<DashboardSnapshot>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (DashboardOutput::Channel(tx), rx)
    }

    /// Emit a snapshot to this output.
    pub(crate) async fn emit(&self, snapshot: &DashboardSnapshot) -> Result<(), StoreError> {
        match self {
            DashboardOutput::File(path) => {
                let json = serde_json::to_string_pretty(snapshot)
                    .map_err(|e| StoreError::json(path, e))?;

                // Readers must never see a half-written file.
                let mut tmp = path.clone().into_os_string();
                tmp.push(".tmp");
                let tmp = PathBuf::from(tmp);

                tokio::fs::write(&tmp, json)
                    .await
                    .map_err(|e| StoreError::io(&tmp, e))?;
                tokio::fs::rename(&tmp, path)
                    .await
                    .map_err(|e| StoreError::io(path, e))?;
            }
            DashboardOutput::Channel(tx) => {
                // Best effort send (don't block if channel is full)
                let _ = tx.try_send(snapshot.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hina_monitor_types::{HealthLevel, HealthSnapshot, HostMetrics, Latency, UsageStats};
    use tempfile::TempDir;

    fn dashboard() -> DashboardSnapshot {
        DashboardSnapshot::new(
            HealthSnapshot::new(HostMetrics::default(), Latency::Millis(120.0), Some(true)),
            HealthLevel::Good,
            Vec::new(),
            UsageStats {
                total_users: 3,
                ..UsageStats::default()
            },
            "5m".to_string(),
        )
    }

    #[tokio::test]
    async fn file_output_writes_readable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("web_stats.json");
        let output = DashboardOutput::file(&path);

        output.emit(&dashboard()).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["bot"]["status"], "online");
        assert_eq!(value["bot"]["latency_ms"], 120.0);
        assert_eq!(value["database"]["total_users"], 3);
        assert_eq!(value["level"], "good");
        assert!(!dir.path().join("web_stats.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_output_into_missing_directory_fails() {
        let output = DashboardOutput::file("/nonexistent/dir/web_stats.json");
        assert!(matches!(
            output.emit(&dashboard()).await,
            Err(StoreError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn channel_output_delivers_snapshot() {
        let (output, mut rx) = DashboardOutput::channel(4);
        output.emit(&dashboard()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.database.total_users, 3);
    }
}

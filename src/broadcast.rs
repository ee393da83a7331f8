//! Sequential startup broadcast to active identities.

use std::time::Duration;

use tracing::{debug, info};

use crate::gateway::{Identity, MessagingGateway};

/// Delivery counts of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Send `text` to each recipient in turn, pausing `delay` between sends.
///
/// Sends are sequential to stay under gateway rate limits. A failed
/// recipient is logged and skipped.
pub async fn fan_out(
    gateway: &dyn MessagingGateway,
    recipients: &[Identity],
    text: &str,
    delay: Duration,
) -> BroadcastReport {
    let mut report = BroadcastReport {
        recipients: recipients.len(),
        ..BroadcastReport::default()
    };

    for (i, recipient) in recipients.iter().enumerate() {
        match gateway.send_message(*recipient, text).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                debug!(%recipient, error = %e, "broadcast delivery failed");
                report.failed += 1;
            }
        }

        if i + 1 < recipients.len() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        delivered = report.delivered,
        failed = report.failed,
        "broadcast finished"
    );
    report
}

//! Plain-text notifications sent to the owner and to active users.

use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, Local};
use hina_monitor_types::{HealthLevel, HealthSnapshot, HostMetrics, UsageStats};

use crate::counter::DailyCounterState;
use crate::duration::format_uptime;
use crate::history::PingHistory;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Alert for a category with its line items.
pub fn alert(category: &str, level: HealthLevel, lines: &[String], at: DateTime<Local>) -> String {
    let mut text = format!("[{}] System alert: {}\n\n", level.symbol(), category);
    for line in lines {
        let _ = writeln!(text, "- {}", line);
    }
    let _ = write!(text, "\nTime: {}", at.format(TIME_FORMAT));
    text
}

/// Detailed warning sent when the host is critical.
pub fn critical_warning(snapshot: &HealthSnapshot, level: HealthLevel, lines: &[String]) -> String {
    let host = &snapshot.host;
    let mut text = format!(
        "Monitoring warning\n\nLevel: {}\nTime: {}\nUptime: {}\n\n",
        level.as_str().to_uppercase(),
        snapshot.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        format_uptime(snapshot.uptime()),
    );
    let _ = writeln!(text, "Memory: {:.1}%", host.memory_pct);
    let _ = writeln!(text, "CPU: {:.1}%", host.cpu_pct);
    let _ = writeln!(text, "Disk: {:.1}%", host.disk_pct);
    let _ = writeln!(text, "Ping: {}", snapshot.latency);
    if !lines.is_empty() {
        text.push('\n');
        for line in lines {
            let _ = writeln!(text, "- {}", line);
        }
    }
    text.push_str("\nThe bot may need a restart soon.");
    text
}

/// "Back online" broadcast sent to active users at startup.
pub fn startup(restart: u32, broadcast: u32, allowed: u32, at: DateTime<Local>) -> String {
    format!(
        "The bot is back online!\n\n\
         Back since: {}\n\
         Restart number today: {}\n\
         Broadcast {} of {}\n\n\
         Ready for commands.",
        at.format("%H:%M:%S"),
        restart,
        broadcast,
        allowed
    )
}

/// Notice sent to the owner when the monitor stops.
pub fn shutdown(reason: &str, uptime: Duration, restarts_today: u32, at: DateTime<Local>) -> String {
    format!(
        "Bot shutting down\n\n\
         Time: {}\n\
         Uptime: {}\n\
         Restarts today: {}\n\
         Reason: {}",
        at.format(TIME_FORMAT),
        format_uptime(uptime),
        restarts_today,
        reason
    )
}

/// Daily usage and host report for the owner.
pub fn daily_report(stats: &UsageStats, host: &HostMetrics, at: DateTime<Local>) -> String {
    format!(
        "Daily bot report\n\n\
         Users\n\
         - total users: {}\n\
         - active users: {}\n\
         - total groups: {}\n\
         - total commands: {}\n\n\
         System\n\
         - CPU: {:.1}%\n\
         - memory: {:.1}%\n\
         - disk: {:.1}%\n\
         - uptime: {}\n\n\
         Date: {}",
        stats.total_users,
        stats.active_users,
        stats.total_groups,
        stats.total_commands,
        host.cpu_pct,
        host.memory_pct,
        host.disk_pct,
        format_uptime(host.uptime()),
        at.format(TIME_FORMAT)
    )
}

/// Summary of recent probes and today's counters.
pub fn stats_summary(history: &PingHistory, counters: &DailyCounterState, uptime: Duration) -> String {
    let Some(average) = history.average_recent(10) else {
        return "No monitoring data available yet".to_string();
    };

    let mut text = format!(
        "Monitoring stats\n\n\
         Average ping: {:.0}ms\n\
         Restarts today: {}\n\
         Broadcasts today: {}\n\
         Uptime: {}\n\n\
         Last 5 pings:\n",
        average,
        counters.restart_count,
        counters.broadcast_count,
        format_uptime(uptime)
    );
    for sample in history.recent(5) {
        let _ = writeln!(text, "- {} - {:.0}ms", sample.time.format("%H:%M"), sample.ping_ms);
    }
    text
}

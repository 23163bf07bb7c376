//! Battery charge projection: a linear estimate of remaining runtime from the
//! current percentage and the time elapsed since the last full charge.
//! Independent of reminder scheduling.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatteryStatus {
    pub percentage: u8,
    pub last_full_charge: Option<DateTime<Utc>>,
}

impl BatteryStatus {
    /// Percentage from the host's raw level/scale pair; `None` when the host
    /// reports garbage.
    pub fn percentage_from_level(level: i32, scale: i32) -> Option<u8> {
        if level < 0 || scale <= 0 {
            return None;
        }
        Some(((level * 100) / scale).clamp(0, 100) as u8)
    }

    pub fn time_since_full_charge(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last_full = self.last_full_charge?;
        if last_full <= now { Some(now - last_full) } else { None }
    }

    /// Linear projection: the charge consumed since the last full charge is
    /// extrapolated over the remaining percentage. `None` when the last full
    /// charge is unknown, the percentage is at either extreme, or the clock
    /// went backwards.
    pub fn estimated_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last_full = self.last_full_charge?;
        if self.percentage == 0 || self.percentage >= 100 {
            return None;
        }

        let elapsed = now - last_full;
        if elapsed <= Duration::zero() {
            return None;
        }

        let consumed = i64::from(100 - self.percentage);
        let remaining_millis = elapsed.num_milliseconds() * i64::from(self.percentage) / consumed;
        Some(Duration::milliseconds(remaining_millis))
    }
}

/// "2d 3h 4m" style formatting for the status cards; sub-minute durations
/// read "<1m" and non-positive ones "Just now".
pub fn format_duration(duration: Duration) -> String {
    if duration <= Duration::zero() {
        return "Just now".to_string();
    }

    let total_minutes = duration.num_minutes();
    let days = total_minutes / (60 * 24);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }

    if parts.is_empty() {
        "<1m".to_string()
    } else {
        parts.join(" ")
    }
}

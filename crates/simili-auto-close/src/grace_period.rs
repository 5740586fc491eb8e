//! Grace-period resolution.
//!
//! Exactly one source decides the grace duration, highest precedence first:
//! a strictly positive per-run override in minutes, a strictly positive
//! configured hours value, then [`DEFAULT_GRACE_PERIOD_HOURS`].

use chrono::{DateTime, Duration, Utc};

pub use simili_config::policy::DEFAULT_GRACE_PERIOD_HOURS;
/// Upper bound keeping grace arithmetic far from chrono's limits.
const MAX_GRACE_MINUTES: u64 = 100 * 365 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceSource {
    Override,
    Configured,
    Default,
}

impl GraceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Configured => "configured",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod {
    pub minutes: u64,
    pub source: GraceSource,
}

impl GracePeriod {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes.min(MAX_GRACE_MINUTES) as i64)
    }

    /// Instant at which an issue labeled at `labeled_at` becomes eligible.
    pub fn deadline(&self, labeled_at: DateTime<Utc>) -> DateTime<Utc> {
        labeled_at
            .checked_add_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Human-readable form, e.g. `72 hours` or `5 minutes`.
    pub fn describe(&self) -> String {
        let (value, unit) = if self.minutes > 0 && self.minutes % 60 == 0 {
            (self.minutes / 60, "hour")
        } else {
            (self.minutes, "minute")
        };
        if value == 1 {
            format!("1 {unit}")
        } else {
            format!("{value} {unit}s")
        }
    }
}

pub fn resolve_grace_period(
    override_minutes: Option<u64>,
    configured_hours: Option<u64>,
) -> GracePeriod {
    if let Some(minutes) = override_minutes.filter(|minutes| *minutes > 0) {
        return GracePeriod {
            minutes,
            source: GraceSource::Override,
        };
    }
    if let Some(hours) = configured_hours.filter(|hours| *hours > 0) {
        return GracePeriod {
            minutes: hours.saturating_mul(60),
            source: GraceSource::Configured,
        };
    }
    GracePeriod {
        minutes: DEFAULT_GRACE_PERIOD_HOURS * 60,
        source: GraceSource::Default,
    }
}

pub fn deadline(
    labeled_at: DateTime<Utc>,
    override_minutes: Option<u64>,
    configured_hours: Option<u64>,
) -> DateTime<Utc> {
    resolve_grace_period(override_minutes, configured_hours).deadline(labeled_at)
}

/// Inclusive: reaching the deadline exactly counts as expired.
pub fn is_expired(now: DateTime<Utc>, deadline: DateTime<Utc>) -> bool {
    now >= deadline
}

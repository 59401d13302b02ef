//! Orchestrator configuration.

use chrono::Duration;

const DEFAULT_TTL_HOURS: i64 = 24;
const DEFAULT_SWEEP_SECS: u64 = 60;
const MIN_SWEEP_SECS: u64 = 60;
const MAX_SWEEP_SECS: u64 = 300;

/// Runtime configuration, loaded from the environment with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long an inventory hold lives before the sweeper may release it.
    pub reservation_ttl: Duration,

    /// How often the sweeper scans for expired holds. Clamped to 1..=5
    /// minutes so a typo cannot turn the sweeper into a busy loop or stall
    /// it entirely.
    pub sweep_interval: std::time::Duration,
}

impl Config {
    /// Loads configuration from `RESERVATION_TTL_HOURS` and
    /// `SWEEP_INTERVAL_SECS`, falling back to defaults for anything unset or
    /// unparseable.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var("RESERVATION_TTL_HOURS").ok(),
            std::env::var("SWEEP_INTERVAL_SECS").ok(),
        )
    }

    fn resolve(ttl_hours: Option<String>, sweep_secs: Option<String>) -> Self {
        let ttl_hours = ttl_hours
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&h| h > 0)
            .unwrap_or(DEFAULT_TTL_HOURS);

        let sweep_secs = sweep_secs
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SWEEP_SECS)
            .clamp(MIN_SWEEP_SECS, MAX_SWEEP_SECS);

        Self {
            reservation_ttl: Duration::hours(ttl_hours),
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

use std::time::Duration;

use hotelier_core::config::{env_or, ConfigError};

/// Intervals and switches for the reconciliation scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Start the periodic tasks at boot.
    pub enabled: bool,
    /// Full recompute of every checked-in stay.
    pub reconcile_interval: Duration,
    /// Recompute of stays past their expected check-out.
    pub late_checkout_interval: Duration,
    pub daily_summary_interval: Duration,
    /// Upper bound on waiting for in-flight passes at shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconcile_interval: Duration::from_secs(3600),
            late_checkout_interval: Duration::from_secs(900),
            daily_summary_interval: Duration::from_secs(86_400),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `SCHEDULER_ENABLED`           | `true`  |
    /// | `RECONCILE_INTERVAL_SECS`     | `3600`  |
    /// | `LATE_CHECKOUT_SWEEP_SECS`    | `900`   |
    /// | `DAILY_SUMMARY_INTERVAL_SECS` | `86400` |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            enabled: env_or("SCHEDULER_ENABLED", defaults.enabled)?,
            reconcile_interval: secs("RECONCILE_INTERVAL_SECS", defaults.reconcile_interval)?,
            late_checkout_interval: secs(
                "LATE_CHECKOUT_SWEEP_SECS",
                defaults.late_checkout_interval,
            )?,
            daily_summary_interval: secs(
                "DAILY_SUMMARY_INTERVAL_SECS",
                defaults.daily_summary_interval,
            )?,
            shutdown_timeout: secs("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout)?,
        })
    }
}

/// A positive number of seconds.
fn secs(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let value: u64 = env_or(key, default.as_secs())?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(Duration::from_secs(value))
}

//! When to offer an automatic plugin update.
//!
//! Two triggers exist: the host was upgraded since the last update, or more
//! than `interval_days` passed since then. Each trigger has its own
//! [`UpdatePolicy`].
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::kernel::constants::DEFAULT_UPDATE_INTERVAL_DAYS;
use crate::kernel::environment::HostVersion;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Ask the user first
    #[default]
    Ask,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTrigger {
    HostUpgraded { last: u32, current: u32 },
    IntervalElapsed { days: u64 },
}

impl fmt::Display for UpdateTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateTrigger::HostUpgraded { last, current } => {
                write!(f, "The host was updated from version {} to {} since the last plugin update", last, current)
            }
            UpdateTrigger::IntervalElapsed { days } => {
                write!(f, "Plugins were last updated {} days ago", days)
            }
        }
    }
}

fn default_interval() -> u32 {
    DEFAULT_UPDATE_INTERVAL_DAYS
}

/// Persisted update bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSettings {
    #[serde(default)]
    pub version_policy: UpdatePolicy,
    #[serde(default)]
    pub time_policy: UpdatePolicy,
    #[serde(default = "default_interval")]
    pub interval_days: u32,
    /// Unix seconds of the last full update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_host_version: Option<u32>,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            version_policy: UpdatePolicy::default(),
            time_policy: UpdatePolicy::default(),
            interval_days: DEFAULT_UPDATE_INTERVAL_DAYS,
            last_update: None,
            last_host_version: None,
        }
    }
}

impl UpdateSettings {
    /// Returns the trigger that fires at `now` and the policy that applies to it.
    ///
    /// Without a recorded last update time, or with a zero interval, `now` is
    /// recorded and the time trigger stays quiet.
    pub fn pending_trigger(&mut self, host: HostVersion, now: u64) -> Option<(UpdateTrigger, UpdatePolicy)> {
        if let (Some(last), HostVersion::Known(current)) = (self.last_host_version, host) {
            if last < current {
                return Some((UpdateTrigger::HostUpgraded { last, current }, self.version_policy));
            }
        }

        match self.last_update {
            Some(last) if last > 0 && self.interval_days > 0 => {
                let days = now.saturating_sub(last) / SECONDS_PER_DAY;
                if days > u64::from(self.interval_days) {
                    return Some((UpdateTrigger::IntervalElapsed { days }, self.time_policy));
                }
                None
            }
            _ => {
                self.last_update = Some(now);
                None
            }
        }
    }

    /// Stores the time and host version of a completed full update
    pub fn record_update(&mut self, host: HostVersion, now: u64) {
        self.last_update = Some(now);
        if let Some(version) = host.known() {
            self.last_host_version = Some(version);
        }
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

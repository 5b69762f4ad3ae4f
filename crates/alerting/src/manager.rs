//! Notification throttling

use alertness::NotificationKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Notification throttling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Minimum time between two notifications of the same kind (milliseconds)
    pub cooldown_ms: u64,
    /// Maximum notifications per hour across all kinds
    pub max_per_hour: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 60_000,
            max_per_hour: 10,
        }
    }
}

/// Delivery history of one notification kind
#[derive(Debug, Clone)]
struct NotificationState {
    last_sent: Instant,
    send_count: usize,
}

/// Cooldown and hourly cap for outgoing notifications
pub struct NotificationManager {
    config: NotificationConfig,
    states: HashMap<NotificationKind, NotificationState>,
    hourly_count: usize,
    hour_start: Instant,
}

impl NotificationManager {
    pub fn new(config: NotificationConfig) -> Self {
        info!("Creating notification manager with config: {:?}", config);
        Self {
            config,
            states: HashMap::new(),
            hourly_count: 0,
            hour_start: Instant::now(),
        }
    }

    /// Check whether a notification of `kind` may go out at `now`
    pub fn should_send(&mut self, kind: NotificationKind, now: Instant) -> bool {
        if now.saturating_duration_since(self.hour_start) > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = now;
        }

        if self.hourly_count >= self.config.max_per_hour {
            warn!("Notification throttled: max notifications per hour reached");
            return false;
        }

        if let Some(state) = self.states.get(&kind) {
            let cooldown = Duration::from_millis(self.config.cooldown_ms);
            if now.saturating_duration_since(state.last_sent) < cooldown {
                debug!("Notification {} suppressed: in cooldown period", kind.as_str());
                return false;
            }
        }

        true
    }

    /// Record that a notification was sent at `now`
    pub fn record_sent(&mut self, kind: NotificationKind, now: Instant) {
        self.hourly_count += 1;

        let state = self.states.entry(kind).or_insert(NotificationState {
            last_sent: now,
            send_count: 0,
        });
        state.last_sent = now;
        state.send_count += 1;

        debug!("Notification recorded: {} (count: {})", kind.as_str(), state.send_count);
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

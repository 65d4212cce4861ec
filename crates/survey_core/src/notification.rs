//! Transient message banner shown to the visitor.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::domain::Severity;
use tracing::debug;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

pub trait NotificationSurface: Send + Sync {
    fn show(&self, message: &str, severity: Severity);
    fn dismiss(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub shown_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BannerState {
    current: Option<Notice>,
    generation: u64,
}

/// Banner holding at most one notice. A new notice replaces the current one
/// and each notice is dismissed after the configured time unless replaced
/// first.
#[derive(Debug, Clone)]
pub struct NotificationBanner {
    ttl: Duration,
    state: Arc<Mutex<BannerState>>,
}

impl Default for NotificationBanner {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationBanner {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Arc::new(Mutex::new(BannerState::default())),
        }
    }

    pub fn current(&self) -> Option<Notice> {
        lock(&self.state).current.clone()
    }

    fn schedule_dismiss(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("notification: no runtime, notice stays until dismissed");
            return;
        };
        let state = Arc::clone(&self.state);
        let ttl = self.ttl;
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut guard = lock(&state);
            // Only expire the notice this timer was started for.
            if guard.generation == generation {
                guard.current = None;
            }
        });
    }
}

impl NotificationSurface for NotificationBanner {
    fn show(&self, message: &str, severity: Severity) {
        let generation = {
            let mut guard = lock(&self.state);
            guard.generation += 1;
            guard.current = Some(Notice {
                message: message.to_string(),
                severity,
                shown_at: Utc::now(),
            });
            guard.generation
        };
        self.schedule_dismiss(generation);
    }

    fn dismiss(&self) {
        let mut guard = lock(&self.state);
        guard.generation += 1;
        guard.current = None;
    }
}

fn lock(state: &Mutex<BannerState>) -> MutexGuard<'_, BannerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

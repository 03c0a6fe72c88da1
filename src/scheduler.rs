//! Repeating reminder timer.
//!
//! At most one timer task is live at a time. Every (re)arm bumps a generation
//! counter under the scheduler lock and aborts the previous task; a task whose
//! generation is stale when it wakes exits without firing.

use crate::clock::Clock;
use crate::models::ReminderConfig;
use chrono::{DateTime, Local};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Emitted each time the timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFired {
    pub at: DateTime<Local>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Disabled,
    Armed { next_fire_at: DateTime<Local> },
}

struct Armed {
    next_fire_at: DateTime<Local>,
    handle: JoinHandle<()>,
}

struct Inner {
    config: ReminderConfig,
    generation: u64,
    armed: Option<Armed>,
}

struct Shared {
    clock: Arc<dyn Clock>,
    fire_tx: mpsc::UnboundedSender<ReminderFired>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct ReminderScheduler {
    shared: Arc<Shared>,
}

impl ReminderScheduler {
    /// Starts disabled. Call [`apply`](Self::apply) with the loaded config.
    pub fn new(clock: Arc<dyn Clock>, fire_tx: mpsc::UnboundedSender<ReminderFired>) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                fire_tx,
                inner: Mutex::new(Inner {
                    config: ReminderConfig::default(),
                    generation: 0,
                    armed: None,
                }),
            }),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.shared.lock();
        if inner.config.enabled == enabled {
            return;
        }
        inner.config.enabled = enabled;
        self.rearm(&mut inner);
    }

    pub fn set_interval(&self, minutes: NonZeroU32) {
        let mut inner = self.shared.lock();
        if inner.config.interval_minutes == minutes.get() {
            return;
        }
        inner.config.interval_minutes = minutes.get();
        self.rearm(&mut inner);
    }

    /// Applies both fields at once, restarting at most one timer.
    pub fn apply(&self, config: ReminderConfig) {
        let mut inner = self.shared.lock();
        let config = ReminderConfig {
            interval_minutes: config.interval_minutes.max(1),
            ..config
        };
        if inner.config == config && (inner.armed.is_some() == config.enabled) {
            return;
        }
        inner.config = config;
        self.rearm(&mut inner);
    }

    pub fn current_next_fire_time(&self) -> Option<DateTime<Local>> {
        self.shared.lock().armed.as_ref().map(|armed| armed.next_fire_at)
    }

    pub fn config(&self) -> ReminderConfig {
        self.shared.lock().config
    }

    pub fn state(&self) -> SchedulerState {
        match self.shared.lock().armed.as_ref() {
            Some(armed) => SchedulerState::Armed {
                next_fire_at: armed.next_fire_at,
            },
            None => SchedulerState::Disabled,
        }
    }

    /// Cancels the pending timer and disables the reminder.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        inner.config.enabled = false;
        cancel(&mut inner);
    }

    fn rearm(&self, inner: &mut Inner) {
        cancel(inner);
        if !inner.config.enabled {
            info!("reminder disabled");
            return;
        }

        let generation = inner.generation;
        let interval = inner.config.interval();
        let next_fire_at = self.shared.clock.now() + chrono_interval(interval);
        let handle = tokio::spawn(run_timer(Arc::clone(&self.shared), generation, interval));
        inner.armed = Some(Armed {
            next_fire_at,
            handle,
        });
        info!(
            interval_minutes = inner.config.interval_minutes,
            next_fire_at = %next_fire_at.format("%H:%M"),
            "reminder armed"
        );
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        cancel(&mut self.shared.lock());
    }
}

fn cancel(inner: &mut Inner) {
    inner.generation = inner.generation.wrapping_add(1);
    if let Some(armed) = inner.armed.take() {
        armed.handle.abort();
    }
}

async fn run_timer(shared: Arc<Shared>, generation: u64, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        let now = shared.clock.now();
        if shared.fire_tx.send(ReminderFired { at: now, generation }).is_err() {
            debug!("no reminder listener, fire dropped");
        } else {
            debug!(generation, "reminder fired");
        }
        if let Some(armed) = inner.armed.as_mut() {
            armed.next_fire_at = now + chrono_interval(interval);
        }
    }
}

fn chrono_interval(interval: Duration) -> chrono::Duration {
    chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::MAX)
}

use crate::permission::{Permission, PermissionGate};
use crate::scheduler::ReminderFired;
use crate::tracker::Tracker;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const REMINDER_TAG: &str = "water-reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub amount_ml: u32,
    pub remaining_ml: u32,
}

impl Notification {
    pub fn reminder(amount_ml: u32, remaining_ml: u32) -> Self {
        Self {
            title: "Time to drink some water!".to_string(),
            body: format!(
                "Drink {amount_ml}ml of water to stay healthy.\n{remaining_ml}ml left to reach today's goal."
            ),
            tag: REMINDER_TAG.to_string(),
            amount_ml,
            remaining_ml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Clicked,
    Closed,
}

/// A notification on screen. `interaction` resolves at most once.
#[derive(Debug)]
pub struct Presented {
    pub id: NotificationId,
    pub interaction: oneshot::Receiver<Interaction>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification refused: {0}")]
    Refused(String),
}

#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    async fn present(&self, notification: Notification) -> Result<Presented, DispatchError>;

    async fn dismiss(&self, id: NotificationId);
}

#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// `false` covers both "no" and a dismissed prompt.
    async fn confirm(&self, message: String) -> bool;
}

/// The "add water" action a reminder can trigger.
#[async_trait]
pub trait IntakeRecorder: Send + Sync {
    async fn record_drink(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Notified(NotificationId),
}

pub struct NotificationDispatcher {
    gate: Arc<dyn PermissionGate>,
    platform: Arc<dyn NotificationPlatform>,
    prompt: Arc<dyn ConfirmPrompt>,
    recorder: Arc<dyn IntakeRecorder>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        platform: Arc<dyn NotificationPlatform>,
        prompt: Arc<dyn ConfirmPrompt>,
        recorder: Arc<dyn IntakeRecorder>,
    ) -> Self {
        Self {
            gate,
            platform,
            prompt,
            recorder,
            timeout: NOTIFICATION_TIMEOUT,
        }
    }

    pub async fn dispatch(&self, amount_ml: u32, remaining_ml: u32) -> Option<DispatchOutcome> {
        let mut permission = self.gate.current();
        if permission == Permission::Default {
            permission = self.gate.request_permission().await;
        }
        if !permission.is_granted() {
            let message = format!("Time to drink some water!\n\nDrink {amount_ml}ml now?");
            if self.prompt.confirm(message).await {
                debug!(amount_ml, "reminder confirmed");
                self.recorder.record_drink().await;
            }
            return None;
        }

        let notification = Notification::reminder(amount_ml, remaining_ml);
        match self.platform.present(notification).await {
            Ok(presented) => {
                let id = presented.id;
                debug!(%id, amount_ml, remaining_ml, "reminder notification shown");
                tokio::spawn(await_interaction(
                    Arc::clone(&self.platform),
                    Arc::clone(&self.recorder),
                    presented,
                    self.timeout,
                ));
                Some(DispatchOutcome::Notified(id))
            }
            Err(err) => {
                error!("failed to send reminder notification: {err}");
                None
            }
        }
    }
}

async fn await_interaction(
    platform: Arc<dyn NotificationPlatform>,
    recorder: Arc<dyn IntakeRecorder>,
    presented: Presented,
    timeout: Duration,
) {
    let id = presented.id;
    match tokio::time::timeout(timeout, presented.interaction).await {
        Ok(Ok(Interaction::Clicked)) => {
            recorder.record_drink().await;
            platform.dismiss(id).await;
        }
        Ok(Ok(Interaction::Closed)) | Ok(Err(_)) => {
            debug!(%id, "reminder notification closed");
        }
        Err(_) => {
            debug!(%id, "reminder notification timed out");
            platform.dismiss(id).await;
        }
    }
}

/// Turns scheduler fires into dispatches, one task per fire.
pub fn spawn_dispatch_loop(
    mut fires: mpsc::UnboundedReceiver<ReminderFired>,
    tracker: Arc<Tracker>,
    dispatcher: Arc<NotificationDispatcher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(fired) = fires.recv().await {
            let (amount_ml, remaining_ml) = tracker.reminder_payload().await;
            info!(at = %fired.at.format("%H:%M"), amount_ml, remaining_ml, "reminder due");
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher.dispatch(amount_ml, remaining_ml).await;
            });
        }
        debug!("reminder channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{DEFAULT_DRINK_AMOUNT_ML, ProfileId, SettingsUpdate};
    use crate::scheduler::ReminderScheduler;
    use crate::store::MemoryStore;
    use chrono::{Local, TimeZone};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGate(Permission);

    #[async_trait]
    impl PermissionGate for FixedGate {
        fn current(&self) -> Permission {
            self.0
        }

        async fn request_permission(&self) -> Permission {
            self.0
        }
    }

    /// Unset until asked, then granted.
    struct GrantOnRequest;

    #[async_trait]
    impl PermissionGate for GrantOnRequest {
        fn current(&self) -> Permission {
            Permission::Default
        }

        async fn request_permission(&self) -> Permission {
            Permission::Granted
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        refuse: bool,
        shown: Mutex<Vec<Notification>>,
        dismissed: Mutex<Vec<NotificationId>>,
        responders: Mutex<Vec<oneshot::Sender<Interaction>>>,
    }

    impl FakePlatform {
        fn respond(&self, interaction: Interaction) {
            let responder = self.responders.lock().unwrap().remove(0);
            responder.send(interaction).unwrap();
        }

        fn dismissed(&self) -> Vec<NotificationId> {
            self.dismissed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationPlatform for FakePlatform {
        async fn present(&self, notification: Notification) -> Result<Presented, DispatchError> {
            if self.refuse {
                return Err(DispatchError::Refused("blocked".into()));
            }
            let mut shown = self.shown.lock().unwrap();
            shown.push(notification);
            let (tx, rx) = oneshot::channel();
            self.responders.lock().unwrap().push(tx);
            Ok(Presented {
                id: NotificationId(shown.len() as u64),
                interaction: rx,
            })
        }

        async fn dismiss(&self, id: NotificationId) {
            self.dismissed.lock().unwrap().push(id);
        }
    }

    struct FixedAnswer {
        answer: bool,
        asked: AtomicUsize,
    }

    #[async_trait]
    impl ConfirmPrompt for FixedAnswer {
        async fn confirm(&self, _message: String) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[derive(Default)]
    struct CountingRecorder(AtomicUsize);

    #[async_trait]
    impl IntakeRecorder for CountingRecorder {
        async fn record_drink(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        platform: Arc<FakePlatform>,
        prompt: Arc<FixedAnswer>,
        recorder: Arc<CountingRecorder>,
        dispatcher: NotificationDispatcher,
    }

    fn harness(permission: Permission, answer: bool, refuse: bool) -> Harness {
        let platform = Arc::new(FakePlatform {
            refuse,
            ..FakePlatform::default()
        });
        let prompt = Arc::new(FixedAnswer {
            answer,
            asked: AtomicUsize::new(0),
        });
        let recorder = Arc::new(CountingRecorder::default());
        let dispatcher = NotificationDispatcher::new(
            Arc::new(FixedGate(permission)),
            platform.clone(),
            prompt.clone(),
            recorder.clone(),
        );
        Harness {
            platform,
            prompt,
            recorder,
            dispatcher,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn declined_confirmation_records_nothing() {
        let h = harness(Permission::Denied, false, false);
        assert_eq!(h.dispatcher.dispatch(200, 800).await, None);
        assert_eq!(h.prompt.asked.load(Ordering::SeqCst), 1);
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 0);
        assert!(h.platform.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn accepted_confirmation_records_once() {
        let h = harness(Permission::Default, true, false);
        assert_eq!(h.dispatcher.dispatch(200, 800).await, None);
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn click_records_once_then_dismisses() {
        let h = harness(Permission::Granted, true, false);
        let outcome = h.dispatcher.dispatch(200, 800).await;
        assert_eq!(outcome, Some(DispatchOutcome::Notified(NotificationId(1))));
        assert_eq!(h.prompt.asked.load(Ordering::SeqCst), 0);

        let shown = h.platform.shown.lock().unwrap()[0].clone();
        assert_eq!(shown.tag, REMINDER_TAG);
        assert!(shown.body.contains("200ml"));
        assert!(shown.body.contains("800ml"));

        h.platform.respond(Interaction::Clicked);
        settle().await;
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 1);
        assert_eq!(h.platform.dismissed(), vec![NotificationId(1)]);
    }

    #[tokio::test]
    async fn unset_permission_is_requested_first() {
        let platform = Arc::new(FakePlatform::default());
        let prompt = Arc::new(FixedAnswer {
            answer: true,
            asked: AtomicUsize::new(0),
        });
        let dispatcher = NotificationDispatcher::new(
            Arc::new(GrantOnRequest),
            platform.clone(),
            prompt.clone(),
            Arc::new(CountingRecorder::default()),
        );
        assert!(dispatcher.dispatch(200, 800).await.is_some());
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
        assert_eq!(platform.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closing_records_nothing() {
        let h = harness(Permission::Granted, true, false);
        h.dispatcher.dispatch(200, 800).await;
        h.platform.respond(Interaction::Closed);
        settle().await;
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refused_notification_yields_none() {
        let h = harness(Permission::Granted, true, true);
        assert_eq!(h.dispatcher.dispatch(200, 800).await, None);
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 0);
        assert_eq!(h.prompt.asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn each_fire_records_one_drink_through_tracker() {
        let start = Local.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).single().unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = Arc::new(Tracker::new(
            ProfileId::default(),
            Arc::new(MemoryStore::new()),
            clock.clone(),
            ReminderScheduler::new(clock, tx),
        ));
        tracker.load_settings().await;

        let prompt = Arc::new(FixedAnswer {
            answer: true,
            asked: AtomicUsize::new(0),
        });
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(FixedGate(Permission::Denied)),
            Arc::new(FakePlatform::default()),
            prompt.clone(),
            tracker.clone(),
        ));
        let handle = spawn_dispatch_loop(rx, tracker.clone(), dispatcher);

        tracker
            .update_settings(SettingsUpdate {
                interval_minutes: Some(1),
                enabled: Some(true),
                ..SettingsUpdate::default()
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(tracker.snapshot().await.state.records.len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        let state = tracker.snapshot().await.state;
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.current_intake_ml, 2 * DEFAULT_DRINK_AMOUNT_ML);
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 2);

        tracker.scheduler().shutdown();
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_notification_dismisses_after_timeout() {
        let h = harness(Permission::Granted, true, false);
        h.dispatcher.dispatch(200, 800).await;

        tokio::time::sleep(NOTIFICATION_TIMEOUT - Duration::from_millis(1)).await;
        assert!(h.platform.dismissed().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(h.platform.dismissed(), vec![NotificationId(1)]);
        assert_eq!(h.recorder.0.load(Ordering::SeqCst), 0);
    }
}

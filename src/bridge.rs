use crate::notifier::{
    ConfirmPrompt, DispatchError, Interaction, Notification, NotificationId, NotificationPlatform,
    Presented,
};
use crate::permission::{Permission, PermissionGate};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long after its last poll a page still counts as open.
pub const CLIENT_IDLE_LIMIT: Duration = Duration::from_secs(120);
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptView {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingView {
    pub notifications: Vec<NotificationView>,
    pub prompts: Vec<PromptView>,
}

struct PendingNotification {
    notification: Notification,
    responder: oneshot::Sender<Interaction>,
}

struct PendingPrompt {
    message: String,
    responder: oneshot::Sender<bool>,
}

#[derive(Default)]
struct BridgeState {
    permission: Permission,
    last_seen: Option<Instant>,
    next_id: u64,
    notifications: BTreeMap<NotificationId, PendingNotification>,
    prompts: BTreeMap<u64, PendingPrompt>,
}

impl BridgeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct BrowserBridge {
    state: Mutex<BridgeState>,
}

impl BrowserBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn report_permission(&self, permission: Permission) {
        let mut state = self.lock();
        if state.permission != permission {
            info!(%permission, "notification permission changed");
        }
        state.permission = permission;
        state.last_seen = Some(Instant::now());
    }

    /// Everything the page should currently show. Counts as a poll.
    pub fn pending(&self) -> PendingView {
        let mut state = self.lock();
        state.last_seen = Some(Instant::now());
        PendingView {
            notifications: state
                .notifications
                .iter()
                .map(|(id, pending)| NotificationView {
                    id: *id,
                    notification: pending.notification.clone(),
                })
                .collect(),
            prompts: state
                .prompts
                .iter()
                .map(|(id, pending)| PromptView {
                    id: *id,
                    message: pending.message.clone(),
                })
                .collect(),
        }
    }

    /// Returns `false` for unknown or already-answered notifications.
    pub fn interact(&self, id: NotificationId, interaction: Interaction) -> bool {
        let Some(pending) = self.lock().notifications.remove(&id) else {
            return false;
        };
        debug!(%id, ?interaction, "notification interaction");
        pending.responder.send(interaction).is_ok()
    }

    pub fn answer_prompt(&self, id: u64, accepted: bool) -> bool {
        let Some(pending) = self.lock().prompts.remove(&id) else {
            return false;
        };
        pending.responder.send(accepted).is_ok()
    }
}

fn is_active(state: &BridgeState) -> bool {
    state
        .last_seen
        .is_some_and(|seen| seen.elapsed() <= CLIENT_IDLE_LIMIT)
}

#[async_trait]
impl PermissionGate for BrowserBridge {
    fn current(&self) -> Permission {
        self.lock().permission
    }

    /// The page asks the user itself and reports the answer; this returns the
    /// latest report.
    async fn request_permission(&self) -> Permission {
        self.current()
    }
}

#[async_trait]
impl NotificationPlatform for BrowserBridge {
    async fn present(&self, notification: Notification) -> Result<Presented, DispatchError> {
        let mut state = self.lock();
        if !is_active(&state) {
            return Err(DispatchError::Refused("no dashboard page is open".into()));
        }
        let id = NotificationId(state.next_id());
        let (tx, rx) = oneshot::channel();
        state.notifications.insert(
            id,
            PendingNotification {
                notification,
                responder: tx,
            },
        );
        Ok(Presented {
            id,
            interaction: rx,
        })
    }

    async fn dismiss(&self, id: NotificationId) {
        self.lock().notifications.remove(&id);
    }
}

#[async_trait]
impl ConfirmPrompt for BrowserBridge {
    async fn confirm(&self, message: String) -> bool {
        let (id, rx) = {
            let mut state = self.lock();
            if !is_active(&state) {
                return false;
            }
            let id = state.next_id();
            let (tx, rx) = oneshot::channel();
            state.prompts.insert(
                id,
                PendingPrompt {
                    message,
                    responder: tx,
                },
            );
            (id, rx)
        };

        match tokio::time::timeout(PROMPT_TIMEOUT, rx).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(_)) => false,
            Err(_) => {
                warn!(id, "confirmation prompt expired");
                self.lock().prompts.remove(&id);
                false
            }
        }
    }
}

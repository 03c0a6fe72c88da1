use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

#[async_trait]
pub trait InstallCapability: Send + Sync {
    async fn prompt_install(&self) -> InstallOutcome;
}

/// A choice the user already made in the page's own install dialog.
#[derive(Debug, Clone, Copy)]
pub struct ReportedChoice(pub InstallOutcome);

#[async_trait]
impl InstallCapability for ReportedChoice {
    async fn prompt_install(&self) -> InstallOutcome {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct InstallState {
    installable: bool,
}

impl InstallState {
    pub fn is_installable(&self) -> bool {
        self.installable
    }

    pub fn prompt_available(&mut self) {
        self.installable = true;
    }

    pub fn installed(&mut self) {
        if self.installable {
            info!("app installed");
        }
        self.installable = false;
    }

    /// Prompts only while an install prompt is available.
    pub async fn request_install(
        &mut self,
        capability: &dyn InstallCapability,
    ) -> Option<InstallOutcome> {
        if !self.installable {
            return None;
        }
        let outcome = capability.prompt_install().await;
        if outcome == InstallOutcome::Accepted {
            self.installable = false;
        }
        info!(?outcome, "install prompt answered");
        Some(outcome)
    }
}

//! Anti-nuke detector and lockdown state machine.
//!
//! `UNLOCKED -> LOCKED -> UNLOCKED`. The automatic path counts dangerous
//! actions per user over a trailing window of the audit log; the manual
//! path writes the singleton directly and is idempotent. The detector never
//! touches the guild itself: it flips state and returns the decision, and
//! the effector that revokes permissions or purges webhooks reacts to
//! `should_lockdown` outside the core.

use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::antinuke::state::{AdminAction, AuditEvent, LockdownState};
use crate::clock::Clock;
use crate::config::AntiNukeConfig;
use crate::error::CoreError;
use crate::store::MemoryStore;

/// Decision returned to the caller for each observed action.
///
/// While a lockdown is already active, `action_count` is reported as 0
/// rather than the true window count; the boolean is the contract, the
/// count is advisory.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CheckOutcome {
    pub should_lockdown: bool,
    pub action_count: u32,
}

/// Watches privileged actions and owns the lockdown singleton.
pub struct AntiNukeDetector {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    config: AntiNukeConfig,
}

impl AntiNukeDetector {
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>, config: AntiNukeConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Record one privileged action and decide whether to lock down.
    pub async fn check_action(
        &self,
        user_id: &str,
        action: AdminAction,
        details: &str,
    ) -> Result<CheckOutcome, CoreError> {
        if user_id.trim().is_empty() {
            return Err(CoreError::Validation("user id must not be empty".to_string()));
        }

        let now = self.clock.now();
        let dangerous = self.config.dangerous_actions.contains(&action);
        let event = AuditEvent {
            user_id: user_id.to_string(),
            action,
            dangerous,
            details: details.to_string(),
            timestamp: now,
        };

        let state = self.store.read_lockdown().await?;
        if state.active {
            // Already locked; record the event and reaffirm the decision
            // without re-counting the window.
            self.store.append_audit(event).await?;
            return Ok(CheckOutcome {
                should_lockdown: true,
                action_count: 0,
            });
        }

        self.store.append_audit(event).await?;

        if !dangerous {
            return Ok(CheckOutcome {
                should_lockdown: false,
                action_count: 0,
            });
        }

        // The append above has completed, so the triggering event is part
        // of its own window count.
        let since = now - Duration::seconds(self.config.time_window_secs);
        let count = self.store.count_dangerous_since(user_id, since).await?;
        debug!(
            user_id = %user_id,
            action = %action,
            count = count,
            threshold = self.config.max_actions,
            "Dangerous action observed"
        );

        if count >= self.config.max_actions {
            let reason = format!("Anti-Nuke triggered by user {}", user_id);
            warn!(user_id = %user_id, count = count, "Anti-nuke threshold reached, locking down");
            self.store
                .write_lockdown(LockdownState {
                    active: true,
                    reason: Some(reason),
                    initiated_by: Some("SYSTEM".to_string()),
                    activated_at: Some(now),
                    deactivated_at: None,
                })
                .await?;
            return Ok(CheckOutcome {
                should_lockdown: true,
                action_count: count,
            });
        }

        Ok(CheckOutcome {
            should_lockdown: false,
            action_count: count,
        })
    }

    /// Manually activate the lockdown. Re-locking an active lockdown is a
    /// no-op that keeps the original activation record.
    pub async fn lockdown(
        &self,
        reason: &str,
        initiated_by: &str,
    ) -> Result<LockdownState, CoreError> {
        let state = self.store.read_lockdown().await?;
        if state.active {
            return Ok(state);
        }

        let state = LockdownState {
            active: true,
            reason: Some(reason.to_string()),
            initiated_by: Some(initiated_by.to_string()),
            activated_at: Some(self.clock.now()),
            deactivated_at: None,
        };
        self.store.write_lockdown(state.clone()).await?;
        warn!(initiated_by = %initiated_by, reason = %reason, "Manual lockdown activated");
        Ok(state)
    }

    /// Lift the lockdown. Unlocking an inactive lockdown is a no-op.
    pub async fn unlock(&self, initiated_by: &str) -> Result<LockdownState, CoreError> {
        let mut state = self.store.read_lockdown().await?;
        if !state.active {
            return Ok(state);
        }

        state.active = false;
        state.deactivated_at = Some(self.clock.now());
        self.store.write_lockdown(state.clone()).await?;
        warn!(initiated_by = %initiated_by, "Lockdown lifted");
        Ok(state)
    }

    /// Current lockdown state.
    pub async fn status(&self) -> Result<LockdownState, CoreError> {
        self.store.read_lockdown().await
    }
}

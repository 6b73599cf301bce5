//! Audit events and the lockdown singleton.
//!
//! Every privileged guild action observed by the caller is appended to the
//! audit log exactly once. The lockdown record is a singleton per community;
//! manual transitions are idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privileged guild operations the detector can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    ChannelCreate,
    ChannelDelete,
    RoleCreate,
    RoleDelete,
    MemberBan,
    MemberKick,
    WebhookCreate,
    WebhookDelete,
    GuildUpdate,
    EmojiDelete,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::ChannelCreate => "channel_create",
            AdminAction::ChannelDelete => "channel_delete",
            AdminAction::RoleCreate => "role_create",
            AdminAction::RoleDelete => "role_delete",
            AdminAction::MemberBan => "member_ban",
            AdminAction::MemberKick => "member_kick",
            AdminAction::WebhookCreate => "webhook_create",
            AdminAction::WebhookDelete => "webhook_delete",
            AdminAction::GuildUpdate => "guild_update",
            AdminAction::EmojiDelete => "emoji_delete",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "channel_create" => Ok(AdminAction::ChannelCreate),
            "channel_delete" => Ok(AdminAction::ChannelDelete),
            "role_create" => Ok(AdminAction::RoleCreate),
            "role_delete" => Ok(AdminAction::RoleDelete),
            "member_ban" => Ok(AdminAction::MemberBan),
            "member_kick" => Ok(AdminAction::MemberKick),
            "webhook_create" => Ok(AdminAction::WebhookCreate),
            "webhook_delete" => Ok(AdminAction::WebhookDelete),
            "guild_update" => Ok(AdminAction::GuildUpdate),
            "emoji_delete" => Ok(AdminAction::EmojiDelete),
            other => Err(format!("unknown admin action: {}", other)),
        }
    }
}

/// One observed privileged action, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: AdminAction,
    /// Whether the action was in the configured dangerous set at the time
    /// it was observed.
    pub dangerous: bool,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Guild-wide protective state. Singleton per community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockdownState {
    pub active: bool,
    pub reason: Option<String>,
    pub initiated_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl LockdownState {
    /// Initial unlocked state.
    pub fn unlocked() -> Self {
        Self {
            active: false,
            reason: None,
            initiated_by: None,
            activated_at: None,
            deactivated_at: None,
        }
    }
}

impl Default for LockdownState {
    fn default() -> Self {
        Self::unlocked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_action_round_trip() {
        for action in [
            AdminAction::ChannelDelete,
            AdminAction::RoleDelete,
            AdminAction::MemberBan,
            AdminAction::GuildUpdate,
        ] {
            assert_eq!(action.as_str().parse::<AdminAction>(), Ok(action));
        }
        assert!("nuke_everything".parse::<AdminAction>().is_err());
    }

    #[test]
    fn test_lockdown_starts_inactive() {
        let state = LockdownState::default();
        assert!(!state.active);
        assert!(state.activated_at.is_none());
    }
}

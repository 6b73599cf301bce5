//! Per-user ledger record.
//!
//! One `UserAccount` document per user per community, created lazily on the
//! first ledger-mutating event and never hard-deleted by the core. `level`
//! is a cache of the level curve over `xp`; it is only ever written in the
//! same transaction as an `xp` change.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Spendable currency, XP, cooldowns, inventory, and quest progress for one
/// user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,

    /// Spendable currency. Never negative.
    pub points: u64,

    /// Monotonically non-decreasing except on explicit admin reset.
    pub xp: u64,

    /// Cached level; recomputed from `xp` on every xp change.
    pub level: u32,

    pub last_message_at: Option<DateTime<Utc>>,
    pub last_daily_at: Option<DateTime<Utc>>,
    pub daily_streak: u32,
    pub total_voice_seconds: u64,

    /// Append-only except for the one-way `used` transition per entry.
    pub inventory: Vec<InventoryEntry>,

    pub active_buffs: Vec<ActiveBuff>,

    /// Per-quest, per-calendar-day progress counters.
    pub quest_progress: HashMap<String, QuestProgress>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            points: 0,
            xp: 0,
            level: 0,
            last_message_at: None,
            last_daily_at: None,
            daily_streak: 0,
            total_voice_seconds: 0,
            inventory: Vec::new(),
            active_buffs: Vec::new(),
            quest_progress: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// First unused inventory instance of an item, if any.
    pub fn find_unused(&mut self, item_id: &str) -> Option<&mut InventoryEntry> {
        self.inventory
            .iter_mut()
            .find(|entry| entry.item_id == item_id && !entry.used)
    }

    /// Buffs that have not expired at `now`.
    pub fn buffs_active_at(&self, now: DateTime<Utc>) -> Vec<&ActiveBuff> {
        self.active_buffs
            .iter()
            .filter(|buff| buff.expires_at > now)
            .collect()
    }
}

/// One purchased item instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item_id: String,
    pub instance_id: Uuid,
    pub purchased_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl InventoryEntry {
    pub fn new(item_id: &str, purchased_at: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.to_string(),
            instance_id: Uuid::new_v4(),
            purchased_at,
            used: false,
            used_at: None,
        }
    }
}

/// A timed bonus granted by using a buff item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBuff {
    pub kind: BuffKind,
    /// Percentage applied by the external effector, e.g. 200 for a 2x boost.
    pub value: u32,
    pub expires_at: DateTime<Utc>,
    pub source_item_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    XpMultiplier,
    PointsMultiplier,
}

/// Progress toward one quest on one UTC calendar day.
///
/// Entries from a prior day are logically reset before being incremented;
/// `completed` flips at most once per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestProgress {
    pub date: NaiveDate,
    pub count: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestProgress {
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            completed: false,
            completed_at: None,
        }
    }
}

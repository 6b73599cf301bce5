//! Quest engine: definitions and per-day progress tracking.
//!
//! Quest progress is scoped to the UTC calendar day of the transaction, not
//! a rolling window (the daily bonus cooldown in the ledger IS rolling; the
//! two are deliberately different). A quest completes at most once per user
//! per day, and the reward is credited in the same account transaction that
//! records the completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::economy::account::QuestProgress;
use crate::economy::UserAccount;
use crate::error::CoreError;
use crate::store::{MemoryStore, MAX_COMMIT_RETRIES};

/// What kind of user activity a quest counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    /// Any chat message.
    Message,
    /// Chat messages in one specific channel (requires a target).
    ChannelMessage,
    /// Completed voice presence intervals.
    Voice,
    /// Reactions added to messages.
    Reaction,
}

impl QuestKind {
    /// Whether definitions of this kind must name a target channel.
    pub fn is_channel_scoped(&self) -> bool {
        matches!(self, QuestKind::ChannelMessage)
    }
}

/// Admin-created quest. Retired quests are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    pub kind: QuestKind,
    pub target_id: Option<String>,
    pub required_count: u32,
    pub reward_points: u64,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl QuestDefinition {
    /// Whether a user action counts toward this quest.
    pub fn matches(&self, action: &QuestAction) -> bool {
        if !self.is_active || self.kind != action.kind {
            return false;
        }
        match &self.target_id {
            Some(target) => action.target_id.as_deref() == Some(target.as_str()),
            None => true,
        }
    }
}

/// One user action reported by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestAction {
    pub kind: QuestKind,
    pub target_id: Option<String>,
}

/// Input for quest creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuest {
    pub title: String,
    pub kind: QuestKind,
    pub target_id: Option<String>,
    pub required_count: u32,
    pub reward_points: u64,
    pub created_by: String,
}

/// A quest newly completed by one `process_progress` call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedQuest {
    pub quest_id: String,
    pub title: String,
    pub reward_points: u64,
}

/// Owns quest definitions and idempotent daily progress.
pub struct QuestEngine {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
}

impl QuestEngine {
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a new active quest.
    pub async fn create_quest(&self, input: NewQuest) -> Result<QuestDefinition, CoreError> {
        if input.title.trim().is_empty() {
            return Err(CoreError::Validation("quest title must not be empty".to_string()));
        }
        if input.required_count == 0 {
            return Err(CoreError::Validation(
                "quest required_count must be at least 1".to_string(),
            ));
        }
        if input.kind.is_channel_scoped() && input.target_id.is_none() {
            return Err(CoreError::Validation(
                "channel-scoped quests require a target channel".to_string(),
            ));
        }

        let quest = QuestDefinition {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            kind: input.kind,
            target_id: input.target_id,
            required_count: input.required_count,
            reward_points: input.reward_points,
            is_active: true,
            created_by: input.created_by,
            created_at: self.clock.now(),
        };
        self.store.upsert_quest(quest.clone()).await?;
        info!(quest_id = %quest.id, title = %quest.title, "Quest created");
        Ok(quest)
    }

    /// Retire a quest. Progress records stay; the quest stops matching.
    pub async fn deactivate_quest(&self, quest_id: &str) -> Result<QuestDefinition, CoreError> {
        let Some(mut quest) = self.store.get_quest(quest_id).await? else {
            return Err(CoreError::NotFound(format!("quest '{}'", quest_id)));
        };
        if quest.is_active {
            quest.is_active = false;
            self.store.upsert_quest(quest.clone()).await?;
            info!(quest_id = %quest_id, "Quest deactivated");
        }
        Ok(quest)
    }

    /// All quest definitions, active and retired.
    pub async fn list_quests(&self) -> Result<Vec<QuestDefinition>, CoreError> {
        self.store.all_quests().await
    }

    /// Record one user action against every matching active quest.
    ///
    /// Returns the quests newly completed by this call. When no quest
    /// matches, this is a read-only fast path with no account transaction.
    pub async fn process_progress(
        &self,
        user_id: &str,
        action: &QuestAction,
    ) -> Result<Vec<CompletedQuest>, CoreError> {
        if user_id.trim().is_empty() {
            return Err(CoreError::Validation("user id must not be empty".to_string()));
        }

        let matching: Vec<QuestDefinition> = self
            .store
            .active_quests()
            .await?
            .into_iter()
            .filter(|q| q.matches(action))
            .collect();

        if matching.is_empty() {
            return Ok(Vec::new());
        }

        for _ in 0..MAX_COMMIT_RETRIES {
            let (mut account, version) = match self.store.read_account(user_id).await? {
                Some((account, version)) => (account, Some(version)),
                None => (UserAccount::new(user_id, self.clock.now()), None),
            };
            let now = self.clock.now();
            let today = now.date_naive();

            let mut completions = Vec::new();
            let mut reward_total: u64 = 0;
            let mut changed = false;

            for quest in &matching {
                let entry = account
                    .quest_progress
                    .entry(quest.id.clone())
                    .or_insert_with(|| QuestProgress::fresh(today));

                // Progress from a prior day is stale; reset before counting.
                if entry.date != today {
                    *entry = QuestProgress::fresh(today);
                }

                if entry.completed {
                    continue;
                }

                entry.count += 1;
                changed = true;

                if entry.count >= quest.required_count {
                    entry.completed = true;
                    entry.completed_at = Some(now);
                    reward_total += quest.reward_points;
                    completions.push(CompletedQuest {
                        quest_id: quest.id.clone(),
                        title: quest.title.clone(),
                        reward_points: quest.reward_points,
                    });
                }
            }

            if !changed {
                // Everything matching is already completed today.
                return Ok(Vec::new());
            }

            account.points += reward_total;
            account.updated_at = now;

            match self.store.commit_account(user_id, version, account).await {
                Ok(()) => {
                    if !completions.is_empty() {
                        info!(
                            user_id = %user_id,
                            completed = completions.len(),
                            reward = reward_total,
                            "Quests completed"
                        );
                    } else {
                        debug!(user_id = %user_id, "Quest progress recorded");
                    }
                    return Ok(completions);
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }
}

//! Transactional document store.
//!
//! The engines only rely on the contract expressed here: per-document
//! optimistic read-modify-write (read a version, commit against that exact
//! version, `Conflict` on a mismatch) plus an ordered range count over the
//! append-only audit log. This file ships the in-memory implementation;
//! any transactional database (relational with row locking, or a document
//! store with optimistic concurrency) can stand in behind the same surface.
//!
//! Engines own the retry loop: read, compute, commit, and on `Conflict`
//! start over from a fresh read. A commit is all-or-nothing; callers never
//! observe a partially applied account mutation.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::antinuke::{AuditEvent, LockdownState};
use crate::economy::UserAccount;
use crate::error::CoreError;
use crate::quests::QuestDefinition;

/// How many times an engine re-reads and re-commits before giving up and
/// surfacing `Conflict` to the caller.
pub const MAX_COMMIT_RETRIES: u32 = 5;

struct VersionedAccount {
    version: u64,
    account: UserAccount,
}

/// In-memory document store with per-account version counters.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, VersionedAccount>>,
    audit_log: RwLock<Vec<AuditEvent>>,
    quests: RwLock<HashMap<String, QuestDefinition>>,
    lockdown: RwLock<LockdownState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Read an account snapshot together with its commit version.
    pub async fn read_account(
        &self,
        user_id: &str,
    ) -> Result<Option<(UserAccount, u64)>, CoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(user_id)
            .map(|v| (v.account.clone(), v.version)))
    }

    /// Commit an account against the version observed at read time.
    ///
    /// `expected = None` asserts the document did not exist; a concurrent
    /// creation is reported as a conflict like any other lost race.
    pub async fn commit_account(
        &self,
        user_id: &str,
        expected: Option<u64>,
        account: UserAccount,
    ) -> Result<(), CoreError> {
        let mut accounts = self.accounts.write().await;
        match (accounts.get_mut(user_id), expected) {
            (None, None) => {
                accounts.insert(
                    user_id.to_string(),
                    VersionedAccount {
                        version: 1,
                        account,
                    },
                );
                Ok(())
            }
            (Some(current), Some(version)) if current.version == version => {
                current.version += 1;
                current.account = account;
                Ok(())
            }
            (current, expected) => {
                debug!(
                    user_id = %user_id,
                    expected = ?expected,
                    actual = ?current.map(|c| c.version),
                    "Account commit conflict"
                );
                Err(CoreError::Conflict)
            }
        }
    }

    // ------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------

    /// Append one observed privileged action. The append completes before
    /// any subsequent window count so the triggering event is never missed.
    pub async fn append_audit(&self, event: AuditEvent) -> Result<(), CoreError> {
        let mut log = self.audit_log.write().await;
        log.push(event);
        Ok(())
    }

    /// Count dangerous events by `user_id` with `timestamp >= since`,
    /// inclusive.
    pub async fn count_dangerous_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, CoreError> {
        let log = self.audit_log.read().await;
        let count = log
            .iter()
            .filter(|e| e.dangerous && e.user_id == user_id && e.timestamp >= since)
            .count();
        Ok(count as u32)
    }

    /// Most recent audit entries, newest first.
    pub async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEvent>, CoreError> {
        let log = self.audit_log.read().await;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }

    // ------------------------------------------------------------------
    // Lockdown singleton
    // ------------------------------------------------------------------

    pub async fn read_lockdown(&self) -> Result<LockdownState, CoreError> {
        Ok(self.lockdown.read().await.clone())
    }

    pub async fn write_lockdown(&self, state: LockdownState) -> Result<(), CoreError> {
        *self.lockdown.write().await = state;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Quest definitions
    // ------------------------------------------------------------------

    pub async fn get_quest(&self, quest_id: &str) -> Result<Option<QuestDefinition>, CoreError> {
        let quests = self.quests.read().await;
        Ok(quests.get(quest_id).cloned())
    }

    /// Active quest definitions, in no particular order.
    pub async fn active_quests(&self) -> Result<Vec<QuestDefinition>, CoreError> {
        let quests = self.quests.read().await;
        Ok(quests.values().filter(|q| q.is_active).cloned().collect())
    }

    pub async fn all_quests(&self) -> Result<Vec<QuestDefinition>, CoreError> {
        let quests = self.quests.read().await;
        Ok(quests.values().cloned().collect())
    }

    pub async fn upsert_quest(&self, quest: QuestDefinition) -> Result<(), CoreError> {
        let mut quests = self.quests.write().await;
        quests.insert(quest.id.clone(), quest);
        Ok(())
    }
}

//! Ledger engine: atomic earn/spend/convert operations.
//!
//! Every mutating operation is one read-modify-write transaction over a
//! single `UserAccount` document. On a commit conflict the whole operation
//! restarts from a fresh read, so two concurrent calls against the same
//! account serialize without lost updates; the caller never observes a
//! partial mutation.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::EconomyConfig;
use crate::economy::account::UserAccount;
use crate::economy::level::level_of;
use crate::error::CoreError;
use crate::store::{MemoryStore, MAX_COMMIT_RETRIES};

/// Result of a message point award.
#[derive(Debug, Clone, Serialize)]
pub struct MessageAward {
    pub earned: u64,
    pub cooldown: bool,
    pub total: u64,
}

/// Result of a voice presence award.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceAward {
    pub earned: u64,
    pub total: u64,
}

/// Result of a daily bonus claim.
#[derive(Debug, Clone, Serialize)]
pub struct DailyClaim {
    pub claimed: bool,
    pub points: u64,
    pub streak: u32,
    pub next_claim_at: DateTime<Utc>,
}

/// Result of a points-to-XP conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub xp_gained: u64,
    pub new_xp: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Owns per-user balances and the four atomic earn/spend operations.
pub struct LedgerEngine {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    config: EconomyConfig,
    rng: Mutex<StdRng>,
}

impl LedgerEngine {
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>, config: EconomyConfig) -> Self {
        Self {
            store,
            clock,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic point draws for tests.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Read an account. Fails `NotFound` if the user has no ledger yet.
    pub async fn account(&self, user_id: &str) -> Result<UserAccount, CoreError> {
        validate_user_id(user_id)?;
        match self.store.read_account(user_id).await? {
            Some((account, _)) => Ok(account),
            None => Err(CoreError::NotFound(format!("user '{}'", user_id))),
        }
    }

    /// Award random points for a chat message, subject to the per-user
    /// cooldown. A call inside the cooldown returns `earned = 0` without
    /// mutating anything.
    pub async fn award_message_points(&self, user_id: &str) -> Result<MessageAward, CoreError> {
        validate_user_id(user_id)?;
        let cooldown = Duration::seconds(self.config.message_cooldown_secs);

        for _ in 0..MAX_COMMIT_RETRIES {
            let (mut account, version) = self.load_or_create(user_id).await?;
            let now = self.clock.now();

            if let Some(last) = account.last_message_at {
                if now - last < cooldown {
                    return Ok(MessageAward {
                        earned: 0,
                        cooldown: true,
                        total: account.points,
                    });
                }
            }

            let earned = self.draw_points();
            account.points += earned;
            account.last_message_at = Some(now);
            account.updated_at = now;
            let total = account.points;

            match self.store.commit_account(user_id, version, account).await {
                Ok(()) => {
                    debug!(user_id = %user_id, earned = earned, total = total, "Message points awarded");
                    return Ok(MessageAward {
                        earned,
                        cooldown: false,
                        total,
                    });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Award points for completed voice intervals. Always mutates; a zero
    /// award still updates `total_voice_seconds`.
    pub async fn award_voice_points(
        &self,
        user_id: &str,
        duration_seconds: u64,
    ) -> Result<VoiceAward, CoreError> {
        validate_user_id(user_id)?;
        let intervals = duration_seconds / self.config.voice_interval_secs;
        let earned = intervals * self.config.voice_points_per_interval;

        for _ in 0..MAX_COMMIT_RETRIES {
            let (mut account, version) = self.load_or_create(user_id).await?;
            let now = self.clock.now();

            account.points += earned;
            account.total_voice_seconds += duration_seconds;
            account.updated_at = now;
            let total = account.points;

            match self.store.commit_account(user_id, version, account).await {
                Ok(()) => {
                    debug!(
                        user_id = %user_id,
                        earned = earned,
                        duration_seconds = duration_seconds,
                        "Voice points awarded"
                    );
                    return Ok(VoiceAward { earned, total });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Claim the daily bonus. Rolling 24h cooldown; a gap over 48h resets
    /// the streak to zero before it is incremented again.
    pub async fn claim_daily(&self, user_id: &str) -> Result<DailyClaim, CoreError> {
        validate_user_id(user_id)?;
        let cooldown = Duration::hours(self.config.daily_cooldown_hours);
        let streak_break = Duration::hours(self.config.streak_break_hours);

        for _ in 0..MAX_COMMIT_RETRIES {
            let (mut account, version) = self.load_or_create(user_id).await?;
            let now = self.clock.now();

            if let Some(last) = account.last_daily_at {
                let elapsed = now - last;
                if elapsed < cooldown {
                    return Ok(DailyClaim {
                        claimed: false,
                        points: 0,
                        streak: account.daily_streak,
                        next_claim_at: last + cooldown,
                    });
                }
                if elapsed > streak_break {
                    account.daily_streak = 0;
                }
            }

            account.daily_streak += 1;
            let bonus = self.config.daily_base_points
                + u64::from(account.daily_streak - 1) * self.config.daily_streak_bonus;
            account.points += bonus;
            account.last_daily_at = Some(now);
            account.updated_at = now;
            let streak = account.daily_streak;

            match self.store.commit_account(user_id, version, account).await {
                Ok(()) => {
                    info!(user_id = %user_id, bonus = bonus, streak = streak, "Daily bonus claimed");
                    return Ok(DailyClaim {
                        claimed: true,
                        points: bonus,
                        streak,
                        next_claim_at: now + cooldown,
                    });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Convert spendable points into XP at 1:1, recomputing the cached
    /// level in the same transaction.
    pub async fn convert_points_to_xp(
        &self,
        user_id: &str,
        amount: u64,
    ) -> Result<Conversion, CoreError> {
        validate_user_id(user_id)?;
        if amount == 0 {
            return Err(CoreError::Validation(
                "conversion amount must be positive".to_string(),
            ));
        }

        for _ in 0..MAX_COMMIT_RETRIES {
            let Some((mut account, version)) = self.store.read_account(user_id).await? else {
                return Err(CoreError::NotFound(format!("user '{}'", user_id)));
            };
            let now = self.clock.now();

            if account.points < amount {
                return Err(CoreError::InsufficientFunds {
                    available: account.points,
                    required: amount,
                });
            }

            let old_level = level_of(account.xp, self.config.xp_divisor);
            account.points -= amount;
            account.xp += amount;
            let new_level = level_of(account.xp, self.config.xp_divisor);
            account.level = new_level;
            account.updated_at = now;
            let new_xp = account.xp;

            match self
                .store
                .commit_account(user_id, Some(version), account)
                .await
            {
                Ok(()) => {
                    let leveled_up = new_level > old_level;
                    if leveled_up {
                        info!(user_id = %user_id, old_level = old_level, new_level = new_level, "Level up");
                    }
                    return Ok(Conversion {
                        xp_gained: amount,
                        new_xp,
                        old_level,
                        new_level,
                        leveled_up,
                    });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Load the account for a read-modify-write cycle, creating the default
    /// zeroed document lazily on first mutation.
    async fn load_or_create(
        &self,
        user_id: &str,
    ) -> Result<(UserAccount, Option<u64>), CoreError> {
        match self.store.read_account(user_id).await? {
            Some((account, version)) => Ok((account, Some(version))),
            None => Ok((UserAccount::new(user_id, self.clock.now()), None)),
        }
    }

    fn draw_points(&self) -> u64 {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        rng.gen_range(self.config.message_points_min..=self.config.message_points_max)
    }
}

fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::Validation("user id must not be empty".to_string()));
    }
    Ok(())
}

//! Points/XP economy: the per-user ledger and its atomic operations.

pub mod account;
pub mod ledger;
pub mod level;

pub use account::{ActiveBuff, BuffKind, InventoryEntry, QuestProgress, UserAccount};
pub use ledger::{Conversion, DailyClaim, LedgerEngine, MessageAward, VoiceAward};
pub use level::{level_of, xp_for};

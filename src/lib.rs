//! GuildPulse Engagement Core
//!
//! Community engagement backend: users earn points and XP by chatting and
//! voice presence, spend points in a shop, and complete daily quests, while
//! an anti-nuke detector watches privileged actions and locks the community
//! down when it sees a destructive burst.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs        - Crate root with re-exports
//! ├── main.rs       - Server entrypoint
//! ├── config.rs     - Configuration management
//! ├── clock.rs      - Injectable time source
//! ├── error.rs      - Core error kinds
//! ├── store.rs      - Transactional document store (in-memory)
//! ├── economy/      - Points/XP ledger
//! │   ├── account.rs - Per-user ledger record
//! │   ├── ledger.rs  - Atomic earn/spend/convert operations
//! │   └── level.rs   - XP <-> level curve
//! ├── quests.rs     - Quest definitions & daily progress
//! ├── shop.rs       - Item catalog, purchases, item use
//! ├── antinuke/     - Intrusion response
//! │   ├── state.rs   - Audit events & lockdown singleton
//! │   └── detector.rs - Sliding-window detection & state machine
//! └── api/          - HTTP endpoints (thin 1:1 operation mapping)
//! ```

pub mod antinuke;
pub mod api;
pub mod clock;
pub mod config;
pub mod economy;
pub mod error;
pub mod quests;
pub mod shop;
pub mod store;

// Re-export main types for convenience
pub use antinuke::{AdminAction, AntiNukeDetector, AuditEvent, CheckOutcome, LockdownState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AntiNukeConfig, CoreConfig, EconomyConfig};
pub use economy::{
    level_of, xp_for, Conversion, DailyClaim, LedgerEngine, MessageAward, UserAccount, VoiceAward,
};
pub use error::CoreError;
pub use quests::{CompletedQuest, NewQuest, QuestAction, QuestDefinition, QuestEngine, QuestKind};
pub use shop::{InventoryLine, ItemEffect, ItemKind, PurchaseOutcome, ShopEngine, UseOutcome};
pub use store::MemoryStore;

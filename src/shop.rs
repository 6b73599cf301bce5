//! Shop engine: fixed catalog, purchases, and item use.
//!
//! The catalog is an in-process constant table; there is no runtime product
//! management. A purchase decrements points and appends an inventory
//! instance in one transaction. Using an item flips its one-way `used` flag
//! and, for buff items, activates a timed buff on the account. Role and
//! consumable effects are only signalled back to the caller; granting the
//! actual Discord role (or opening the box) is the effector's job.

use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::economy::account::{ActiveBuff, BuffKind, InventoryEntry};
use crate::error::CoreError;
use crate::store::{MemoryStore, MAX_COMMIT_RETRIES};

/// Catalog item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Buff,
    Role,
    Consumable,
}

/// What an item does when used, as signalled to the external effector.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    /// Timed multiplier recorded on the account as an active buff.
    TimedBuff {
        kind: BuffKind,
        /// Percentage, e.g. 200 for a 2x boost.
        value: u32,
        duration_secs: i64,
    },
    /// The caller grants this role to the user.
    GrantRole { role_name: &'static str },
    /// One-shot effect enacted entirely by the caller.
    OneShot { note: &'static str },
}

/// One catalog entry. Immutable at runtime.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
    pub kind: ItemKind,
    pub effect: ItemEffect,
}

/// The fixed item catalog.
pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: "xp_booster",
        name: "XP Booster (2x, 1h)",
        price: 500,
        kind: ItemKind::Buff,
        effect: ItemEffect::TimedBuff {
            kind: BuffKind::XpMultiplier,
            value: 200,
            duration_secs: 3600,
        },
    },
    ShopItem {
        id: "points_booster",
        name: "Points Booster (+50%, 1h)",
        price: 750,
        kind: ItemKind::Buff,
        effect: ItemEffect::TimedBuff {
            kind: BuffKind::PointsMultiplier,
            value: 150,
            duration_secs: 3600,
        },
    },
    ShopItem {
        id: "vip_role",
        name: "VIP Role",
        price: 5000,
        kind: ItemKind::Role,
        effect: ItemEffect::GrantRole { role_name: "VIP" },
    },
    ShopItem {
        id: "color_role",
        name: "Custom Color Role",
        price: 2000,
        kind: ItemKind::Role,
        effect: ItemEffect::GrantRole {
            role_name: "Colorful",
        },
    },
    ShopItem {
        id: "mystery_box",
        name: "Mystery Box",
        price: 300,
        kind: ItemKind::Consumable,
        effect: ItemEffect::OneShot {
            note: "Open for a random prize",
        },
    },
];

/// Look up a catalog item by id.
pub fn find_item(item_id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == item_id)
}

/// Result of a purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub item_id: String,
    pub balance: u64,
    pub inventory: Vec<InventoryEntry>,
}

/// Result of using an item.
#[derive(Debug, Clone, Serialize)]
pub struct UseOutcome {
    pub message: String,
    pub effect: ItemEffect,
}

/// Unused inventory grouped by item.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryLine {
    pub item_id: String,
    pub count: u32,
}

/// Owns the catalog and purchase/use operations.
pub struct ShopEngine {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
}

impl ShopEngine {
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Buy one instance of an item. Balance check and inventory append
    /// commit together or not at all.
    pub async fn buy(&self, user_id: &str, item_id: &str) -> Result<PurchaseOutcome, CoreError> {
        let Some(item) = find_item(item_id) else {
            return Err(CoreError::NotFound(format!("item '{}'", item_id)));
        };

        for _ in 0..MAX_COMMIT_RETRIES {
            let Some((mut account, version)) = self.store.read_account(user_id).await? else {
                return Err(CoreError::NotFound(format!("user '{}'", user_id)));
            };
            let now = self.clock.now();

            if account.points < item.price {
                return Err(CoreError::InsufficientFunds {
                    available: account.points,
                    required: item.price,
                });
            }

            account.points -= item.price;
            account.inventory.push(InventoryEntry::new(item.id, now));
            account.updated_at = now;
            let balance = account.points;
            let inventory = account.inventory.clone();

            match self
                .store
                .commit_account(user_id, Some(version), account)
                .await
            {
                Ok(()) => {
                    info!(user_id = %user_id, item_id = %item.id, price = item.price, "Item purchased");
                    return Ok(PurchaseOutcome {
                        item_id: item.id.to_string(),
                        balance,
                        inventory,
                    });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Use the first unused instance of an item. Buff items also activate
    /// their timed buff in the same transaction.
    pub async fn use_item(&self, user_id: &str, item_id: &str) -> Result<UseOutcome, CoreError> {
        let Some(item) = find_item(item_id) else {
            return Err(CoreError::NotFound(format!("item '{}'", item_id)));
        };

        for _ in 0..MAX_COMMIT_RETRIES {
            let Some((mut account, version)) = self.store.read_account(user_id).await? else {
                return Err(CoreError::ItemNotOwned(item_id.to_string()));
            };
            let now = self.clock.now();

            let Some(entry) = account.find_unused(item_id) else {
                return Err(CoreError::ItemNotOwned(item_id.to_string()));
            };
            entry.used = true;
            entry.used_at = Some(now);

            let message = match item.effect {
                ItemEffect::TimedBuff {
                    kind,
                    value,
                    duration_secs,
                } => {
                    account.active_buffs.push(ActiveBuff {
                        kind,
                        value,
                        expires_at: now + Duration::seconds(duration_secs),
                        source_item_id: item.id.to_string(),
                    });
                    format!("{} activated for {} minutes", item.name, duration_secs / 60)
                }
                ItemEffect::GrantRole { role_name } => {
                    format!("{} redeemed: the {} role is on its way", item.name, role_name)
                }
                ItemEffect::OneShot { note } => format!("{} used: {}", item.name, note),
            };
            account.updated_at = now;

            match self
                .store
                .commit_account(user_id, Some(version), account)
                .await
            {
                Ok(()) => {
                    info!(user_id = %user_id, item_id = %item.id, "Item used");
                    return Ok(UseOutcome {
                        message,
                        effect: item.effect,
                    });
                }
                Err(CoreError::Conflict) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict)
    }

    /// Unused inventory grouped by item, in first-purchase order. Read-only.
    pub async fn inventory(&self, user_id: &str) -> Result<Vec<InventoryLine>, CoreError> {
        let Some((account, _)) = self.store.read_account(user_id).await? else {
            return Ok(Vec::new());
        };

        let mut lines: Vec<InventoryLine> = Vec::new();
        for entry in account.inventory.iter().filter(|e| !e.used) {
            match lines.iter_mut().find(|l| l.item_id == entry.item_id) {
                Some(line) => line.count += 1,
                None => lines.push(InventoryLine {
                    item_id: entry.item_id.clone(),
                    count: 1,
                }),
            }
        }
        debug!(user_id = %user_id, distinct_items = lines.len(), "Inventory read");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::economy::UserAccount;
    use chrono::Utc;

    async fn funded_engines(points: u64) -> (Arc<MemoryStore>, ShopEngine) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now())) as Arc<dyn Clock>;
        let mut account = UserAccount::new("user_1", clock.now());
        account.points = points;
        store.commit_account("user_1", None, account).await.unwrap();
        let shop = ShopEngine::new(Arc::clone(&store), clock);
        (store, shop)
    }

    #[tokio::test]
    async fn test_buy_exact_balance_succeeds() {
        let (store, shop) = funded_engines(500).await;

        let outcome = shop.buy("user_1", "xp_booster").await.unwrap();
        assert_eq!(outcome.balance, 0);
        assert_eq!(outcome.inventory.len(), 1);
        assert!(!outcome.inventory[0].used);

        let (account, _) = store.read_account("user_1").await.unwrap().unwrap();
        assert_eq!(account.points, 0);
    }

    #[tokio::test]
    async fn test_buy_one_point_short_fails_atomically() {
        let (store, shop) = funded_engines(499).await;

        let result = shop.buy("user_1", "xp_booster").await;
        assert!(matches!(
            result,
            Err(CoreError::InsufficientFunds {
                available: 499,
                required: 500
            })
        ));

        let (account, _) = store.read_account("user_1").await.unwrap().unwrap();
        assert_eq!(account.points, 499);
        assert!(account.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_buy_unknown_item_and_unknown_user() {
        let (_, shop) = funded_engines(10).await;
        assert!(matches!(
            shop.buy("user_1", "no_such_item").await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            shop.buy("ghost", "xp_booster").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_use_flips_once_and_activates_buff() {
        let (store, shop) = funded_engines(1000).await;

        shop.buy("user_1", "xp_booster").await.unwrap();
        let outcome = shop.use_item("user_1", "xp_booster").await.unwrap();
        assert!(matches!(
            outcome.effect,
            ItemEffect::TimedBuff {
                kind: BuffKind::XpMultiplier,
                value: 200,
                ..
            }
        ));

        let (account, _) = store.read_account("user_1").await.unwrap().unwrap();
        assert_eq!(account.active_buffs.len(), 1);
        assert!(account.inventory[0].used);
        assert!(account.inventory[0].used_at.is_some());

        // No unused instance left.
        let again = shop.use_item("user_1", "xp_booster").await;
        assert!(matches!(again, Err(CoreError::ItemNotOwned(_))));
    }

    #[tokio::test]
    async fn test_use_without_owning_fails_unchanged() {
        let (store, shop) = funded_engines(1000).await;

        let result = shop.use_item("user_1", "vip_role").await;
        assert!(matches!(result, Err(CoreError::ItemNotOwned(_))));

        let (account, _) = store.read_account("user_1").await.unwrap().unwrap();
        assert_eq!(account.points, 1000);
        assert!(account.active_buffs.is_empty());
    }

    #[tokio::test]
    async fn test_inventory_groups_unused_by_item() {
        let (_, shop) = funded_engines(1500).await;

        shop.buy("user_1", "xp_booster").await.unwrap();
        shop.buy("user_1", "xp_booster").await.unwrap();
        shop.buy("user_1", "mystery_box").await.unwrap();
        shop.use_item("user_1", "xp_booster").await.unwrap();

        let lines = shop.inventory("user_1").await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].item_id, "xp_booster");
        assert_eq!(lines[0].count, 1);
        assert_eq!(lines[1].item_id, "mystery_box");
        assert_eq!(lines[1].count, 1);

        // Absent account reads as empty, not an error.
        assert!(shop.inventory("ghost").await.unwrap().is_empty());
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        for (i, item) in CATALOG.iter().enumerate() {
            assert!(
                CATALOG[i + 1..].iter().all(|other| other.id != item.id),
                "duplicate catalog id: {}",
                item.id
            );
        }
    }
}

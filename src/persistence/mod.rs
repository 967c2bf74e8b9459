//! Progress persistence and the player's economy
//!
//! Storage is a plain string key-value contract so the same records work on
//! a JSON file natively or any host-provided store.

pub mod progress;
pub mod store;
pub mod wallet;

pub use progress::{Progress, UpgradeKind, UpgradeLevels, upgrade_cost};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use wallet::{Currency, LEDGER_CAPACITY, Transaction, Wallet};

//! Currency balances with a short transaction history

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::progress::{UpgradeKind, UpgradeLevels};

/// Entries kept in the ledger before the oldest are dropped
pub const LEDGER_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Coins,
    Gems,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub currency: Currency,
    /// Positive for income, negative for spending
    pub amount: i64,
    /// Where the money came from or went
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    coins: u64,
    gems: u64,
    ledger: VecDeque<Transaction>,
}

impl Wallet {
    pub fn new(coins: u64, gems: u64) -> Self {
        Self {
            coins,
            gems,
            ledger: VecDeque::new(),
        }
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn gems(&self) -> u64 {
        self.gems
    }

    /// Most recent last
    pub fn ledger(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.ledger.iter()
    }

    pub fn add_coins(&mut self, amount: u64, source: &str) {
        if amount == 0 {
            return;
        }
        self.coins = self.coins.saturating_add(amount);
        self.record(Currency::Coins, amount as i64, source);
    }

    pub fn add_gems(&mut self, amount: u64, source: &str) {
        if amount == 0 {
            return;
        }
        self.gems = self.gems.saturating_add(amount);
        self.record(Currency::Gems, amount as i64, source);
        log::info!("+{} gems ({})", amount, source);
    }

    /// Returns false (and changes nothing) when the balance is short
    pub fn spend_coins(&mut self, amount: u64, purpose: &str) -> bool {
        if amount > self.coins {
            return false;
        }
        self.coins -= amount;
        self.record(Currency::Coins, -(amount as i64), purpose);
        true
    }

    pub fn spend_gems(&mut self, amount: u64, purpose: &str) -> bool {
        if amount > self.gems {
            return false;
        }
        self.gems -= amount;
        self.record(Currency::Gems, -(amount as i64), purpose);
        true
    }

    /// Buy the next level of an upgrade if affordable
    pub fn purchase_upgrade(&mut self, upgrades: &mut UpgradeLevels, kind: UpgradeKind) -> bool {
        let cost = upgrades.cost(kind);
        if !self.spend_coins(cost, kind.as_str()) {
            return false;
        }
        upgrades.increment(kind);
        log::info!("Upgraded {} to level {} for {} coins", kind.as_str(), upgrades.level(kind), cost);
        true
    }

    fn record(&mut self, currency: Currency, amount: i64, reason: &str) {
        if self.ledger.len() == LEDGER_CAPACITY {
            self.ledger.pop_front();
        }
        self.ledger.push_back(Transaction {
            currency,
            amount,
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_guards_balance() {
        let mut w = Wallet::new(10, 3);
        assert!(!w.spend_gems(5, "pull"));
        assert_eq!(w.gems(), 3);
        assert!(w.spend_gems(3, "pull"));
        assert_eq!(w.gems(), 0);
        assert!(w.spend_coins(10, "shop"));
        assert!(!w.spend_coins(1, "shop"));
        assert_eq!(w.ledger().count(), 2);
    }

    #[test]
    fn test_ledger_is_bounded() {
        let mut w = Wallet::default();
        for i in 0..100 {
            w.add_coins(1, &format!("kill {i}"));
        }
        assert_eq!(w.coins(), 100);
        assert_eq!(w.ledger().count(), LEDGER_CAPACITY);
        assert_eq!(w.ledger().next().map(|t| t.reason.as_str()), Some("kill 36"));
    }

    #[test]
    fn test_purchase_upgrade() {
        let mut w = Wallet::new(25, 0);
        let mut levels = UpgradeLevels::default();
        assert!(w.purchase_upgrade(&mut levels, UpgradeKind::Range));
        assert!(w.purchase_upgrade(&mut levels, UpgradeKind::Range));
        assert_eq!(w.coins(), 3);
        assert!(!w.purchase_upgrade(&mut levels, UpgradeKind::Range));
        assert_eq!(levels.range, 2);
    }
}

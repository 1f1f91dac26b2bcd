//! Asset-transfer boundary.
//!
//! The ledger never touches balances directly: it mints reward and moves stake
//! through a [`FungibleAssetPort`]. Assets may tax or burn part of a transfer,
//! or cap a mint, so every call reports what the receiver was actually
//! credited and the ledger accounts with that figure.

use std::collections::{HashMap, HashSet};

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    constants::BPS_DENOMINATOR,
    error::{FarmError, Result},
    journal::JournaledMap,
};

/// Value-transfer capability injected into the farm.
///
/// Calls between [`checkpoint`](Self::checkpoint) and
/// [`commit`](Self::commit) / [`rollback`](Self::rollback) form one unit of
/// work that the farm either keeps or discards as a whole.
pub trait FungibleAssetPort {
    /// Create `amount` new units of `asset` for `to`. Returns the units minted.
    fn mint(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64>;

    /// Pull `amount` from an external account that authorised the farm.
    /// Returns the units credited to `to`.
    fn transfer_from(&mut self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64>;

    /// Move `amount` out of an account the farm controls.
    /// Returns the units credited to `to`.
    fn transfer(&mut self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64>;

    fn balance_of(&self, asset: &Pubkey, owner: &Pubkey) -> u64;

    fn checkpoint(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}

// ─── In-memory assets ─────────────────────────────────────────────────────────

/// Per-asset transfer behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRules {
    /// Skimmed from every non-exempt transfer
    pub transfer_tax_bps: u16,
    /// Receives the tax; `None` burns it
    pub tax_collector:    Option<Pubkey>,
    /// Mints beyond this total supply are truncated
    pub max_supply:       Option<u64>,
    /// Transfers from or to these accounts are untaxed
    pub exempt:           HashSet<Pubkey>,
}

/// Reference [`FungibleAssetPort`] keeping every asset's balances in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    balances: JournaledMap<(Pubkey, Pubkey), u64>,
    supply:   JournaledMap<Pubkey, u64>,
    burned:   JournaledMap<Pubkey, u64>,
    rules:    HashMap<Pubkey, AssetRules>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rules(&mut self, asset: Pubkey, rules: AssetRules) -> Result<()> {
        if rules.transfer_tax_bps as u128 > BPS_DENOMINATOR {
            return Err(FarmError::InvalidArgument(format!(
                "transfer tax {} bps exceeds 10000",
                rules.transfer_tax_bps
            )));
        }
        self.rules.insert(asset, rules);
        Ok(())
    }

    pub fn rules(&self, asset: &Pubkey) -> Option<&AssetRules> {
        self.rules.get(asset)
    }

    /// Seed an external balance outside any farm operation.
    pub fn credit(&mut self, asset: Pubkey, owner: Pubkey, amount: u64) -> Result<()> {
        self.mint(&asset, &owner, amount).and_then(|minted| {
            if minted == amount {
                Ok(())
            } else {
                Err(FarmError::AssetTransfer(format!(
                    "max supply of {asset} allows only {minted} of {amount}"
                )))
            }
        })
    }

    pub fn total_supply(&self, asset: &Pubkey) -> u64 {
        self.supply.value(asset)
    }

    pub fn total_burned(&self, asset: &Pubkey) -> u64 {
        self.burned.value(asset)
    }

    /// Balances never exceed supply, which is capped at u64::MAX, so the
    /// additions below cannot wrap.
    fn add_balance(&mut self, asset: &Pubkey, owner: &Pubkey, amount: u64) {
        let balance = self.balance_of(asset, owner);
        self.balances.insert((*asset, *owner), balance + amount);
    }

    fn sub_balance(&mut self, asset: &Pubkey, owner: &Pubkey, amount: u64) {
        let balance = self.balance_of(asset, owner);
        self.balances.insert((*asset, *owner), balance - amount);
    }

    fn move_units(&mut self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(FarmError::InsufficientBalance {
                asset:     *asset,
                owner:     *from,
                requested: amount,
                available,
            });
        }
        if amount == 0 || from == to {
            return Ok(amount);
        }

        let (tax, collector) = match self.rules.get(asset) {
            Some(r) if r.transfer_tax_bps > 0 && !r.exempt.contains(from) && !r.exempt.contains(to) => {
                let tax = (amount as u128 * r.transfer_tax_bps as u128 / BPS_DENOMINATOR) as u64;
                (tax, r.tax_collector)
            }
            _ => (0, None),
        };
        let received = amount - tax;

        self.sub_balance(asset, from, amount);
        self.add_balance(asset, to, received);
        if tax > 0 {
            match collector {
                Some(c) => self.add_balance(asset, &c, tax),
                None => {
                    let (supply, burned) = (self.total_supply(asset), self.total_burned(asset));
                    self.supply.insert(*asset, supply - tax);
                    self.burned.insert(*asset, burned + tax);
                }
            }
            debug!(%asset, %from, %to, amount, tax, "transfer taxed");
        }
        Ok(received)
    }
}

impl FungibleAssetPort for InMemoryAssets {
    fn mint(&mut self, asset: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64> {
        let supply = self.total_supply(asset);
        let headroom = self
            .rules
            .get(asset)
            .and_then(|r| r.max_supply)
            .map_or(u64::MAX - supply, |max| max.saturating_sub(supply));
        let minted = amount.min(headroom);
        if minted == 0 {
            return Ok(0);
        }
        self.add_balance(asset, to, minted);
        self.supply.insert(*asset, supply + minted);
        Ok(minted)
    }

    fn transfer_from(&mut self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64> {
        self.move_units(asset, from, to, amount)
    }

    fn transfer(&mut self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<u64> {
        self.move_units(asset, from, to, amount)
    }

    fn balance_of(&self, asset: &Pubkey, owner: &Pubkey) -> u64 {
        self.balances.value(&(*asset, *owner))
    }

    fn checkpoint(&mut self) {
        self.balances.checkpoint();
        self.supply.checkpoint();
        self.burned.checkpoint();
    }

    fn commit(&mut self) {
        self.balances.commit();
        self.supply.commit();
        self.burned.commit();
    }

    fn rollback(&mut self) {
        self.balances.rollback();
        self.supply.rollback();
        self.burned.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (Pubkey, Pubkey, Pubkey) {
        (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique())
    }

    #[test]
    fn plain_transfer_delivers_everything() {
        let (asset, alice, bob) = keys();
        let mut assets = InMemoryAssets::new();
        assets.credit(asset, alice, 1_000).unwrap();
        assert_eq!(assets.transfer(&asset, &alice, &bob, 400).unwrap(), 400);
        assert_eq!(assets.balance_of(&asset, &alice), 600);
        assert_eq!(assets.balance_of(&asset, &bob), 400);
    }

    #[test]
    fn taxed_transfer_burns_the_tax() {
        let (asset, alice, bob) = keys();
        let mut assets = InMemoryAssets::new();
        assets
            .set_rules(asset, AssetRules { transfer_tax_bps: 500, ..AssetRules::default() })
            .unwrap();
        assets.credit(asset, alice, 1_000).unwrap();
        assert_eq!(assets.transfer_from(&asset, &alice, &bob, 1_000).unwrap(), 950);
        assert_eq!(assets.total_supply(&asset), 950);
        assert_eq!(assets.total_burned(&asset), 50);
    }

    #[test]
    fn taxed_transfer_pays_collector_and_skips_exempt() {
        let (asset, alice, bob) = keys();
        let collector = Pubkey::new_unique();
        let mut assets = InMemoryAssets::new();
        let mut rules = AssetRules {
            transfer_tax_bps: 1_000,
            tax_collector: Some(collector),
            ..AssetRules::default()
        };
        rules.exempt.insert(bob);
        assets.set_rules(asset, rules).unwrap();
        assets.credit(asset, alice, 100).unwrap();

        assert_eq!(assets.transfer(&asset, &alice, &collector, 50).unwrap(), 45);
        assert_eq!(assets.balance_of(&asset, &collector), 50);
        assert_eq!(assets.transfer(&asset, &alice, &bob, 50).unwrap(), 50);
        assert_eq!(assets.total_supply(&asset), 100);
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let (asset, alice, bob) = keys();
        let mut assets = InMemoryAssets::new();
        assets.credit(asset, alice, 10).unwrap();
        let err = assets.transfer(&asset, &alice, &bob, 11).unwrap_err();
        assert_eq!(err.code(), "InsufficientBalance");
        assert_eq!(assets.balance_of(&asset, &alice), 10);
    }

    #[test]
    fn mint_is_capped_by_max_supply() {
        let (asset, alice, _) = keys();
        let mut assets = InMemoryAssets::new();
        assets
            .set_rules(asset, AssetRules { max_supply: Some(100), ..AssetRules::default() })
            .unwrap();
        assert_eq!(assets.mint(&asset, &alice, 80).unwrap(), 80);
        assert_eq!(assets.mint(&asset, &alice, 80).unwrap(), 20);
        assert_eq!(assets.mint(&asset, &alice, 80).unwrap(), 0);
        assert!(assets.credit(asset, alice, 1).is_err());
    }

    #[test]
    fn rollback_restores_checkpoint() {
        let (asset, alice, bob) = keys();
        let mut assets = InMemoryAssets::new();
        assets.credit(asset, alice, 100).unwrap();

        assets.checkpoint();
        assets.transfer(&asset, &alice, &bob, 60).unwrap();
        assets.mint(&asset, &bob, 5).unwrap();
        assets.rollback();
        assert_eq!(assets.balance_of(&asset, &alice), 100);
        assert_eq!(assets.balance_of(&asset, &bob), 0);
        assert_eq!(assets.total_supply(&asset), 100);

        assets.checkpoint();
        assets.transfer(&asset, &alice, &bob, 60).unwrap();
        assets.commit();
        assets.rollback();
        assert_eq!(assets.balance_of(&asset, &bob), 60);
    }

    #[test]
    fn rejects_tax_above_one_hundred_percent() {
        let (asset, _, _) = keys();
        let mut assets = InMemoryAssets::new();
        let err = assets
            .set_rules(asset, AssetRules { transfer_tax_bps: 10_001, ..AssetRules::default() })
            .unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
    }
}

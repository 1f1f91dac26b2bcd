#![allow(dead_code)]

use solana_sdk::pubkey::Pubkey;
use yield_farm::{Clock, Farm, FarmAccounts, FarmConfig, FungibleAssetPort, InMemoryAssets};

pub const T0: i64 = 1_700_000_000;

pub struct Harness {
    pub farm:     Farm<InMemoryAssets>,
    pub accounts: FarmAccounts,
}

pub fn accounts() -> FarmAccounts {
    FarmAccounts {
        authority:     Pubkey::new_unique(),
        vault_custody: Pubkey::new_unique(),
        reward_asset:  Pubkey::new_unique(),
        operator:      Pubkey::new_unique(),
        dev:           Pubkey::new_unique(),
        treasury:      Pubkey::new_unique(),
    }
}

pub fn harness(config: FarmConfig) -> Harness {
    let accounts = accounts();
    let farm = Farm::new(InMemoryAssets::new(), accounts, config).unwrap();
    Harness { farm, accounts }
}

/// Block `block`, wall clock fixed at `T0`.
pub fn at(block: u64) -> Clock {
    Clock::new(block, T0)
}

impl Harness {
    /// Add a pool for a fresh stake asset and fund `holders` with `balance` of it.
    pub fn pool(&mut self, alloc_point: u64, deposit_fee_bps: u16, holders: &[Pubkey], balance: u64) -> (usize, Pubkey) {
        let asset = Pubkey::new_unique();
        for holder in holders {
            self.farm.assets_mut().credit(asset, *holder, balance).unwrap();
        }
        let pid = self
            .farm
            .add_pool(self.accounts.operator, asset, alloc_point, deposit_fee_bps, true, at(0))
            .unwrap();
        (pid, asset)
    }

    pub fn balance(&self, asset: &Pubkey, owner: &Pubkey) -> u64 {
        self.farm.assets().balance_of(asset, owner)
    }

    pub fn reward_balance(&self, owner: &Pubkey) -> u64 {
        self.balance(&self.accounts.reward_asset, owner)
    }
}

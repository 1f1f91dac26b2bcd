use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::*,
    error::{FarmError, Result},
    math,
    vesting::VestingSchedule,
};

/// Ordinal index of a pool. Stable: pools are append-only.
pub type PoolId = usize;

// ─── Clock ────────────────────────────────────────────────────────────────────
// Supplied by the caller on every operation; the ledger has no ambient time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    /// Block height; drives reward emission.
    pub block: u64,
    /// Unix seconds; drives vesting.
    pub unix_timestamp: i64,
}

impl Clock {
    pub fn new(block: u64, unix_timestamp: i64) -> Self {
        Self { block, unix_timestamp }
    }
}

// ─── Pool ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub stake_asset:          Pubkey,
    /// Share of global emission relative to `total_alloc_point`
    pub alloc_point:          u64,
    pub deposit_fee_bps:      u16,
    /// Cumulative reward per staked unit, scaled by ACC_REWARD_PRECISION
    pub acc_reward_per_share: u128,
    pub last_reward_block:    u64,
    /// Sum of every UserStake.amount in this pool
    pub total_staked:         u64,
}

impl Pool {
    pub fn new(stake_asset: Pubkey, alloc_point: u64, deposit_fee_bps: u16, last_reward_block: u64) -> Self {
        Self {
            stake_asset,
            alloc_point,
            deposit_fee_bps,
            acc_reward_per_share: 0,
            last_reward_block,
            total_staked: 0,
        }
    }
}

// ─── UserStake ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStake {
    pub amount:      u64,
    /// amount * acc_reward_per_share / PRECISION at last settlement
    pub reward_debt: u128,
}

impl UserStake {
    /// Reward accrued since the last settlement at accumulator `acc`.
    pub fn pending(&self, acc: u128) -> Result<u64> {
        let accumulated = math::accumulated_reward(self.amount, acc)?;
        u64::try_from(accumulated.saturating_sub(self.reward_debt)).map_err(|_| FarmError::MathOverflow)
    }

    /// Re-snapshot the debt after `amount` has changed.
    pub fn checkpoint(&mut self, acc: u128) -> Result<()> {
        self.reward_debt = math::accumulated_reward(self.amount, acc)?;
        Ok(())
    }
}

// ─── VestingAccount ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VestingAccount {
    /// Cumulative units ever locked
    pub total_locked:      u64,
    /// Cumulative units ever released
    pub total_withdrawn:   u64,
    /// Anchor of the release schedule; reset by every deposit
    pub last_deposit_time: i64,
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Tunable economics of a farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Reward units emitted per block across all pools
    pub emission_per_block:      u64,
    /// No pool accrues before this block
    pub start_block:             u64,
    /// Blocks before this height earn `bonus_multiplier` times the emission
    pub bonus_end_block:         u64,
    pub bonus_multiplier:        u64,
    /// Commission minted for the referrer, on top of the harvested reward
    pub referral_commission_bps: u16,
    /// Part of each deposit fee routed to the treasury; the dev sink gets the rest
    pub treasury_fee_share_bps:  u16,
    pub vesting:                 VestingSchedule,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            emission_per_block:      1_000_000_000,
            start_block:             0,
            bonus_end_block:         0,
            bonus_multiplier:        1,
            referral_commission_bps: DEFAULT_REFERRAL_COMMISSION_BPS,
            treasury_fee_share_bps:  DEFAULT_TREASURY_FEE_SHARE_BPS,
            vesting:                 VestingSchedule::default(),
        }
    }
}

impl FarmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bonus_multiplier == 0 {
            return Err(FarmError::InvalidArgument("bonus_multiplier must be at least 1".into()));
        }
        if self.referral_commission_bps > MAX_REFERRAL_COMMISSION_BPS {
            return Err(FarmError::InvalidCommissionRate {
                rate: self.referral_commission_bps,
                max:  MAX_REFERRAL_COMMISSION_BPS,
            });
        }
        if self.treasury_fee_share_bps as u128 > BPS_DENOMINATOR {
            return Err(FarmError::InvalidArgument(format!(
                "treasury_fee_share_bps {} exceeds 10000",
                self.treasury_fee_share_bps
            )));
        }
        self.vesting.validate()
    }
}

/// Identities the farm is wired to at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmAccounts {
    /// The ledger's own identity: custody of staked assets and minted reward,
    /// and the sole operator of the referral registry and vault depositor.
    pub authority:     Pubkey,
    /// Custody account of locked (vesting) reward
    pub vault_custody: Pubkey,
    pub reward_asset:  Pubkey,
    pub operator:      Pubkey,
    pub dev:           Pubkey,
    pub treasury:      Pubkey,
}

impl FarmAccounts {
    pub fn validate(&self) -> Result<()> {
        let named = [
            (self.authority, "authority"),
            (self.vault_custody, "vault_custody"),
            (self.reward_asset, "reward_asset"),
            (self.operator, "operator"),
            (self.dev, "dev"),
            (self.treasury, "treasury"),
        ];
        for (key, name) in named {
            if key == Pubkey::default() {
                return Err(FarmError::ZeroAddress(name));
            }
        }
        if self.authority == self.vault_custody {
            return Err(FarmError::InvalidArgument(
                "vault_custody must differ from the farm authority".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> FarmAccounts {
        FarmAccounts {
            authority:     Pubkey::new_unique(),
            vault_custody: Pubkey::new_unique(),
            reward_asset:  Pubkey::new_unique(),
            operator:      Pubkey::new_unique(),
            dev:           Pubkey::new_unique(),
            treasury:      Pubkey::new_unique(),
        }
    }

    #[test]
    fn pending_is_accumulated_minus_debt() {
        let mut stake = UserStake { amount: 100, reward_debt: 0 };
        let acc = 100_000_000_000; // 0.1 reward per unit
        assert_eq!(stake.pending(acc).unwrap(), 10);
        stake.checkpoint(acc).unwrap();
        assert_eq!(stake.pending(acc).unwrap(), 0);
        assert_eq!(stake.pending(acc * 2).unwrap(), 10);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(FarmConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_excessive_commission() {
        let config = FarmConfig { referral_commission_bps: 1_001, ..FarmConfig::default() };
        assert_eq!(config.validate().unwrap_err().code(), "InvalidCommissionRate");
    }

    #[test]
    fn config_rejects_zero_bonus_multiplier() {
        let config = FarmConfig { bonus_multiplier: 0, ..FarmConfig::default() };
        assert_eq!(config.validate().unwrap_err().code(), "InvalidArgument");
    }

    #[test]
    fn config_deserializes_partial_json() {
        let config: FarmConfig =
            serde_json::from_str(r#"{ "emission_per_block": 1, "start_block": 10 }"#).unwrap();
        assert_eq!(config.emission_per_block, 1);
        assert_eq!(config.start_block, 10);
        assert_eq!(config.bonus_multiplier, 1);
    }

    #[test]
    fn accounts_reject_zero_keys() {
        let mut a = accounts();
        assert!(a.validate().is_ok());
        a.dev = Pubkey::default();
        assert_eq!(a.validate().unwrap_err(), FarmError::ZeroAddress("dev"));
    }

    #[test]
    fn accounts_reject_shared_custody() {
        let mut a = accounts();
        a.vault_custody = a.authority;
        assert_eq!(a.validate().unwrap_err().code(), "InvalidArgument");
    }
}

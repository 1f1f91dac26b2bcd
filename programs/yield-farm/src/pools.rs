use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::MAX_DEPOSIT_FEE_BPS,
    error::{FarmError, Result},
    state::{Pool, PoolId},
};

/// Ordered, append-only pool set with the global allocation total.
///
/// Pure bookkeeping: role checks and accrual happen in the ledger before any
/// of these methods run.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools:             Vec<Pool>,
    total_alloc_point: u64,
}

pub fn validate_fee(deposit_fee_bps: u16) -> Result<()> {
    if deposit_fee_bps > MAX_DEPOSIT_FEE_BPS {
        return Err(FarmError::InvalidFeeRate(deposit_fee_bps));
    }
    Ok(())
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn total_alloc_point(&self) -> u64 {
        self.total_alloc_point
    }

    pub fn get(&self, pid: PoolId) -> Result<&Pool> {
        self.pools.get(pid).ok_or(FarmError::InvalidPool(pid))
    }

    pub fn get_mut(&mut self, pid: PoolId) -> Result<&mut Pool> {
        self.pools.get_mut(pid).ok_or(FarmError::InvalidPool(pid))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().enumerate()
    }

    pub fn find_by_asset(&self, stake_asset: &Pubkey) -> Option<PoolId> {
        self.pools.iter().position(|p| p.stake_asset == *stake_asset)
    }

    /// Units of `asset` held as stake across pools.
    pub fn staked_of(&self, asset: &Pubkey) -> u64 {
        self.find_by_asset(asset).map_or(0, |pid| self.pools[pid].total_staked)
    }

    /// Check that a pool for `stake_asset` could be appended.
    pub fn validate_new(&self, stake_asset: &Pubkey, alloc_point: u64, deposit_fee_bps: u16) -> Result<()> {
        validate_fee(deposit_fee_bps)?;
        if *stake_asset == Pubkey::default() {
            return Err(FarmError::ZeroAddress("add_pool"));
        }
        if self.find_by_asset(stake_asset).is_some() {
            return Err(FarmError::DuplicatePool(*stake_asset));
        }
        self.total_alloc_point
            .checked_add(alloc_point)
            .ok_or(FarmError::MathOverflow)?;
        Ok(())
    }

    /// Append a pool; returns its id.
    pub fn push(
        &mut self,
        stake_asset: Pubkey,
        alloc_point: u64,
        deposit_fee_bps: u16,
        last_reward_block: u64,
    ) -> Result<PoolId> {
        self.validate_new(&stake_asset, alloc_point, deposit_fee_bps)?;
        self.total_alloc_point += alloc_point;
        self.pools
            .push(Pool::new(stake_asset, alloc_point, deposit_fee_bps, last_reward_block));
        Ok(self.pools.len() - 1)
    }

    /// Change weight and fee of an existing pool in place.
    pub fn reconfigure(&mut self, pid: PoolId, alloc_point: u64, deposit_fee_bps: u16) -> Result<()> {
        validate_fee(deposit_fee_bps)?;
        let previous = self.get(pid)?.alloc_point;
        let total = (self.total_alloc_point - previous)
            .checked_add(alloc_point)
            .ok_or(FarmError::MathOverflow)?;
        let pool = self.get_mut(pid)?;
        pool.alloc_point = alloc_point;
        pool.deposit_fee_bps = deposit_fee_bps;
        self.total_alloc_point = total;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_and_tracks_total() {
        let mut registry = PoolRegistry::new();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert_eq!(registry.push(a, 1_000, 400, 10).unwrap(), 0);
        assert_eq!(registry.push(b, 2_000, 0, 12).unwrap(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.total_alloc_point(), 3_000);
        assert_eq!(registry.get(1).unwrap().last_reward_block, 12);
        assert_eq!(registry.find_by_asset(&b), Some(1));
    }

    #[test]
    fn push_rejects_bad_input() {
        let mut registry = PoolRegistry::new();
        let a = Pubkey::new_unique();
        assert_eq!(registry.push(a, 1, 10_001, 0).unwrap_err(), FarmError::InvalidFeeRate(10_001));
        assert_eq!(
            registry.push(Pubkey::default(), 1, 0, 0).unwrap_err(),
            FarmError::ZeroAddress("add_pool")
        );
        registry.push(a, 1, 10_000, 0).unwrap();
        assert_eq!(registry.push(a, 1, 0, 0).unwrap_err(), FarmError::DuplicatePool(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reconfigure_adjusts_total() {
        let mut registry = PoolRegistry::new();
        registry.push(Pubkey::new_unique(), 1_000, 0, 0).unwrap();
        registry.push(Pubkey::new_unique(), 2_000, 0, 0).unwrap();
        registry.reconfigure(0, 500, 100).unwrap();
        assert_eq!(registry.total_alloc_point(), 2_500);
        assert_eq!(registry.get(0).unwrap().deposit_fee_bps, 100);
    }

    #[test]
    fn reconfigure_rejects_unknown_pool_and_bad_fee() {
        let mut registry = PoolRegistry::new();
        registry.push(Pubkey::new_unique(), 1_000, 0, 0).unwrap();
        assert_eq!(registry.reconfigure(1, 1, 0).unwrap_err(), FarmError::InvalidPool(1));
        assert_eq!(registry.reconfigure(0, 1, 20_000).unwrap_err(), FarmError::InvalidFeeRate(20_000));
        assert_eq!(registry.get(0).unwrap().alloc_point, 1_000);
    }
}

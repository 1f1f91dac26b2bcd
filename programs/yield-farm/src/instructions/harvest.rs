use solana_sdk::pubkey::Pubkey;

use crate::{
    asset::FungibleAssetPort,
    error::Result,
    ledger::Farm,
    state::{Clock, PoolId},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Settle pending reward without touching the stake. Returns the amount locked
/// in the vault (0 when nothing was pending).
pub fn handler<A: FungibleAssetPort>(farm: &mut Farm<A>, caller: Pubkey, pid: PoolId, clock: Clock) -> Result<u64> {
    farm.accrue(pid, clock.block)?;

    let (_, _, acc) = farm.pool_snapshot(pid)?;
    let mut stake = farm.user_stake(pid, &caller);
    let pending = stake.pending(acc)?;
    if pending == 0 {
        return Ok(0);
    }
    let paid = farm.settle_pending(pid, caller, pending, &clock)?;

    stake.checkpoint(acc)?;
    farm.store_stake(pid, caller, stake);
    Ok(paid)
}

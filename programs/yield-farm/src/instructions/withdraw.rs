use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    error::{FarmError, Result},
    events::FarmEvent,
    ledger::Farm,
    state::{Clock, PoolId},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Unstake `amount`, settling pending reward into the vault first.
pub fn handler<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    pid: PoolId,
    amount: u64,
    clock: Clock,
) -> Result<()> {
    farm.accrue(pid, clock.block)?;

    let (stake_asset, _, acc) = farm.pool_snapshot(pid)?;
    let mut stake = farm.user_stake(pid, &caller);
    if amount > stake.amount {
        return Err(FarmError::InsufficientStake { requested: amount, staked: stake.amount });
    }

    let pending = stake.pending(acc)?;
    farm.settle_pending(pid, caller, pending, &clock)?;

    if amount > 0 {
        stake.amount -= amount;
        let pool = farm.state.pools.get_mut(pid)?;
        pool.total_staked = pool
            .total_staked
            .checked_sub(amount)
            .ok_or(FarmError::MathOverflow)?;
        farm.assets.transfer(&stake_asset, &farm.authority, &caller, amount)?;
        info!(%caller, pid, amount, remaining = stake.amount, "withdraw");
    }

    stake.checkpoint(acc)?;
    farm.store_stake(pid, caller, stake);
    farm.events.emit(FarmEvent::Withdraw { user: caller, pid, amount });
    Ok(())
}

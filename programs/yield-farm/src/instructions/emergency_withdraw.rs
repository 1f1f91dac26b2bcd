use solana_sdk::pubkey::Pubkey;
use tracing::warn;

use crate::{
    asset::FungibleAssetPort,
    error::{FarmError, Result},
    events::FarmEvent,
    ledger::Farm,
    state::{Clock, PoolId, UserStake},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Return the whole stake and forfeit any pending reward.
/// No accrual runs, so this works even if reward minting is broken.
pub fn handler<A: FungibleAssetPort>(farm: &mut Farm<A>, caller: Pubkey, pid: PoolId, clock: Clock) -> Result<u64> {
    let (stake_asset, _, _) = farm.pool_snapshot(pid)?;
    let amount = farm.user_stake(pid, &caller).amount;

    let pool = farm.state.pools.get_mut(pid)?;
    pool.total_staked = pool
        .total_staked
        .checked_sub(amount)
        .ok_or(FarmError::MathOverflow)?;
    farm.store_stake(pid, caller, UserStake::default());

    if amount > 0 {
        farm.assets.transfer(&stake_asset, &farm.authority, &caller, amount)?;
    }

    warn!(%caller, pid, amount, block = clock.block, "emergency withdraw, pending reward forfeited");
    farm.events.emit(FarmEvent::EmergencyWithdraw { user: caller, pid, amount });
    Ok(amount)
}

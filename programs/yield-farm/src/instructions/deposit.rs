use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    error::{FarmError, Result},
    events::FarmEvent,
    ledger::Farm,
    math::{self, DepositSplit},
    state::{Clock, PoolId},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Stake `amount` of the pool's asset, settling any pending reward first.
///
/// The stake is credited with what the farm actually received, less the
/// deposit fee. The fee is split between treasury and dev on the spot.
/// `referrer` is recorded only on the caller's first valid referral.
///
/// Returns the amount credited to the stake.
pub fn handler<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    pid: PoolId,
    amount: u64,
    referrer: Pubkey,
    clock: Clock,
) -> Result<u64> {
    farm.accrue(pid, clock.block)?;

    if referrer != Pubkey::default() && referrer != caller && farm.state.referral.referrer_of(&caller).is_none() {
        farm.state
            .referral
            .record_referral(&farm.authority, caller, referrer, &mut farm.events)?;
    }

    let (stake_asset, fee_bps, acc) = farm.pool_snapshot(pid)?;
    let mut stake = farm.user_stake(pid, &caller);
    let pending = stake.pending(acc)?;
    farm.settle_pending(pid, caller, pending, &clock)?;

    let mut split = DepositSplit::default();
    if amount > 0 {
        let received = farm
            .assets
            .transfer_from(&stake_asset, &caller, &farm.authority, amount)?;
        if received == 0 {
            return Err(FarmError::ZeroReceived { requested: amount });
        }
        split = math::split_deposit(received, fee_bps, farm.state.config.treasury_fee_share_bps)?;

        let roles = farm.state.roles;
        if split.treasury > 0 {
            farm.assets
                .transfer(&stake_asset, &farm.authority, &roles.treasury, split.treasury)?;
        }
        if split.dev > 0 {
            farm.assets.transfer(&stake_asset, &farm.authority, &roles.dev, split.dev)?;
        }

        stake.amount = stake.amount.checked_add(split.net).ok_or(FarmError::MathOverflow)?;
        let pool = farm.state.pools.get_mut(pid)?;
        pool.total_staked = pool
            .total_staked
            .checked_add(split.net)
            .ok_or(FarmError::MathOverflow)?;
        info!(%caller, pid, requested = amount, received, fee = split.fee, credited = split.net, "deposit");
    }

    stake.checkpoint(acc)?;
    farm.store_stake(pid, caller, stake);
    farm.events.emit(FarmEvent::Deposit { user: caller, pid, amount: split.net, fee: split.fee });
    Ok(split.net)
}

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    error::Result,
    events::FarmEvent,
    ledger::Farm,
    roles::Role,
    state::{Clock, PoolId},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Register a pool for `stake_asset`. Operator only.
/// Without `with_update` the new weight dilutes what other pools have
/// accrued since their last update.
pub fn handler<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    stake_asset: Pubkey,
    alloc_point: u64,
    deposit_fee_bps: u16,
    with_update: bool,
    clock: Clock,
) -> Result<PoolId> {
    farm.state.roles.require(Role::Operator, &caller, "add_pool")?;
    farm.state.pools.validate_new(&stake_asset, alloc_point, deposit_fee_bps)?;

    if with_update {
        farm.accrue_all(clock.block)?;
    }

    let last_reward_block = clock.block.max(farm.state.config.start_block);
    let pid = farm
        .state
        .pools
        .push(stake_asset, alloc_point, deposit_fee_bps, last_reward_block)?;

    info!(pid, %stake_asset, alloc_point, deposit_fee_bps, last_reward_block, "pool added");
    farm.events.emit(FarmEvent::PoolAdded { pid, stake_asset, alloc_point, deposit_fee_bps });
    Ok(pid)
}

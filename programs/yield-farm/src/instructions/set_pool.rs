use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    error::Result,
    events::FarmEvent,
    ledger::Farm,
    pools,
    roles::Role,
    state::{Clock, PoolId},
};

// ─── Handler ──────────────────────────────────────────────────────────────────
/// Change weight and deposit fee of `pid`. Operator only.
pub fn handler<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    pid: PoolId,
    alloc_point: u64,
    deposit_fee_bps: u16,
    with_update: bool,
    clock: Clock,
) -> Result<()> {
    farm.state.roles.require(Role::Operator, &caller, "set_pool")?;
    farm.state.pools.get(pid)?;
    pools::validate_fee(deposit_fee_bps)?;

    if with_update {
        farm.accrue_all(clock.block)?;
    }
    farm.state.pools.reconfigure(pid, alloc_point, deposit_fee_bps)?;

    info!(pid, alloc_point, deposit_fee_bps, total_alloc_point = farm.state.pools.total_alloc_point(), "pool updated");
    farm.events.emit(FarmEvent::PoolUpdated { pid, alloc_point, deposit_fee_bps });
    Ok(())
}

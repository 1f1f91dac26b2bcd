use crate::{
    asset::FungibleAssetPort,
    error::Result,
    ledger::Farm,
    state::{Clock, PoolId},
};

// ─── Handlers ─────────────────────────────────────────────────────────────────
// Permissionless: anyone may push accrual forward.

pub fn handler<A: FungibleAssetPort>(farm: &mut Farm<A>, pid: PoolId, clock: Clock) -> Result<()> {
    farm.accrue(pid, clock.block)
}

pub fn mass_handler<A: FungibleAssetPort>(farm: &mut Farm<A>, clock: Clock) -> Result<()> {
    farm.accrue_all(clock.block)
}

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    error::Result,
    events::FarmEvent,
    ledger::Farm,
    state::Clock,
};

// ─── Vested reward ────────────────────────────────────────────────────────────

/// Release `amount` of the caller's unlocked reward from vault custody.
pub fn withdraw_vested<A: FungibleAssetPort>(farm: &mut Farm<A>, caller: Pubkey, amount: u64, clock: Clock) -> Result<u64> {
    farm.state
        .vault
        .withdraw(caller, amount, clock.unix_timestamp, &mut farm.events)?;
    if amount == 0 {
        return Ok(0);
    }
    let received = farm
        .assets
        .transfer(&farm.reward_asset, &farm.vault_custody, &caller, amount)?;
    Ok(received)
}

// ─── Referral commission ──────────────────────────────────────────────────────

/// Pay out everything the caller has accrued as a referrer and not yet claimed.
pub fn claim_commission<A: FungibleAssetPort>(farm: &mut Farm<A>, caller: Pubkey) -> Result<u64> {
    let amount = farm.state.referral.take_claimable(&farm.authority, &caller)?;
    if amount == 0 {
        return Ok(0);
    }
    farm.assets
        .transfer(&farm.reward_asset, &farm.authority, &caller, amount)?;

    info!(referrer = %caller, amount, "referral commission claimed");
    farm.events.emit(FarmEvent::CommissionClaimed { referrer: caller, amount });
    Ok(amount)
}

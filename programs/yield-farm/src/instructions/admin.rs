//! Role rotation and economic parameters.

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::FungibleAssetPort,
    constants::MAX_REFERRAL_COMMISSION_BPS,
    error::{FarmError, Result},
    events::FarmEvent,
    ledger::Farm,
    roles::Role,
    state::Clock,
};

// ─── Role rotation ────────────────────────────────────────────────────────────

/// Hand `role` to `new_holder`. Only the current holder may do so.
pub fn rotate_role<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    role: Role,
    caller: Pubkey,
    new_holder: Pubkey,
    op: &'static str,
) -> Result<()> {
    let previous = farm.state.roles.rotate(role, &caller, new_holder, op)?;
    if role == Role::Operator {
        farm.state.referral.transfer_ownership(&previous, new_holder)?;
    }
    info!(role = role.as_str(), %previous, new = %new_holder, "role transferred");
    farm.events.emit(FarmEvent::RoleTransferred { role, previous, new: new_holder });
    Ok(())
}

/// Grant or revoke write access to the referral registry. Operator only.
pub fn update_referral_operator<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    operator: Pubkey,
    enabled: bool,
) -> Result<()> {
    farm.state.roles.require(Role::Operator, &caller, "update_referral_operator")?;
    if !enabled && operator == farm.authority {
        return Err(FarmError::InvalidArgument(
            "the farm authority must stay a referral operator".into(),
        ));
    }
    farm.state
        .referral
        .update_operator(&caller, operator, enabled, &mut farm.events)?;
    info!(%operator, enabled, "referral operator updated");
    Ok(())
}

// ─── Parameters ───────────────────────────────────────────────────────────────

/// Change the per-block emission. Every pool is accrued at the old rate first.
pub fn update_emission_rate<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    emission_per_block: u64,
    clock: Clock,
) -> Result<()> {
    farm.state.roles.require(Role::Operator, &caller, "update_emission_rate")?;
    farm.accrue_all(clock.block)?;

    let previous = std::mem::replace(&mut farm.state.config.emission_per_block, emission_per_block);
    info!(previous, new = emission_per_block, block = clock.block, "emission rate updated");
    farm.events.emit(FarmEvent::EmissionRateUpdated { previous, new: emission_per_block });
    Ok(())
}

pub fn set_referral_commission_rate<A: FungibleAssetPort>(
    farm: &mut Farm<A>,
    caller: Pubkey,
    rate_bps: u16,
) -> Result<()> {
    farm.state.roles.require(Role::Operator, &caller, "set_referral_commission_rate")?;
    if rate_bps > MAX_REFERRAL_COMMISSION_BPS {
        return Err(FarmError::InvalidCommissionRate { rate: rate_bps, max: MAX_REFERRAL_COMMISSION_BPS });
    }

    let previous = std::mem::replace(&mut farm.state.config.referral_commission_bps, rate_bps);
    info!(previous, new = rate_bps, "referral commission rate updated");
    farm.events.emit(FarmEvent::ReferralRateUpdated { previous, new: rate_bps });
    Ok(())
}

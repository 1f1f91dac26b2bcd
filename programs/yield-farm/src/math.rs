//! Reward, fee and commission arithmetic.
//!
//! Pure functions over integers. Intermediate products are u128 and every
//! multiplication is checked; products that can outgrow u128 before their
//! division go through [`mul_div_floor`].

use crate::{
    constants::*,
    error::{FarmError, Result},
};

// ─── Emission ────────────────────────────────────────────────────────────────

/// Number of reward-weighted blocks in `(from, to]`.
///
/// Blocks before `bonus_end_block` count `bonus_multiplier` times; a range that
/// straddles the cutoff is split and the two parts summed.
pub fn block_range_multiplier(
    from: u64,
    to: u64,
    bonus_end_block: u64,
    bonus_multiplier: u64,
) -> Result<u64> {
    if to <= from {
        return Ok(0);
    }
    if to <= bonus_end_block {
        (to - from).checked_mul(bonus_multiplier).ok_or(FarmError::MathOverflow)
    } else if from >= bonus_end_block {
        Ok(to - from)
    } else {
        (bonus_end_block - from)
            .checked_mul(bonus_multiplier)
            .and_then(|bonus| bonus.checked_add(to - bonus_end_block))
            .ok_or(FarmError::MathOverflow)
    }
}

/// Pool share of `multiplier` blocks of global emission.
pub fn pool_reward(
    multiplier: u64,
    emission_per_block: u64,
    alloc_point: u64,
    total_alloc_point: u64,
) -> Result<u64> {
    if total_alloc_point == 0 {
        return Ok(0);
    }
    let reward = (multiplier as u128)
        .checked_mul(emission_per_block as u128)
        .ok_or(FarmError::MathOverflow)?
        .checked_mul(alloc_point as u128)
        .ok_or(FarmError::MathOverflow)?
        / total_alloc_point as u128;
    u64::try_from(reward).map_err(|_| FarmError::MathOverflow)
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

/// `floor(a * b / denom)` without forming the full product.
///
/// Splits `b = q * denom + r`, so the result is `a * q + a * r / denom`. Since
/// `a` and `r` are below 2^64, `a * r` always fits u128 and only `a * q` can
/// overflow, which happens exactly when the quotient itself exceeds u128.
pub fn mul_div_floor(a: u64, b: u128, denom: u64) -> Result<u128> {
    if denom == 0 {
        return Err(FarmError::MathOverflow);
    }
    let denom = denom as u128;
    let (q, r) = (b / denom, b % denom);
    let whole = (a as u128).checked_mul(q).ok_or(FarmError::MathOverflow)?;
    whole
        .checked_add(a as u128 * r / denom)
        .ok_or(FarmError::MathOverflow)
}

/// Increase of `acc_reward_per_share` when `reward` is spread over `total_staked`.
pub fn acc_per_share_delta(reward: u64, total_staked: u64) -> Result<u128> {
    if total_staked == 0 {
        return Ok(0);
    }
    mul_div_floor(reward, ACC_REWARD_PRECISION, total_staked)
}

/// `amount * acc / PRECISION`, the reward a stake has earned since pool inception.
///
/// A pool whose only staker held dust for a long stretch carries an `acc` far
/// above the reward it emitted, so the raw product `amount * acc` of a later
/// large stake does not fit u128 even though the quotient does.
pub fn accumulated_reward(amount: u64, acc: u128) -> Result<u128> {
    mul_div_floor(amount, acc, ACC_REWARD_PRECISION as u64)
}

// ─── Deposit fee ─────────────────────────────────────────────────────────────

/// Breakdown of a received deposit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositSplit {
    /// Total fee skimmed (treasury + dev)
    pub fee:      u64,
    pub treasury: u64,
    pub dev:      u64,
    /// Credited to the user's stake: received − fee
    pub net:      u64,
}

/// Skim `fee_bps` off `received` and divide the fee between the two sinks.
///
/// Rounds the fee down; the dev sink takes whatever the treasury share leaves,
/// so `net + treasury + dev == received` exactly.
pub fn split_deposit(received: u64, fee_bps: u16, treasury_share_bps: u16) -> Result<DepositSplit> {
    let fee = (received as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(FarmError::MathOverflow)?
        / BPS_DENOMINATOR;
    let treasury = fee
        .checked_mul(treasury_share_bps as u128)
        .ok_or(FarmError::MathOverflow)?
        / BPS_DENOMINATOR;
    let fee = fee as u64; // fee <= received
    let treasury = treasury as u64;
    Ok(DepositSplit {
        fee,
        treasury,
        dev: fee - treasury,
        net: received - fee,
    })
}

// ─── Referral commission ─────────────────────────────────────────────────────

/// Commission minted for the referrer of a harvest of `pending`.
pub fn referral_commission(pending: u64, commission_bps: u16) -> Result<u64> {
    let commission = (pending as u128)
        .checked_mul(commission_bps as u128)
        .ok_or(FarmError::MathOverflow)?
        / BPS_DENOMINATOR;
    Ok(commission as u64)
}

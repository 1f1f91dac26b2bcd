/// Fixed-point scale of `Pool::acc_reward_per_share`.
///
/// 1e12 keeps one reward unit per block measurable against ~1e12 staked
/// units. The accumulator itself can grow large (a single dust unit staked
/// through heavy emission pushes it past 1e24), so `amount * acc` is not
/// assumed to fit u128; see [`crate::math::mul_div_floor`].
pub const ACC_REWARD_PRECISION: u128 = 1_000_000_000_000;

/// Denominator for basis-point math (u128 to avoid up-cast noise)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Deposit fee cap: 100 %
pub const MAX_DEPOSIT_FEE_BPS: u16 = 10_000;

/// Referral commission cap: 10 % of harvested reward
pub const MAX_REFERRAL_COMMISSION_BPS: u16 = 1_000;

/// Default referral commission: 1 %
pub const DEFAULT_REFERRAL_COMMISSION_BPS: u16 = 100;

/// Default treasury share of each deposit fee; dev sink receives the rest
pub const DEFAULT_TREASURY_FEE_SHARE_BPS: u16 = 5_000;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Default vesting: 150 days, continuous release
pub const DEFAULT_VESTING_DURATION_SECS: i64 = 150 * SECONDS_PER_DAY;

/// Release interval of the stepped schedule (20 % per 30 days over 150 days)
pub const MONTHLY_RELEASE_INTERVAL_SECS: i64 = 30 * SECONDS_PER_DAY;

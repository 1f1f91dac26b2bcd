//! Scenario files: a farm configuration, seeded balances and a list of
//! timed operations replayed against an in-memory farm.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::{hash::hash, pubkey::Pubkey};
use yield_farm::{
    constants::SECONDS_PER_DAY, AssetRules, Clock, Farm, FarmAccounts, FarmConfig, FarmError, FarmEvent,
    FungibleAssetPort, InMemoryAssets, VestingSchedule,
};

pub const DEFAULT_GENESIS_TIME: i64 = 1_700_000_000;

/// Aliases wired into every simulated farm.
pub const ROLE_ALIASES: [&str; 6] = ["authority", "vault", "reward", "operator", "dev", "treasury"];

// ─── Account aliases ──────────────────────────────────────────────────────────

/// Deterministic key for a human-readable alias: SHA-256 of `yield-farm:<alias>`.
pub fn alias_key(alias: &str) -> Pubkey {
    Pubkey::new_from_array(hash(format!("yield-farm:{alias}").as_bytes()).to_bytes())
}

/// Two-way map between aliases and keys for everything a scenario mentions.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    names: HashMap<Pubkey, String>,
}

impl Directory {
    /// Resolve an alias or a raw base-58 key. `none` is the all-zero key.
    pub fn resolve(&mut self, name: &str) -> Result<Pubkey> {
        let name = name.trim();
        if name.is_empty() {
            bail!("empty account name");
        }
        if name == "none" {
            return Ok(Pubkey::default());
        }
        let key = if name.len() >= 32 {
            Pubkey::from_str(name).map_err(|_| anyhow!("'{name}' is neither a short alias nor a base-58 key"))?
        } else {
            alias_key(name)
        };
        self.names.entry(key).or_insert_with(|| name.to_string());
        Ok(key)
    }

    /// Alias for a known key, or a shortened base-58 form.
    pub fn name(&self, key: &Pubkey) -> String {
        if *key == Pubkey::default() {
            return "none".into();
        }
        match self.names.get(key) {
            Some(name) => name.clone(),
            None => {
                let addr = key.to_string();
                format!("{}…{}", &addr[..4], &addr[addr.len() - 4..])
            }
        }
    }

    /// Every key seen so far, sorted by alias.
    pub fn known(&self) -> Vec<(Pubkey, String)> {
        let mut all: Vec<_> = self.names.iter().map(|(k, n)| (*k, n.clone())).collect();
        all.sort_by(|a, b| a.1.cmp(&b.1));
        all
    }
}

// ─── File format ──────────────────────────────────────────────────────────────

fn default_genesis() -> i64 {
    DEFAULT_GENESIS_TIME
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    /// Unix time of `time = 0`
    #[serde(default = "default_genesis")]
    pub genesis_time: i64,
    #[serde(default)]
    pub config: FarmConfig,
    /// Transfer rules per asset alias; plain assets need no entry
    #[serde(default)]
    pub assets: BTreeMap<String, AssetSpec>,
    #[serde(default)]
    pub balances: Vec<Balance>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSpec {
    pub transfer_tax_bps: u16,
    /// Receives the tax; burned when absent
    pub tax_collector:    Option<String>,
    pub max_supply:       Option<u64>,
    pub exempt:           Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub asset:  String,
    pub owner:  String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub block: u64,
    /// Seconds after genesis
    #[serde(default)]
    pub time: i64,
    /// Whole days after genesis; overrides `time`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(flatten)]
    pub action: Action,
    /// Error code the step must fail with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

impl Step {
    pub fn offset_secs(&self) -> Result<i64> {
        match self.days {
            None => Ok(self.time),
            Some(days) => days
                .checked_mul(SECONDS_PER_DAY)
                .ok_or_else(|| anyhow!("days {days} is out of range")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    AddPool {
        caller:          String,
        asset:           String,
        alloc_point:     u64,
        #[serde(default)]
        deposit_fee_bps: u16,
        #[serde(default = "yes")]
        with_update:     bool,
    },
    SetPool {
        caller:          String,
        pid:             usize,
        alloc_point:     u64,
        #[serde(default)]
        deposit_fee_bps: u16,
        #[serde(default = "yes")]
        with_update:     bool,
    },
    Deposit {
        caller:   String,
        pid:      usize,
        amount:   u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        referrer: Option<String>,
    },
    Withdraw { caller: String, pid: usize, amount: u64 },
    Harvest { caller: String, pid: usize },
    EmergencyWithdraw { caller: String, pid: usize },
    WithdrawVested { caller: String, amount: u64 },
    ClaimCommission { caller: String },
    UpdatePool { pid: usize },
    MassUpdatePools,
    SetDevAddress { caller: String, new: String },
    SetTreasuryAddress { caller: String, new: String },
    TransferOperator { caller: String, new: String },
    UpdateReferralOperator { caller: String, operator: String, enabled: bool },
    UpdateEmissionRate { caller: String, emission_per_block: u64 },
    SetReferralCommissionRate { caller: String, rate_bps: u16 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPool { .. } => "add_pool",
            Action::SetPool { .. } => "set_pool",
            Action::Deposit { .. } => "deposit",
            Action::Withdraw { .. } => "withdraw",
            Action::Harvest { .. } => "harvest",
            Action::EmergencyWithdraw { .. } => "emergency_withdraw",
            Action::WithdrawVested { .. } => "withdraw_vested",
            Action::ClaimCommission { .. } => "claim_commission",
            Action::UpdatePool { .. } => "update_pool",
            Action::MassUpdatePools => "mass_update_pools",
            Action::SetDevAddress { .. } => "set_dev_address",
            Action::SetTreasuryAddress { .. } => "set_treasury_address",
            Action::TransferOperator { .. } => "transfer_operator",
            Action::UpdateReferralOperator { .. } => "update_referral_operator",
            Action::UpdateEmissionRate { .. } => "update_emission_rate",
            Action::SetReferralCommissionRate { .. } => "set_referral_commission_rate",
        }
    }
}

pub fn parse(text: &str) -> Result<Scenario> {
    serde_json::from_str(text).context("malformed scenario JSON")
}

// ─── Simulation ───────────────────────────────────────────────────────────────

/// Result of replaying one step.
#[derive(Debug)]
pub struct Outcome {
    pub index:    usize,
    pub op:       &'static str,
    pub clock:    Clock,
    pub result:   std::result::Result<Value, FarmError>,
    pub expected: Option<String>,
    pub events:   Vec<FarmEvent>,
}

impl Outcome {
    /// Succeeded when no error was expected, or failed with the expected code.
    pub fn matched(&self) -> bool {
        match (&self.result, &self.expected) {
            (Ok(_), None) => true,
            (Err(e), Some(code)) => e.code() == code,
            _ => false,
        }
    }
}

pub struct Simulation {
    pub farm:     Farm<InMemoryAssets>,
    pub dir:      Directory,
    pub clock:    Clock,
    genesis_time: i64,
}

impl Simulation {
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let mut dir = Directory::default();
        let [authority, vault_custody, reward_asset, operator, dev, treasury] =
            ROLE_ALIASES.map(alias_key);
        for alias in ROLE_ALIASES {
            dir.resolve(alias)?;
        }
        let accounts = FarmAccounts { authority, vault_custody, reward_asset, operator, dev, treasury };

        let mut assets = InMemoryAssets::new();
        for (name, def) in &scenario.assets {
            let asset = dir.resolve(name)?;
            let rules = AssetRules {
                transfer_tax_bps: def.transfer_tax_bps,
                tax_collector:    def.tax_collector.as_deref().map(|c| dir.resolve(c)).transpose()?,
                max_supply:       def.max_supply,
                exempt:           def.exempt.iter().map(|e| dir.resolve(e)).collect::<Result<_>>()?,
            };
            assets
                .set_rules(asset, rules)
                .with_context(|| format!("asset '{name}'"))?;
        }
        for b in &scenario.balances {
            let (asset, owner) = (dir.resolve(&b.asset)?, dir.resolve(&b.owner)?);
            assets
                .credit(asset, owner, b.amount)
                .with_context(|| format!("seeding {} {} for {}", b.amount, b.asset, b.owner))?;
        }

        let farm = Farm::new(assets, accounts, scenario.config.clone()).context("invalid farm configuration")?;
        Ok(Self {
            farm,
            dir,
            clock: Clock::new(0, scenario.genesis_time),
            genesis_time: scenario.genesis_time,
        })
    }

    /// Unix time the scenario counts `time` and `days` from.
    pub fn clock_origin(&self) -> i64 {
        self.genesis_time
    }

    /// Replay every step of `scenario` from a fresh farm.
    pub fn replay(scenario: &Scenario) -> Result<(Self, Vec<Outcome>)> {
        let mut sim = Self::new(scenario)?;
        let outcomes = scenario
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| sim.step(i, step))
            .collect::<Result<Vec<_>>>()?;
        Ok((sim, outcomes))
    }

    pub fn step(&mut self, index: usize, step: &Step) -> Result<Outcome> {
        let now = step
            .offset_secs()
            .ok()
            .and_then(|offset| self.genesis_time.checked_add(offset))
            .ok_or_else(|| anyhow!("step {index}: time is out of range"))?;
        let clock = Clock::new(step.block, now);
        if clock.block < self.clock.block || clock.unix_timestamp < self.clock.unix_timestamp {
            bail!(
                "step {index}: clock moves backwards (block {} → {}, time {} → {})",
                self.clock.block,
                clock.block,
                self.clock.unix_timestamp,
                clock.unix_timestamp
            );
        }
        self.clock = clock;

        self.farm.drain_events();
        let result = self
            .execute(&step.action, clock)
            .with_context(|| format!("step {index} ({})", step.action.name()))?;
        Ok(Outcome {
            index,
            op: step.action.name(),
            clock,
            result,
            expected: step.expect_error.clone(),
            events: self.farm.drain_events(),
        })
    }

    /// Outer error: the step itself is malformed. Inner error: the farm refused it.
    fn execute(&mut self, action: &Action, clock: Clock) -> Result<std::result::Result<Value, FarmError>> {
        let farm = &mut self.farm;
        let dir = &mut self.dir;
        Ok(match action {
            Action::AddPool { caller, asset, alloc_point, deposit_fee_bps, with_update } => {
                let (caller, asset) = (dir.resolve(caller)?, dir.resolve(asset)?);
                farm.add_pool(caller, asset, *alloc_point, *deposit_fee_bps, *with_update, clock)
                    .map(|pid| json!({ "pid": pid }))
            }
            Action::SetPool { caller, pid, alloc_point, deposit_fee_bps, with_update } => {
                let caller = dir.resolve(caller)?;
                farm.set_pool(caller, *pid, *alloc_point, *deposit_fee_bps, *with_update, clock)
                    .map(|_| Value::Null)
            }
            Action::Deposit { caller, pid, amount, referrer } => {
                let caller = dir.resolve(caller)?;
                let referrer = match referrer {
                    Some(r) => dir.resolve(r)?,
                    None => Pubkey::default(),
                };
                farm.deposit(caller, *pid, *amount, referrer, clock)
                    .map(|credited| json!({ "credited": credited }))
            }
            Action::Withdraw { caller, pid, amount } => {
                let caller = dir.resolve(caller)?;
                farm.withdraw(caller, *pid, *amount, clock).map(|_| Value::Null)
            }
            Action::Harvest { caller, pid } => {
                let caller = dir.resolve(caller)?;
                farm.harvest(caller, *pid, clock).map(|paid| json!({ "harvested": paid }))
            }
            Action::EmergencyWithdraw { caller, pid } => {
                let caller = dir.resolve(caller)?;
                farm.emergency_withdraw(caller, *pid, clock)
                    .map(|amount| json!({ "returned": amount }))
            }
            Action::WithdrawVested { caller, amount } => {
                let caller = dir.resolve(caller)?;
                farm.withdraw_vested(caller, *amount, clock)
                    .map(|received| json!({ "received": received }))
            }
            Action::ClaimCommission { caller } => {
                let caller = dir.resolve(caller)?;
                farm.claim_commission(caller).map(|amount| json!({ "claimed": amount }))
            }
            Action::UpdatePool { pid } => farm.update_pool(*pid, clock).map(|_| Value::Null),
            Action::MassUpdatePools => farm.mass_update_pools(clock).map(|_| Value::Null),
            Action::SetDevAddress { caller, new } => {
                let (caller, new) = (dir.resolve(caller)?, dir.resolve(new)?);
                farm.set_dev_address(caller, new).map(|_| Value::Null)
            }
            Action::SetTreasuryAddress { caller, new } => {
                let (caller, new) = (dir.resolve(caller)?, dir.resolve(new)?);
                farm.set_treasury_address(caller, new).map(|_| Value::Null)
            }
            Action::TransferOperator { caller, new } => {
                let (caller, new) = (dir.resolve(caller)?, dir.resolve(new)?);
                farm.transfer_operator(caller, new).map(|_| Value::Null)
            }
            Action::UpdateReferralOperator { caller, operator, enabled } => {
                let (caller, operator) = (dir.resolve(caller)?, dir.resolve(operator)?);
                farm.update_referral_operator(caller, operator, *enabled).map(|_| Value::Null)
            }
            Action::UpdateEmissionRate { caller, emission_per_block } => {
                let caller = dir.resolve(caller)?;
                farm.update_emission_rate(caller, *emission_per_block, clock).map(|_| Value::Null)
            }
            Action::SetReferralCommissionRate { caller, rate_bps } => {
                let caller = dir.resolve(caller)?;
                farm.set_referral_commission_rate(caller, *rate_bps).map(|_| Value::Null)
            }
        })
    }

    // ─── Rendering ────────────────────────────────────────────────────────────

    pub fn event_json(&self, event: &FarmEvent) -> Value {
        let n = |k: &Pubkey| self.dir.name(k);
        match event {
            FarmEvent::PoolAdded { pid, stake_asset, alloc_point, deposit_fee_bps } => json!({
                "event": "pool_added", "pid": pid, "stake_asset": n(stake_asset),
                "alloc_point": alloc_point, "deposit_fee_bps": deposit_fee_bps,
            }),
            FarmEvent::PoolUpdated { pid, alloc_point, deposit_fee_bps } => json!({
                "event": "pool_updated", "pid": pid, "alloc_point": alloc_point, "deposit_fee_bps": deposit_fee_bps,
            }),
            FarmEvent::Deposit { user, pid, amount, fee } => json!({
                "event": "deposit", "user": n(user), "pid": pid, "amount": amount, "fee": fee,
            }),
            FarmEvent::Withdraw { user, pid, amount } => json!({
                "event": "withdraw", "user": n(user), "pid": pid, "amount": amount,
            }),
            FarmEvent::Harvest { user, pid, amount } => json!({
                "event": "harvest", "user": n(user), "pid": pid, "amount": amount,
            }),
            FarmEvent::EmergencyWithdraw { user, pid, amount } => json!({
                "event": "emergency_withdraw", "user": n(user), "pid": pid, "amount": amount,
            }),
            FarmEvent::ReferralRecorded { user, referrer } => json!({
                "event": "referral_recorded", "user": n(user), "referrer": n(referrer),
            }),
            FarmEvent::CommissionRecorded { referrer, amount } => json!({
                "event": "commission_recorded", "referrer": n(referrer), "amount": amount,
            }),
            FarmEvent::CommissionClaimed { referrer, amount } => json!({
                "event": "commission_claimed", "referrer": n(referrer), "amount": amount,
            }),
            FarmEvent::VestingDeposit { beneficiary, amount } => json!({
                "event": "vesting_deposit", "beneficiary": n(beneficiary), "amount": amount,
            }),
            FarmEvent::VestingWithdrawal { beneficiary, amount } => json!({
                "event": "vesting_withdrawal", "beneficiary": n(beneficiary), "amount": amount,
            }),
            FarmEvent::RoleTransferred { role, previous, new } => json!({
                "event": "role_transferred", "role": role.as_str(), "previous": n(previous), "new": n(new),
            }),
            FarmEvent::ReferralOperatorUpdated { operator, enabled } => json!({
                "event": "referral_operator_updated", "operator": n(operator), "enabled": enabled,
            }),
            FarmEvent::EmissionRateUpdated { previous, new } => json!({
                "event": "emission_rate_updated", "previous": previous, "new": new,
            }),
            FarmEvent::ReferralRateUpdated { previous, new } => json!({
                "event": "referral_rate_updated", "previous": previous, "new": new,
            }),
        }
    }

    pub fn outcome_json(&self, outcome: &Outcome) -> Value {
        let (status, detail) = match &outcome.result {
            Ok(value) => ("ok", value.clone()),
            Err(e) => ("error", json!({ "code": e.code(), "message": e.to_string() })),
        };
        json!({
            "step":           outcome.index,
            "op":             outcome.op,
            "block":          outcome.clock.block,
            "unix_timestamp": outcome.clock.unix_timestamp,
            "status":         status,
            "result":         detail,
            "expect_error":   outcome.expected,
            "matched":        outcome.matched(),
            "events":         outcome.events.iter().map(|e| self.event_json(e)).collect::<Vec<_>>(),
        })
    }

    /// Ledger state at the simulation's current clock.
    pub fn report(&self) -> Result<Report> {
        let farm = &self.farm;
        let (block, now) = (self.clock.block, self.clock.unix_timestamp);
        let known = self.dir.known();

        let pools = farm
            .pools()
            .map(|(pid, p)| PoolRow {
                pid,
                stake_asset: self.dir.name(&p.stake_asset),
                alloc_point: p.alloc_point,
                deposit_fee_bps: p.deposit_fee_bps,
                acc_reward_per_share: p.acc_reward_per_share,
                last_reward_block: p.last_reward_block,
                total_staked: p.total_staked,
            })
            .collect();

        let mut stakes = Vec::new();
        for (pid, user, stake) in farm.stakes() {
            if stake.amount == 0 {
                continue;
            }
            stakes.push(StakeRow {
                pid,
                user: self.dir.name(user),
                amount: stake.amount,
                pending: farm.pending_reward(pid, user, block)?,
            });
        }

        let vesting = known
            .iter()
            .filter_map(|(key, name)| {
                let account = farm.vesting_account(key);
                (account.total_locked > 0).then(|| VestingRow {
                    beneficiary: name.clone(),
                    total_locked: account.total_locked,
                    total_withdrawn: account.total_withdrawn,
                    unlocked: farm.unlocked_amount(key, now),
                    last_deposit_time: account.last_deposit_time,
                })
            })
            .collect();

        let referrals = known
            .iter()
            .filter_map(|(key, name)| {
                let (count, total) = (farm.referrals_count(key), farm.total_commission(key));
                (count > 0 || total > 0).then(|| ReferralRow {
                    referrer: name.clone(),
                    referrals: count,
                    total_commission: total,
                    claimable: farm.claimable_commission(key),
                })
            })
            .collect();

        let reward = farm.reward_asset();
        let reward_balances = known
            .iter()
            .filter_map(|(key, name)| {
                let balance = farm.assets().balance_of(&reward, key);
                (balance > 0).then(|| (name.clone(), balance))
            })
            .collect();

        let roles = farm.roles();
        Ok(Report {
            block,
            unix_timestamp: now,
            emission_per_block: farm.config().emission_per_block,
            referral_commission_bps: farm.config().referral_commission_bps,
            total_alloc_point: farm.total_alloc_point(),
            operator: self.dir.name(&roles.operator),
            dev: self.dir.name(&roles.dev),
            treasury: self.dir.name(&roles.treasury),
            reward_supply: farm.assets().total_supply(&reward),
            reward_balances,
            pools,
            stakes,
            vesting,
            referrals,
        })
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Report {
    pub block:                   u64,
    pub unix_timestamp:          i64,
    pub emission_per_block:      u64,
    pub referral_commission_bps: u16,
    pub total_alloc_point:       u64,
    pub operator:                String,
    pub dev:                     String,
    pub treasury:                String,
    pub reward_supply:           u64,
    pub reward_balances:         BTreeMap<String, u64>,
    pub pools:                   Vec<PoolRow>,
    pub stakes:                  Vec<StakeRow>,
    pub vesting:                 Vec<VestingRow>,
    pub referrals:               Vec<ReferralRow>,
}

#[derive(Debug, Serialize)]
pub struct PoolRow {
    pub pid:                  usize,
    pub stake_asset:          String,
    pub alloc_point:          u64,
    pub deposit_fee_bps:      u16,
    pub acc_reward_per_share: u128,
    pub last_reward_block:    u64,
    pub total_staked:         u64,
}

#[derive(Debug, Serialize)]
pub struct StakeRow {
    pub pid:     usize,
    pub user:    String,
    pub amount:  u64,
    pub pending: u64,
}

#[derive(Debug, Serialize)]
pub struct VestingRow {
    pub beneficiary:       String,
    pub total_locked:      u64,
    pub total_withdrawn:   u64,
    pub unlocked:          u64,
    pub last_deposit_time: i64,
}

#[derive(Debug, Serialize)]
pub struct ReferralRow {
    pub referrer:         String,
    pub referrals:        u64,
    pub total_commission: u64,
    pub claimable:        u64,
}

// ─── Sample ───────────────────────────────────────────────────────────────────

/// Scenario written by `yield-farm init`.
pub fn sample() -> Scenario {
    let step = |block: u64, days: Option<i64>, action: Action| Step {
        block,
        time: 0,
        days,
        action,
        expect_error: None,
    };
    let s = |v: &str| v.to_string();

    let mut steps = vec![
        step(0, None, Action::AddPool {
            caller: s("operator"),
            asset: s("lp-usdc"),
            alloc_point: 1_000,
            deposit_fee_bps: 400,
            with_update: true,
        }),
        step(0, None, Action::Deposit {
            caller: s("alice"),
            pid: 0,
            amount: 100_000,
            referrer: Some(s("bob")),
        }),
        step(10, None, Action::Harvest { caller: s("alice"), pid: 0 }),
        step(10, None, Action::ClaimCommission { caller: s("bob") }),
        step(10, Some(60), Action::WithdrawVested { caller: s("alice"), amount: 3_000 }),
    ];
    steps.push(Step {
        expect_error: Some(s("InsufficientUnlocked")),
        ..step(10, Some(60), Action::WithdrawVested { caller: s("alice"), amount: 1_000 })
    });
    steps.push(step(20, Some(60), Action::Withdraw { caller: s("alice"), pid: 0, amount: 96_000 }));

    Scenario {
        name: s("fee, referral and monthly vesting"),
        genesis_time: DEFAULT_GENESIS_TIME,
        config: FarmConfig {
            emission_per_block: 1_000,
            vesting: VestingSchedule::monthly(),
            ..FarmConfig::default()
        },
        assets: BTreeMap::new(),
        balances: vec![Balance { asset: s("lp-usdc"), owner: s("alice"), amount: 100_000 }],
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_deterministic() {
        let mut dir = Directory::default();
        let alice = dir.resolve("alice").unwrap();
        assert_eq!(alice, alias_key("alice"));
        assert_eq!(dir.resolve(" alice ").unwrap(), alice);
        assert_ne!(alice, alias_key("bob"));
        assert_eq!(dir.name(&alice), "alice");
    }

    #[test]
    fn base58_keys_pass_through() {
        let mut dir = Directory::default();
        let key = Pubkey::new_unique();
        assert_eq!(dir.resolve(&key.to_string()).unwrap(), key);
        assert_eq!(dir.resolve("none").unwrap(), Pubkey::default());
        assert!(dir.resolve("").is_err());
        assert!(dir.resolve("0000000000000000000000000000000000000000").is_err());
    }

    #[test]
    fn step_fields_parse() {
        let scenario = parse(
            r#"{
                "config": { "emission_per_block": 5 },
                "steps": [
                    { "block": 3, "days": 2, "op": "deposit", "caller": "alice", "pid": 0, "amount": 10 },
                    { "block": 4, "op": "mass_update_pools" },
                    { "block": 4, "op": "add_pool", "caller": "alice", "asset": "lp", "alloc_point": 1,
                      "expect_error": "Unauthorized" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.config.emission_per_block, 5);
        assert_eq!(scenario.genesis_time, DEFAULT_GENESIS_TIME);
        assert_eq!(scenario.steps[0].offset_secs().unwrap(), 2 * SECONDS_PER_DAY);
        assert_eq!(scenario.steps[1].action.name(), "mass_update_pools");
        match &scenario.steps[2].action {
            Action::AddPool { deposit_fee_bps, with_update, .. } => {
                assert_eq!(*deposit_fee_bps, 0);
                assert!(*with_update);
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(scenario.steps[2].expect_error.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn sample_replays_cleanly() {
        let (sim, outcomes) = Simulation::replay(&sample()).unwrap();
        assert!(outcomes.iter().all(Outcome::matched), "{outcomes:#?}");

        let report = sim.report().unwrap();
        assert_eq!(report.pools[0].total_staked, 0);
        assert_eq!(report.reward_balances.get("alice"), Some(&3_000));
        // 1% of the 9,999 harvested at block 10, claimed right away
        assert_eq!(report.reward_balances.get("bob"), Some(&99));
        let alice = report.vesting.iter().find(|v| v.beneficiary == "alice").unwrap();
        assert_eq!(alice.total_withdrawn, 3_000);
        let bob = report.referrals.iter().find(|r| r.referrer == "bob").unwrap();
        assert_eq!(bob.referrals, 1);
        assert_eq!(bob.total_commission - bob.claimable, 99);
    }

    #[test]
    fn checked_in_scenario_replays_cleanly() {
        let scenario = parse(include_str!("../scenarios/basic.json")).unwrap();
        let (_, outcomes) = Simulation::replay(&scenario).unwrap();
        assert!(outcomes.iter().all(Outcome::matched), "{outcomes:#?}");
    }

    #[test]
    fn unexpected_outcomes_are_flagged() {
        let mut scenario = sample();
        scenario.steps.truncate(1);
        scenario.steps[0].expect_error = Some("Unauthorized".into());
        let (_, outcomes) = Simulation::replay(&scenario).unwrap();
        assert!(!outcomes[0].matched());

        if let Action::AddPool { caller, .. } = &mut scenario.steps[0].action {
            *caller = "mallory".into();
        }
        let (_, outcomes) = Simulation::replay(&scenario).unwrap();
        assert!(outcomes[0].matched());
        assert_eq!(outcomes[0].result.as_ref().unwrap_err().code(), "Unauthorized");
    }

    #[test]
    fn backwards_clock_is_rejected() {
        let mut scenario = sample();
        scenario.steps[1].block = 0;
        scenario.steps[2].block = 5;
        scenario.steps[3].block = 4;
        let err = Simulation::replay(&scenario).err().unwrap();
        assert!(err.to_string().contains("backwards"), "{err}");
    }

    #[test]
    fn out_of_range_step_time_is_rejected() {
        let mut scenario = sample();
        scenario.steps[1].days = Some(i64::MAX);
        assert!(scenario.steps[1].offset_secs().is_err());
        let err = Simulation::replay(&scenario).err().unwrap();
        assert!(err.to_string().contains("out of range"), "{err}");

        let mut scenario = sample();
        scenario.steps[1].days = None;
        scenario.steps[1].time = i64::MAX;
        let err = Simulation::replay(&scenario).err().unwrap();
        assert!(err.to_string().contains("step 1: time is out of range"), "{err}");
    }

    #[test]
    fn role_aliases_are_wired() {
        let sim = Simulation::new(&sample()).unwrap();
        assert_eq!(sim.farm.roles().operator, alias_key("operator"));
        assert_eq!(sim.farm.authority(), alias_key("authority"));
        assert_eq!(sim.dir.name(&alias_key("treasury")), "treasury");
    }
}

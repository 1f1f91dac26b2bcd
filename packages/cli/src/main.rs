mod scenario;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yield_farm::{constants::SECONDS_PER_DAY, VestingSchedule};

use scenario::{Outcome, Report, Scenario, Simulation};

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  Yield Farm  v{ver}  ·  multi-pool reward ledger");
    println!("  {}", "─".repeat(62));
    println!("  Rewards   per-block emission, split by pool allocation points");
    println!("  Fees      0–100% deposit fee per pool, treasury / dev split");
    println!("  Referral  commission minted on every harvest (max 10%)");
    println!("  Vesting   harvested reward is locked, released over 150 days");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Yield farm ledger simulator.
///
/// Replays scenario files (JSON) against an in-memory farm and reports the
/// resulting pools, stakes, vesting accounts and referral commissions.
#[derive(Parser)]
#[command(
    name    = "yield-farm",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Replay yield-farm scenarios and inspect rewards, fees, referrals and vesting.",
    after_help = "\
ENVIRONMENT:
  YIELD_FARM_SCENARIO   Scenario file used when FILE is omitted
  RUST_LOG              Log filter for stderr output  [default: warn]

QUICK START:
  yield-farm init       farm.json
  yield-farm run        farm.json
  yield-farm report     farm.json --json
  yield-farm vesting    --amount 1000000 --monthly"
)]
struct Cli {
    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log every ledger operation to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario step by step, checking expected failures
    #[command(after_help = "\
EXAMPLES:
  yield-farm run scenarios/basic.json
  yield-farm run scenarios/basic.json --json | jq '.steps[] | select(.matched == false)'

Exits non-zero when any step fails unexpectedly or succeeds despite expect_error.")]
    Run {
        /// Scenario file
        #[arg(value_name = "FILE", env = "YIELD_FARM_SCENARIO")]
        file: PathBuf,
    },

    /// Replay a scenario silently and print the final ledger state
    #[command(after_help = "\
EXAMPLES:
  yield-farm report scenarios/basic.json
  yield-farm report scenarios/basic.json --json")]
    Report {
        /// Scenario file
        #[arg(value_name = "FILE", env = "YIELD_FARM_SCENARIO")]
        file: PathBuf,
    },

    /// Preview how a locked amount is released over time
    #[command(after_help = "\
EXAMPLES:
  yield-farm vesting --amount 1000000 --monthly
  yield-farm vesting --amount 5000 --duration-days 90 --interval-days 15 --step-days 5")]
    Vesting {
        /// Amount locked at day 0
        #[arg(long)]
        amount: u64,

        /// Days until the full amount is released
        #[arg(long, default_value_t = 150)]
        duration_days: i64,

        /// Release granularity in days; 0 releases continuously
        #[arg(long, default_value_t = 0)]
        interval_days: i64,

        /// Shorthand for --duration-days 150 --interval-days 30
        #[arg(long, default_value_t = false, conflicts_with_all = ["duration_days", "interval_days"])]
        monthly: bool,

        /// Spacing of the printed rows, in days
        #[arg(long, default_value_t = 10)]
        step_days: i64,
    },

    /// Write a sample scenario to get started
    Init {
        /// Destination file
        #[arg(value_name = "FILE", default_value = "scenario.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run { file } => cmd_run(file, cli.json)?,
        Commands::Report { file } => cmd_report(file, cli.json)?,
        Commands::Vesting { amount, duration_days, interval_days, monthly, step_days } => {
            let schedule = if *monthly {
                VestingSchedule::monthly()
            } else {
                schedule_from_days(*duration_days, *interval_days)?
            };
            cmd_vesting(*amount, schedule, *step_days, cli.json)?;
        }
        Commands::Init { output, force } => cmd_init(output, *force, cli.json)?,
    }
    Ok(())
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read scenario '{}'", path.display()))?;
    let scenario = scenario::parse(&text).with_context(|| format!("In '{}'", path.display()))?;
    debug!(path = %path.display(), steps = scenario.steps.len(), "scenario loaded");
    Ok(scenario)
}

// ─── run ──────────────────────────────────────────────────────────────────────

fn cmd_run(path: &Path, json_output: bool) -> Result<()> {
    let scenario = load_scenario(path)?;
    let mut sim = Simulation::new(&scenario)?;

    if !json_output {
        let title = if scenario.name.is_empty() { path.display().to_string() } else { scenario.name.clone() };
        println!("─── Run: {title} ──────────────────────────────────────────────");
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    let mut mismatches = 0usize;
    for (i, step) in scenario.steps.iter().enumerate() {
        let outcome = sim.step(i, step)?;
        if !outcome.matched() {
            mismatches += 1;
        }
        if json_output {
            steps.push(sim.outcome_json(&outcome));
        } else {
            print_outcome(&sim, &outcome);
        }
    }
    let report = sim.report()?;

    if json_output {
        println!("{}", json!({
            "status":     if mismatches == 0 { "ok" } else { "mismatch" },
            "command":    "run",
            "scenario":   scenario.name,
            "mismatches": mismatches,
            "steps":      steps,
            "report":     report,
        }));
    } else {
        println!();
        print_report(&report);
        println!();
        if mismatches == 0 {
            println!("  All {} steps behaved as expected.", scenario.steps.len());
        }
    }

    if mismatches > 0 {
        return Err(anyhow!("{mismatches} step(s) did not match expectations"));
    }
    Ok(())
}

fn print_outcome(sim: &Simulation, outcome: &Outcome) {
    let mark = if outcome.matched() { " " } else { "✗" };
    let detail = match &outcome.result {
        Ok(value) if value.is_null() => "ok".to_string(),
        Ok(value) => format!("ok  {value}"),
        Err(e) => format!("error {}  ({e})", e.code()),
    };
    println!(
        "{mark} #{:<3} block {:>8}  day {:>4}  {:<28} {detail}",
        outcome.index,
        outcome.clock.block,
        (outcome.clock.unix_timestamp - sim.clock_origin()) / SECONDS_PER_DAY,
        outcome.op,
    );
    if let (Some(code), false) = (&outcome.expected, outcome.matched()) {
        println!("        expected error {code}");
    }
    for event in &outcome.events {
        println!("        · {}", sim.event_json(event));
    }
}

// ─── report ───────────────────────────────────────────────────────────────────

fn cmd_report(path: &Path, json_output: bool) -> Result<()> {
    let scenario = load_scenario(path)?;
    let (sim, outcomes) = Simulation::replay(&scenario)?;
    let mismatches = outcomes.iter().filter(|o| !o.matched()).count();
    let report = sim.report()?;

    if json_output {
        println!("{}", json!({
            "status":     "ok",
            "command":    "report",
            "scenario":   scenario.name,
            "mismatches": mismatches,
            "report":     report,
        }));
    } else {
        print_report(&report);
        if mismatches > 0 {
            println!();
            println!("  Note: {mismatches} step(s) did not match expectations; run `yield-farm run` for details.");
        }
    }
    Ok(())
}

fn print_report(r: &Report) {
    println!("─── Farm at block {} ──────────────────────────────────────────────", r.block);
    println!("  Emission         {:>20} / block", r.emission_per_block);
    println!("  Total alloc      {:>20}", r.total_alloc_point);
    println!("  Referral rate    {} bps  ({:.2}%)", r.referral_commission_bps, r.referral_commission_bps as f64 / 100.0);
    println!("  Operator         {}", r.operator);
    println!("  Dev              {}", r.dev);
    println!("  Treasury         {}", r.treasury);
    println!("  Reward supply    {:>20}", r.reward_supply);

    println!();
    println!("─── Pools ───────────────────────────────────────────────────────────");
    if r.pools.is_empty() {
        println!("  (none)");
    }
    for p in &r.pools {
        println!(
            "  #{:<3} {:<14} alloc {:>8}  fee {:>5} bps  staked {:>14}  last block {}",
            p.pid, p.stake_asset, p.alloc_point, p.deposit_fee_bps, p.total_staked, p.last_reward_block
        );
    }

    if !r.stakes.is_empty() {
        println!();
        println!("─── Stakes ──────────────────────────────────────────────────────────");
        for s in &r.stakes {
            println!("  #{:<3} {:<20} {:>14}  pending {:>14}", s.pid, s.user, s.amount, s.pending);
        }
    }

    if !r.vesting.is_empty() {
        println!();
        println!("─── Vesting ─────────────────────────────────────────────────────────");
        for v in &r.vesting {
            println!(
                "  {:<20} locked {:>14}  withdrawn {:>14}  unlocked {:>14}",
                v.beneficiary, v.total_locked, v.total_withdrawn, v.unlocked
            );
        }
    }

    if !r.referrals.is_empty() {
        println!();
        println!("─── Referrals ───────────────────────────────────────────────────────");
        for f in &r.referrals {
            println!(
                "  {:<20} referred {:>4}  commission {:>14}  claimable {:>14}",
                f.referrer, f.referrals, f.total_commission, f.claimable
            );
        }
    }

    if !r.reward_balances.is_empty() {
        println!();
        println!("─── Reward balances ─────────────────────────────────────────────────");
        for (owner, balance) in &r.reward_balances {
            println!("  {owner:<20} {balance:>20}");
        }
    }
}

// ─── vesting ──────────────────────────────────────────────────────────────────

/// Day-based flags to a schedule; an interval of 0 releases continuously.
fn schedule_from_days(duration_days: i64, interval_days: i64) -> Result<VestingSchedule> {
    let duration_secs = duration_days
        .checked_mul(SECONDS_PER_DAY)
        .ok_or_else(|| anyhow!("--duration-days {duration_days} is out of range"))?;
    let release_interval_secs = interval_days
        .checked_mul(SECONDS_PER_DAY)
        .ok_or_else(|| anyhow!("--interval-days {interval_days} is out of range"))?;
    Ok(VestingSchedule { duration_secs, release_interval_secs: release_interval_secs.max(1) })
}

fn cmd_vesting(amount: u64, schedule: VestingSchedule, step_days: i64, json_output: bool) -> Result<()> {
    schedule.validate()?;
    if step_days <= 0 {
        bail!("--step-days must be positive");
    }

    let last_day = schedule.duration_secs / SECONDS_PER_DAY + i64::from(schedule.duration_secs % SECONDS_PER_DAY != 0);
    let mut days: Vec<i64> = (0..=last_day).step_by(step_days as usize).collect();
    if days.last() != Some(&last_day) {
        days.push(last_day);
    }
    let rows: Vec<(i64, u64)> = days
        .into_iter()
        .map(|day| (day, schedule.released(amount, day.saturating_mul(SECONDS_PER_DAY))))
        .collect();

    if json_output {
        println!("{}", json!({
            "status":                "ok",
            "command":               "vesting",
            "amount":                amount,
            "duration_secs":         schedule.duration_secs,
            "release_interval_secs": schedule.release_interval_secs,
            "schedule": rows.iter().map(|(day, released)| json!({ "day": day, "released": released })).collect::<Vec<_>>(),
        }));
    } else {
        println!("─── Vesting preview: {amount} ──────────────────────────────────────");
        println!("  Duration         {} days", schedule.duration_secs / SECONDS_PER_DAY);
        if schedule.release_interval_secs > 1 {
            println!("  Release step     {} days", schedule.release_interval_secs / SECONDS_PER_DAY);
        } else {
            println!("  Release step     continuous");
        }
        println!();
        println!("  {:>6}  {:>20}  {:>7}", "day", "released", "share");
        for (day, released) in rows {
            let pct = if amount == 0 { 0.0 } else { released as f64 * 100.0 / amount as f64 };
            println!("  {day:>6}  {released:>20}  {pct:>6.1}%");
        }
    }
    Ok(())
}

// ─── init ─────────────────────────────────────────────────────────────────────

fn cmd_init(output: &Path, force: bool, json_output: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("'{}' already exists (pass --force to overwrite)", output.display());
    }
    let sample = scenario::sample();
    let text = serde_json::to_string_pretty(&sample)?;
    fs::write(output, text + "\n").with_context(|| format!("Cannot write '{}'", output.display()))?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "init",
            "file":    output.display().to_string(),
            "steps":   sample.steps.len(),
        }));
    } else {
        println!("─── Scenario written ───────────────────────────────────────────────");
        println!("  File             {}", output.display());
        println!("  Steps            {}", sample.steps.len());
        println!();
        println!("  Next: yield-farm run {}", output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_flags_convert_to_seconds() {
        let schedule = schedule_from_days(90, 15).unwrap();
        assert_eq!(schedule.duration_secs, 90 * SECONDS_PER_DAY);
        assert_eq!(schedule.release_interval_secs, 15 * SECONDS_PER_DAY);
        assert_eq!(schedule_from_days(90, 0).unwrap().release_interval_secs, 1);
    }

    #[test]
    fn oversized_day_counts_are_rejected() {
        let err = schedule_from_days(i64::MAX, 0).unwrap_err();
        assert!(err.to_string().contains("--duration-days"));
        let err = schedule_from_days(150, i64::MAX / 2).unwrap_err();
        assert!(err.to_string().contains("--interval-days"));
    }

    #[test]
    fn vesting_example_parses() {
        let cli = Cli::try_parse_from([
            "yield-farm", "vesting", "--amount", "5000", "--duration-days", "90", "--interval-days", "15",
            "--step-days", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Vesting { duration_days, interval_days, step_days, monthly, .. } => {
                assert_eq!((duration_days, interval_days, step_days), (90, 15, 5));
                assert!(!monthly);
            }
            _ => panic!("expected the vesting command"),
        }
    }
}

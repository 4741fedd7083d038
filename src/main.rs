// src/main.rs
//
// Research-harness CLI entrypoint for gauntlet.
//
// Constraints:
// - CLI profile precedence: --profile overrides env;
//   if missing use GAUNTLET_CONTROL_PROFILE (default Runner).
// - Deterministic runs via --seed (offsets the per-episode seeds).
// - Episode count, decision budget, optional verbosity.
// - Print a concise run header (profile, level, cfg version/hash).

use clap::{ArgAction, Parser, ValueEnum};

use gauntlet::config::{resolve_effective_profile, Config, ControlProfile};
use gauntlet::env::EnvConfig;
use gauntlet::level::Level;
use gauntlet::logging::NoopSink;
use gauntlet::policy::{HeuristicPolicy, IdlePolicy, Policy};
use gauntlet::runner::{EpisodeConfig, EpisodeRunner};
use gauntlet::telemetry::EpisodeTelemetry;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProfileArg {
    Runner,
    Driver,
    Pilot,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LevelArg {
    /// Obstacle course with a pit, a bridge, and a two-stage goal.
    Obstacle,
    /// Ordered checkpoint circuit (pair with --profile pilot).
    Circuit,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    /// Scripted goal-seeker.
    Seeker,
    /// Hold every channel neutral.
    Idle,
}

#[derive(Debug, Parser)]
#[command(
    name = "gauntlet",
    about = "Deterministic course-running episode simulator (research harness)",
    version
)]
struct Args {
    /// Number of episodes to run.
    #[arg(long, default_value_t = 5)]
    episodes: u64,

    /// Decision steps per episode.
    #[arg(long, default_value_t = 2_000)]
    decisions: u64,

    /// Control profile preset (optional).
    /// If omitted, uses GAUNTLET_CONTROL_PROFILE (default Runner).
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Level to run.
    #[arg(long, value_enum, default_value = "obstacle")]
    level: LevelArg,

    /// Policy driving the episodes.
    #[arg(long, value_enum, default_value = "seeker")]
    policy: PolicyArg,

    /// Deterministic base seed (per-episode seeds are base + index).
    #[arg(long)]
    seed: Option<u64>,

    /// Write JSONL telemetry to this path.
    #[arg(long)]
    telemetry: Option<String>,

    /// Verbosity: -v episode summaries, -vv per-tick trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn main() {
    let args = Args::parse();

    let cli_profile = args.profile.map(|p| match p {
        ProfileArg::Runner => ControlProfile::Runner,
        ProfileArg::Driver => ControlProfile::Driver,
        ProfileArg::Pilot => ControlProfile::Pilot,
    });

    // Resolve profile with proper precedence: CLI > env > default.
    let effective = resolve_effective_profile(cli_profile);
    effective.log_startup();

    let cfg = Config::for_profile(effective.profile);
    let cfg_hash = fnv1a64(&format!("{cfg:?}"));

    let level = match args.level {
        LevelArg::Obstacle => Level::obstacle_course(),
        LevelArg::Circuit => Level::checkpoint_circuit(),
    };

    println!(
        "gauntlet | cfg={} | cfg_hash=0x{:016x} | profile={:?} | level={} | episodes={} | seed={}",
        cfg.version,
        cfg_hash,
        effective.profile,
        level.name,
        args.episodes,
        args.seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let telemetry = match &args.telemetry {
        Some(path) => match EpisodeTelemetry::to_file(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("[gauntlet] WARN: cannot open telemetry path {path:?}: {e}");
                EpisodeTelemetry::disabled()
            }
        },
        None => EpisodeTelemetry::from_env(),
    };

    let policy: Box<dyn Policy> = match args.policy {
        PolicyArg::Seeker => Box::new(HeuristicPolicy::new()),
        PolicyArg::Idle => Box::new(IdlePolicy::new()),
    };

    let env_cfg = EnvConfig {
        max_decisions: args.decisions,
    };
    let mut runner = EpisodeRunner::new(cfg, env_cfg, level, NoopSink)
        .with_policy(policy)
        .with_telemetry(telemetry);

    let base_seed = args.seed.unwrap_or(0);
    let mut total_reward = 0.0;
    let mut completed = 0u64;

    for i in 0..args.episodes {
        let ec = EpisodeConfig::default()
            .with_seed(base_seed + i)
            .with_episode_id(i + 1)
            .with_max_decisions(args.decisions)
            .with_verbosity(args.verbose);
        let summary = runner.run_episode(ec);

        total_reward += summary.cumulative_reward;
        if summary.termination == Some(gauntlet::state::TerminationCause::LevelComplete) {
            completed += 1;
        }

        println!(
            "episode {:>3} | seed {:>6} | ticks {:>5} | reward {:>9.3} | goals {} | cause {}",
            summary.episode_id,
            summary.seed,
            summary.total_ticks,
            summary.cumulative_reward,
            summary.goals_collected,
            summary
                .termination
                .map(|c| c.as_str())
                .unwrap_or("driver_budget"),
        );
    }

    runner.flush_telemetry();

    let mean = if args.episodes > 0 {
        total_reward / args.episodes as f64
    } else {
        0.0
    };
    println!(
        "done | episodes={} | completed={} | mean_reward={:.3}",
        args.episodes, completed, mean
    );
}

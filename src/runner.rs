// src/runner.rs
//
// Policy-driven episode runner: the decision-requesting collaborator.
//
// The runner owns the environment and a policy, invokes the policy once
// per decision interval, feeds the action to the environment, and logs
// telemetry with episode boundary markers. Episode mechanics are fully
// deterministic given the seed.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::env::{CourseEnv, EnvConfig};
use crate::level::Level;
use crate::logging::EventSink;
use crate::policy::{HeuristicPolicy, Policy};
use crate::state::TerminationCause;
use crate::telemetry::{EpisodeTelemetry, TickRecord};

/// Configuration for one episode run.
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Random seed for deterministic simulation.
    pub seed: u64,
    /// Episode ID for logging.
    pub episode_id: u64,
    /// Maximum number of decision steps to run.
    pub max_decisions: u64,
    /// Verbosity level (0=quiet, 1=summary, 2=per-tick trace).
    pub verbosity: u8,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            episode_id: 0,
            max_decisions: 2_000,
            verbosity: 0,
        }
    }
}

impl EpisodeConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_episode_id(mut self, episode_id: u64) -> Self {
        self.episode_id = episode_id;
        self
    }

    pub fn with_max_decisions(mut self, max_decisions: u64) -> Self {
        self.max_decisions = max_decisions;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Summary of a completed episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode_id: u64,
    pub seed: u64,
    /// Termination cause; None when the driver loop ran out of steps
    /// before the episode decided anything.
    pub termination: Option<TerminationCause>,
    pub total_ticks: u64,
    pub cumulative_reward: f64,
    pub goals_collected: u32,
    pub stuck_events: u32,
    /// Final progress baseline (None when every goal was retired).
    pub best_distance: Option<f64>,
    pub limit_reached: bool,
}

/// Episode runner with deterministic episode mechanics.
pub struct EpisodeRunner<S: EventSink> {
    env: CourseEnv,
    policy: Box<dyn Policy>,
    telemetry: EpisodeTelemetry,
    sink: S,
    config_version: &'static str,
}

impl<S: EventSink> EpisodeRunner<S> {
    /// Create a runner with the scripted seeker as the default policy.
    pub fn new(cfg: Config, env_cfg: EnvConfig, level: Level, sink: S) -> Self {
        let config_version = cfg.version;
        Self {
            env: CourseEnv::new(cfg, env_cfg, level),
            policy: Box::new(HeuristicPolicy::new()),
            telemetry: EpisodeTelemetry::disabled(),
            sink,
            config_version,
        }
    }

    /// Swap in a policy.
    pub fn with_policy(mut self, policy: Box<dyn Policy>) -> Self {
        self.policy = policy;
        self
    }

    /// Attach a telemetry writer.
    pub fn with_telemetry(mut self, telemetry: EpisodeTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Run a complete episode.
    pub fn run_episode(&mut self, ec: EpisodeConfig) -> EpisodeSummary {
        self.policy.reset_episode(ec.seed, ec.episode_id);

        let mut obs = self.env.reset(Some(ec.seed));
        self.telemetry
            .log_episode_start(ec.episode_id, ec.seed, obs.timestamp_ms);

        let mut termination: Option<TerminationCause> = None;
        let mut ticks: u64 = 0;
        let mut end_ms = obs.timestamp_ms;

        for _ in 0..ec.max_decisions {
            let action = self.policy.act(&obs);
            let result = self.env.step(&action);
            ticks = result.info.tick;
            end_ms = result.observation.timestamp_ms;

            let record = TickRecord::new(
                &result.observation,
                Some(&action),
                self.policy.version(),
                self.config_version,
                &result.info.events,
                result.info.limit_reached,
            );
            self.telemetry.log_tick(&record);
            self.sink.log_tick(
                result.info.tick,
                self.env.config(),
                self.env.state(),
                &result.info.events,
            );

            if ec.verbosity >= 2 {
                println!(
                    "tick {}: d={:?} reward={:.4} cum={:.4} stuck={} goals={}",
                    result.info.tick,
                    result.info.best_distance,
                    result.reward,
                    result.info.cumulative_reward,
                    result.info.stuck_counter,
                    result.info.goals_collected,
                );
            }

            obs = result.observation;
            if result.done {
                termination = result.info.termination;
                break;
            }
        }

        let state = self.env.state();
        let summary = EpisodeSummary {
            episode_id: ec.episode_id,
            seed: ec.seed,
            termination,
            total_ticks: ticks,
            cumulative_reward: state.cumulative_reward,
            goals_collected: state.goals_collected,
            stuck_events: state.stuck_counter,
            best_distance: if state.best_distance.is_finite() {
                Some(state.best_distance)
            } else {
                None
            },
            limit_reached: state.limit_reached,
        };

        self.telemetry.log_episode_end(
            ec.episode_id,
            ec.seed,
            end_ms,
            termination,
            summary.cumulative_reward,
            ticks,
        );

        if ec.verbosity >= 1 {
            self.print_episode_summary(&summary);
        }

        summary
    }

    /// Flush buffered telemetry.
    pub fn flush_telemetry(&mut self) {
        self.telemetry.flush();
    }

    /// Environment accessor (for testing).
    pub fn env(&self) -> &CourseEnv {
        &self.env
    }

    fn print_episode_summary(&self, summary: &EpisodeSummary) {
        let r = summary.cumulative_reward;
        let r_str = if r >= 0.0 {
            format!("+{r:.2}")
        } else {
            format!("{r:.2}")
        };

        println!();
        println!("=== Episode Summary ===");
        println!("Episode ID: {}", summary.episode_id);
        println!("Seed: {}", summary.seed);
        println!(
            "Termination: {}",
            summary
                .termination
                .map(|c| c.as_str())
                .unwrap_or("driver_budget")
        );
        println!("Ticks: {}", summary.total_ticks);
        println!("Cumulative reward: {r_str}");
        println!(
            "Goals collected: {} | stuck events: {} | ceiling latched: {}",
            summary.goals_collected, summary.stuck_events, summary.limit_reached
        );
    }
}

//! Gauntlet core library.
//!
//! This crate implements the episode & reward state machine behind
//! course-running RL agents: a per-tick decision loop that ingests
//! discrete or continuous control actions, applies them to a simulated
//! body, evaluates progress and penalty conditions against one or more
//! goals, and emits tagged scalar reward events plus termination
//! decisions. The binary (`src/main.rs`) is just a thin research harness
//! around these components.
//!
//! # Architecture
//!
//! The codebase keeps the episode semantics separate from any host world:
//!
//! - **State** (`state`): per-agent body pose, distance baselines, stuck
//!   counters, reward guards, episode phase.
//! - **Detectors** (`goal`, `progress`): spatial goal tracking with
//!   lockstep baseline resets, thresholded progress rewards, record
//!   bonuses, stuck escalation.
//! - **Guard** (`reward`): tagged reward events, the running accumulator,
//!   and the anti-exploit ceilings (time budget + one-way reward latch).
//! - **Mapper** (`motion`): deterministic action-to-motion translation
//!   with grounded/cooldown-gated jumps and smoothed attitude control.
//! - **Controller** (`episode`): the Idle -> Active -> Terminating reset
//!   loop, contact classification, and the goal collection protocol.
//! - **Environment** (`env`): Gym-shaped `reset`/`step` wrapper with a
//!   minimal deterministic kinematic world, plus `VecEnv` for parallel
//!   rollouts.
//! - **Runner** (`runner`): policy-driven driver loop with JSONL
//!   telemetry (`telemetry`) and pluggable sinks (`logging`).
//!
//! All execution is single-threaded and deterministic given a seed; the
//! only randomness is the per-episode seeded spawn sampler (`spawn`).

pub mod config;
pub mod env;
pub mod episode;
pub mod goal;
pub mod level;
pub mod logging;
pub mod motion;
pub mod observation;
pub mod policy;
pub mod progress;
pub mod reward;
pub mod runner;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod telemetry;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{
    resolve_effective_profile, Config, ControlProfile, EffectiveProfile, EpisodeLimits,
    GoalSelection, ProfileSource,
};

pub use state::{AgentState, EpisodePhase, TerminationCause};

pub use types::{ContactClass, ContactEvent, ContactPhase, TimestampMs, Vec3};

pub use level::{GoalKind, GoalSpec, GoalState, Hazard, Level};

pub use reward::{RewardEvent, RewardReason};

pub use motion::{Action, ContinuousAction, DiscreteAction, MoveCommand, TurnCommand};

pub use observation::{Observation, OBS_VERSION};

pub use policy::{HeuristicPolicy, IdlePolicy, Policy, HEURISTIC_POLICY_VERSION};

pub use episode::SimContext;

pub use env::{CourseEnv, EnvConfig, StepInfo, StepResult, VecEnv};

pub use runner::{EpisodeConfig, EpisodeRunner, EpisodeSummary};

pub use telemetry::{EpisodeTelemetry, TickRecord};

pub use logging::{EventSink, FileSink, NoopSink};

pub use spawn::{SpawnConfig, SpawnSample, SpawnSampler};

// --- Crate-level smoke tests ------------------------------------------------

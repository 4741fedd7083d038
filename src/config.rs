// src/config.rs
//
// Central configuration for the gauntlet episode core.
//
// This is the single source of truth for the tuned constants of the
// reward-shaping / episode state machine (progress thresholds, stuck
// windows, anti-exploit ceilings, motion constants, tick cadences).
// Defaults reproduce the hand-tuned values of the course agents this
// core generalizes.

use crate::spawn::SpawnConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Control profile this config was built for.
    pub profile: ControlProfile,
    /// Spawn placement (fixed or randomized box).
    pub spawn: SpawnConfig,
    /// Action-to-motion constants.
    pub motion: MotionConfig,
    /// Progress-reward shaping.
    pub progress: ProgressConfig,
    /// Stuck detection and escalation.
    pub stuck: StuckConfig,
    /// Anti-exploit episode ceilings.
    pub limits: EpisodeLimits,
    /// Goal collection protocol.
    pub goals: GoalConfig,
    /// Flat reward / penalty magnitudes.
    pub rewards: RewardConfig,
    /// Fixed-timestep cadences.
    pub ticks: TickConfig,
}

/// Coarse control profile preset.
///
/// Profiles only tweak a small set of constants on top of the runner
/// default; the episode machinery is identical across all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlProfile {
    /// Discrete obstacle-course walker (move / turn / jump).
    Runner,
    /// Continuous lateral-dodge driver on a fixed lane.
    Driver,
    /// Continuous attitude-controlled flyer over ordered checkpoints.
    Pilot,
}

impl ControlProfile {
    /// Stable lowercase name for the profile (used in logs/telemetry).
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlProfile::Runner => "runner",
            ControlProfile::Driver => "driver",
            ControlProfile::Pilot => "pilot",
        }
    }

    /// Parse a profile name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<ControlProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "runner" | "run" | "r" => Some(ControlProfile::Runner),
            "driver" | "drive" | "d" => Some(ControlProfile::Driver),
            "pilot" | "fly" | "p" => Some(ControlProfile::Pilot),
            _ => None,
        }
    }
}

/// Source of the effective control profile (for logging precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// Explicitly provided via CLI argument (highest priority).
    Cli,
    /// Loaded from GAUNTLET_CONTROL_PROFILE environment variable.
    Env,
    /// Default fallback (Runner).
    Default,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Cli => "cli",
            ProfileSource::Env => "env",
            ProfileSource::Default => "default",
        }
    }
}

/// Resolved profile with its source for logging.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveProfile {
    pub profile: ControlProfile,
    pub source: ProfileSource,
}

impl EffectiveProfile {
    /// Log the effective profile at startup (stderr, one stable line).
    pub fn log_startup(&self) {
        eprintln!(
            "effective_control_profile={} source={}",
            self.profile.as_str(),
            self.source.as_str()
        );
    }
}

/// Resolve the effective control profile.
///
/// Precedence (highest to lowest):
/// 1. `cli_profile` - if Some, use it (source=cli)
/// 2. `GAUNTLET_CONTROL_PROFILE` env var - if set and parseable (source=env)
/// 3. Default Runner (source=default)
pub fn resolve_effective_profile(cli_profile: Option<ControlProfile>) -> EffectiveProfile {
    if let Some(p) = cli_profile {
        return EffectiveProfile {
            profile: p,
            source: ProfileSource::Cli,
        };
    }

    if let Ok(env_val) = std::env::var("GAUNTLET_CONTROL_PROFILE") {
        if !env_val.is_empty() {
            if let Some(p) = ControlProfile::parse(&env_val) {
                return EffectiveProfile {
                    profile: p,
                    source: ProfileSource::Env,
                };
            }
            // Non-empty but unparseable: warn and fall through.
            eprintln!(
                "[config] WARN: invalid GAUNTLET_CONTROL_PROFILE={:?}; ignoring",
                env_val
            );
        }
    }

    EffectiveProfile {
        profile: ControlProfile::Runner,
        source: ProfileSource::Default,
    }
}

/// Action-to-motion constants.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Horizontal speed while a move command is held (units/s).
    pub move_speed: f64,
    /// Kinematic turn rate (degrees/s).
    pub turn_rate_deg: f64,
    /// Vertical velocity added by a jump impulse (units/s).
    pub jump_impulse: f64,
    /// Minimum time between accepted jumps (ms).
    pub jump_cooldown_ms: i64,
    /// |v_y| at or below which a grounded body counts as landed.
    pub landing_velocity_eps: f64,
    /// Airborne flag safety net: clear after this long aloft... (ms)
    pub airborne_safety_ms: i64,
    /// ...when |v_y| is below this (units/s).
    pub airborne_safety_velocity: f64,
    /// Downward acceleration applied by the integrator (units/s^2).
    pub gravity: f64,

    // ----- Continuous channel -----
    /// Strafe speed for the lateral channel (units/s).
    pub lateral_speed: f64,
    /// Half-width of the allowed lateral corridor around the spawn lane.
    pub lateral_limit: f64,
    /// Forward cruise speed along the body's attitude (units/s).
    pub cruise_speed: f64,
    /// Cruise multiplier while boosting.
    pub boost_multiplier: f64,
    /// Pitch rate at full deflection (degrees/s).
    pub pitch_rate_deg: f64,
    /// Yaw rate at full deflection (degrees/s).
    pub yaw_rate_deg: f64,
    /// Hard pitch clamp (degrees, symmetric).
    pub max_pitch_deg: f64,
    /// Rate at which smoothed control deflection chases the commanded
    /// deflection (full-deflections/s).
    pub attitude_smoothing: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_rate_deg: 220.0,
            jump_impulse: 10.0,
            jump_cooldown_ms: 200,
            landing_velocity_eps: 0.1,
            airborne_safety_ms: 1_000,
            airborne_safety_velocity: 0.5,
            gravity: -9.81,
            lateral_speed: 10.0,
            lateral_limit: 15.0,
            cruise_speed: 0.0,
            boost_multiplier: 2.0,
            pitch_rate_deg: 100.0,
            yaw_rate_deg: 100.0,
            max_pitch_deg: 45.0,
            attitude_smoothing: 2.0,
        }
    }
}

/// Progress-reward shaping constants.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Minimum significant reduction in distance-to-goal (units).
    /// Sub-threshold jitter never pays.
    pub progress_threshold: f64,
    /// Reward per unit of qualifying progress.
    pub progress_multiplier: f64,
    /// Reward per unit of new-record approach (unthresholded).
    pub record_multiplier: f64,
    /// Window without significant progress before the flat penalty (ms).
    pub no_progress_window_ms: i64,
    /// Flat penalty when the window expires (negative).
    pub no_progress_penalty: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            progress_threshold: 0.5,
            progress_multiplier: 0.2,
            record_multiplier: 0.3,
            no_progress_window_ms: 10_000,
            no_progress_penalty: -0.1,
        }
    }
}

/// Stuck detection and escalation constants.
#[derive(Debug, Clone)]
pub struct StuckConfig {
    /// Displacement below which the agent counts as not moving (units).
    pub displacement_threshold: f64,
    /// Sustained near-zero displacement before a stuck event (ms).
    pub window_ms: i64,
    /// Flat penalty per stuck event (negative).
    pub penalty: f64,
    /// Stuck-event count from which the penalty is multiplied.
    pub escalation_threshold: u32,
    /// Penalty multiplier once escalated. Must be >= 1.
    pub escalation_factor: f64,
    /// Stuck-event count that forces episode termination.
    pub terminate_after: u32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            displacement_threshold: 0.1,
            window_ms: 3_000,
            penalty: -0.2,
            escalation_threshold: 3,
            escalation_factor: 2.0,
            terminate_after: 6,
        }
    }
}

/// Anti-exploit ceilings, read-only during an episode.
#[derive(Debug, Clone)]
pub struct EpisodeLimits {
    /// Hard cap on cumulative reward per episode.
    pub max_cumulative_reward: f64,
    /// Hard cap on episode wall-clock duration (ms).
    pub max_episode_ms: i64,
}

impl Default for EpisodeLimits {
    fn default() -> Self {
        Self {
            max_cumulative_reward: 50.0,
            max_episode_ms: 120_000,
        }
    }
}

/// How the tracker picks the current target among active goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSelection {
    /// Nearest active goal by Euclidean distance (first wins ties).
    Nearest,
    /// Lowest-index active goal (checkpoint circuits).
    Ordered,
}

/// Goal collection protocol constants.
#[derive(Debug, Clone)]
pub struct GoalConfig {
    /// Reward per goal collection.
    pub collect_reward: f64,
    /// Terminal bonus when the level completes.
    pub level_complete_reward: f64,
    /// Re-entrancy guard: contacts within this window of the previous
    /// collection (per goal and per agent) are ignored (ms).
    pub collection_debounce_ms: i64,
    /// Target selection policy.
    pub selection: GoalSelection,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            collect_reward: 10.0,
            level_complete_reward: 50.0,
            collection_debounce_ms: 500,
            selection: GoalSelection::Nearest,
        }
    }
}

/// Flat reward / penalty magnitudes outside the progress system.
#[derive(Debug, Clone)]
pub struct RewardConfig {
    /// Penalty on fatal contact (negative).
    pub collision_penalty: f64,
    /// Penalty on falling below the level's fall height (negative).
    pub fall_penalty: f64,
    /// Penalty when the episode time budget expires (negative).
    pub timeout_penalty: f64,
    /// Penalty for a jump request while the gate is closed (negative).
    pub jump_refused_penalty: f64,
    /// Bonus per sustained-bridge-contact payout.
    pub bridge_bonus: f64,
    /// Minimum time between bridge payouts (ms).
    pub bridge_bonus_cooldown_ms: i64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            collision_penalty: -10.0,
            fall_penalty: -1.0,
            timeout_penalty: -0.5,
            jump_refused_penalty: -0.01,
            bridge_bonus: 0.02,
            bridge_bonus_cooldown_ms: 500,
        }
    }
}

/// Fixed-timestep cadences for the scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Physics integration step (ms).
    pub physics_dt_ms: i64,
    /// Decision / reward-evaluation step (ms). Whole multiple of the
    /// physics step in practice; the scheduler tolerates any value >= 1.
    pub decision_dt_ms: i64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            physics_dt_ms: 20,
            decision_dt_ms: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_profile(ControlProfile::Runner)
    }
}

impl Config {
    /// Build the config for a control profile.
    ///
    /// Runner is the baseline; Driver and Pilot tweak a handful of
    /// constants to match their control surface.
    pub fn for_profile(profile: ControlProfile) -> Self {
        let mut cfg = Config {
            version: "gauntlet-0.1.0",
            profile,
            spawn: SpawnConfig::default(),
            motion: MotionConfig::default(),
            progress: ProgressConfig::default(),
            stuck: StuckConfig::default(),
            limits: EpisodeLimits::default(),
            goals: GoalConfig::default(),
            rewards: RewardConfig::default(),
            ticks: TickConfig::default(),
        };

        match profile {
            ControlProfile::Runner => {}
            ControlProfile::Driver => {
                // Lane-dodge: no cruise of its own, tighter stuck window.
                cfg.motion.cruise_speed = 0.0;
                cfg.stuck.window_ms = 2_000;
            }
            ControlProfile::Pilot => {
                // Flight: attitude-driven cruise, no gravity sag, ordered
                // checkpoints, no lateral corridor.
                cfg.motion.cruise_speed = 15.0;
                cfg.motion.gravity = 0.0;
                cfg.motion.lateral_limit = f64::INFINITY;
                cfg.goals.selection = GoalSelection::Ordered;
                cfg.progress.no_progress_window_ms = 15_000;
            }
        }

        cfg
    }
}

// src/state.rs
//
// Per-agent episode state for the gauntlet core.
//
// Layout:
//  - Body: position / velocity / attitude + grounded / airborne flags
//    with their cooldown stamps.
//  - Goal tracking: current target plus the three distance baselines
//    (best = threshold-anchored, record = running minimum, last = plain
//    bookkeeping). best and record are monotone non-increasing within a
//    target and are reset together on retarget/reset.
//  - Guards: cumulative reward plus the one-way reward-ceiling latch.
//
// Notes:
//  - The ceiling latch is intended to be *latched*: once set it stays set
//    until the next episode begins.
//  - No cross-episode state lives here; everything is rewritten by
//    `episode::begin_episode`.

use serde::{Deserialize, Serialize};

use crate::types::{TimestampMs, Vec3, NEVER_MS};

/// Lifecycle phase of the episode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// No episode running; awaiting the next begin.
    Idle,
    /// Episode in progress.
    Active,
    /// Termination decided this tick; drains to Idle immediately.
    Terminating,
}

/// Why an episode ended. Every variant is a valid, expected outcome —
/// these are reported through the lifecycle, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// Touched a fatal contact class.
    FatalCollision,
    /// Fell below the level's height threshold.
    FellOutOfBounds,
    /// Episode time budget exhausted.
    TimeLimit,
    /// Cumulative reward ceiling reached.
    RewardLimit,
    /// Stuck-escalation limit reached.
    StuckLimit,
    /// All required goals collected.
    LevelComplete,
}

impl TerminationCause {
    /// Stable lowercase name (used in logs / telemetry).
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationCause::FatalCollision => "fatal_collision",
            TerminationCause::FellOutOfBounds => "fell_out_of_bounds",
            TerminationCause::TimeLimit => "time_limit",
            TerminationCause::RewardLimit => "reward_limit",
            TerminationCause::StuckLimit => "stuck_limit",
            TerminationCause::LevelComplete => "level_complete",
        }
    }
}

/// Full per-agent state. One instance per agent; agents never share state.
#[derive(Debug, Clone)]
pub struct AgentState {
    // ----- Body -----
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading (degrees, yaw 0 = +z).
    pub yaw_deg: f64,
    /// Attitude pitch (degrees, positive = nose up). Continuous profiles only.
    pub pitch_deg: f64,
    /// Smoothed pitch deflection in [-1, 1].
    pub smooth_pitch: f64,
    /// Smoothed yaw deflection in [-1, 1].
    pub smooth_yaw: f64,
    /// In contact with a walkable surface (includes bridges).
    pub grounded: bool,
    /// Jump in flight; cleared on stable landing or by the safety net.
    pub airborne: bool,
    /// When the last accepted jump fired.
    pub last_jump_ms: TimestampMs,
    /// Currently overlapping a bridge surface.
    pub on_bridge: bool,
    /// When the last bridge bonus paid out.
    pub last_bridge_bonus_ms: TimestampMs,

    // ----- Goal tracking -----
    /// Index of the tracked goal, or None when all goals are retired.
    pub target_goal: Option<usize>,
    /// Threshold-anchored progress baseline. Lowered only by a qualifying
    /// progress step; monotone non-increasing per target.
    pub best_distance: f64,
    /// Running minimum distance to the target (backs the record bonus).
    pub record_distance: f64,
    /// Distance at the most recent evaluation (bookkeeping only).
    pub last_distance: f64,
    /// When significant progress last happened (or the episode began).
    pub last_progress_ms: TimestampMs,

    // ----- Stuck detection -----
    /// Reference position; advances only on real movement.
    pub reference_position: Vec3,
    /// Accumulated near-zero-displacement time (ms).
    pub stuck_timer_ms: i64,
    /// Stuck events this episode. Never decreases mid-episode.
    pub stuck_counter: u32,

    // ----- Reward / guards -----
    pub cumulative_reward: f64,
    /// One-way reward-ceiling latch.
    pub limit_reached: bool,

    // ----- Episode bookkeeping -----
    pub phase: EpisodePhase,
    pub termination: Option<TerminationCause>,
    pub episode_id: u64,
    pub episode_start_ms: TimestampMs,
    /// Agent-side goal collection debounce stamp.
    pub last_goal_collection_ms: TimestampMs,
    /// Collections (contacts) this episode, counting both stages of a
    /// two-stage goal.
    pub goals_collected: u32,
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            smooth_pitch: 0.0,
            smooth_yaw: 0.0,
            grounded: true,
            airborne: false,
            last_jump_ms: NEVER_MS,
            on_bridge: false,
            last_bridge_bonus_ms: NEVER_MS,
            target_goal: None,
            best_distance: f64::INFINITY,
            record_distance: f64::INFINITY,
            last_distance: f64::INFINITY,
            last_progress_ms: 0,
            reference_position: Vec3::ZERO,
            stuck_timer_ms: 0,
            stuck_counter: 0,
            cumulative_reward: 0.0,
            limit_reached: false,
            phase: EpisodePhase::Idle,
            termination: None,
            episode_id: 0,
            episode_start_ms: 0,
            last_goal_collection_ms: NEVER_MS,
            goals_collected: 0,
        }
    }

    /// Elapsed episode time at `now_ms`.
    pub fn elapsed_ms(&self, now_ms: TimestampMs) -> i64 {
        now_ms - self.episode_start_ms
    }

    /// Remaining jump cooldown as a fraction in [0, 1].
    pub fn jump_cooldown_frac(&self, now_ms: TimestampMs, cooldown_ms: i64) -> f64 {
        if cooldown_ms <= 0 {
            return 0.0;
        }
        let remaining = (self.last_jump_ms + cooldown_ms - now_ms).max(0);
        (remaining as f64 / cooldown_ms as f64).clamp(0.0, 1.0)
    }

    /// Whether a jump request would currently be accepted.
    pub fn can_jump(&self, now_ms: TimestampMs, cooldown_ms: i64) -> bool {
        self.grounded && !self.airborne && now_ms - self.last_jump_ms > cooldown_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle_with_open_baselines() {
        let s = AgentState::new();
        assert_eq!(s.phase, EpisodePhase::Idle);
        assert!(s.best_distance.is_infinite());
        assert!(s.record_distance.is_infinite());
        assert!(!s.limit_reached);
        assert_eq!(s.stuck_counter, 0);
    }

    #[test]
    fn jump_gate_respects_cooldown_and_flags() {
        let mut s = AgentState::new();
        // Never jumped: gate open.
        assert!(s.can_jump(1_000, 200));

        s.last_jump_ms = 900;
        assert!(!s.can_jump(1_000, 200));
        assert!(s.can_jump(1_101, 200));

        s.airborne = true;
        assert!(!s.can_jump(2_000, 200));

        s.airborne = false;
        s.grounded = false;
        assert!(!s.can_jump(2_000, 200));
    }

    #[test]
    fn cooldown_fraction_decays_to_zero() {
        let mut s = AgentState::new();
        s.last_jump_ms = 1_000;
        assert!((s.jump_cooldown_frac(1_000, 200) - 1.0).abs() < 1e-12);
        assert!((s.jump_cooldown_frac(1_100, 200) - 0.5).abs() < 1e-12);
        assert!((s.jump_cooldown_frac(1_300, 200) - 0.0).abs() < 1e-12);
    }
}

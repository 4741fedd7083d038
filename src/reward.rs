// src/reward.rs
//
// Reward events, the running accumulator, and the anti-exploit guard.
//
// Events are produced by the detector components and consumed immediately
// by the accumulator; they are kept only for the duration of the tick so
// telemetry can log the breakdown. The guard bounds what a degenerate
// strategy can extract: a hard time budget and a one-way reward ceiling
// that suppresses further goal-directed reward without zeroing what was
// already earned.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::state::{AgentState, TerminationCause};
use crate::types::TimestampMs;

/// Reason code for a scalar reward delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardReason {
    /// Significant reduction in distance-to-goal.
    Progress,
    /// New minimum distance-to-goal (unthresholded).
    RecordBonus,
    /// Flat penalty after a window without significant progress.
    NoProgressPenalty,
    /// Sustained near-zero displacement.
    StuckPenalty,
    /// Fatal contact.
    CollisionPenalty,
    /// Goal collected.
    GoalCollected,
    /// All required goals collected.
    LevelComplete,
    /// Fell below the level's height threshold.
    FallPenalty,
    /// Episode time budget expired.
    TimePenalty,
    /// Jump requested while the gate was closed.
    JumpRefused,
    /// Sustained bridge contact payout.
    BridgeBonus,
}

impl RewardReason {
    /// Goal-directed rewards are the ones suppressed once the reward
    /// ceiling latch is set. Penalties always apply.
    pub fn is_goal_directed(&self) -> bool {
        matches!(
            self,
            RewardReason::Progress
                | RewardReason::RecordBonus
                | RewardReason::GoalCollected
                | RewardReason::LevelComplete
                | RewardReason::BridgeBonus
        )
    }

    /// Stable lowercase name (used in logs / telemetry).
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardReason::Progress => "progress",
            RewardReason::RecordBonus => "record_bonus",
            RewardReason::NoProgressPenalty => "no_progress_penalty",
            RewardReason::StuckPenalty => "stuck_penalty",
            RewardReason::CollisionPenalty => "collision_penalty",
            RewardReason::GoalCollected => "goal_collected",
            RewardReason::LevelComplete => "level_complete",
            RewardReason::FallPenalty => "fall_penalty",
            RewardReason::TimePenalty => "time_penalty",
            RewardReason::JumpRefused => "jump_refused",
            RewardReason::BridgeBonus => "bridge_bonus",
        }
    }
}

/// A tagged scalar reward delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub reason: RewardReason,
    pub delta: f64,
}

impl RewardEvent {
    pub fn new(reason: RewardReason, delta: f64) -> Self {
        Self { reason, delta }
    }
}

/// Apply one event to the running total.
///
/// Returns false (and drops the event) when the ceiling latch suppresses
/// it. Applied events are pushed to `applied` for telemetry and for the
/// per-step scalar reward.
pub fn apply_event(state: &mut AgentState, event: RewardEvent, applied: &mut Vec<RewardEvent>) -> bool {
    if state.limit_reached && event.reason.is_goal_directed() {
        return false;
    }
    state.cumulative_reward += event.delta;
    applied.push(event);
    true
}

/// Enforce the episode ceilings. Called once per decision tick.
///
/// Time budget first (mirrors the source ordering), then the reward cap.
/// The cap sets the one-way latch and terminates; earned reward is kept.
pub fn check_limits(
    state: &mut AgentState,
    cfg: &Config,
    now_ms: TimestampMs,
    applied: &mut Vec<RewardEvent>,
) -> Option<TerminationCause> {
    if state.elapsed_ms(now_ms) > cfg.limits.max_episode_ms {
        apply_event(
            state,
            RewardEvent::new(RewardReason::TimePenalty, cfg.rewards.timeout_penalty),
            applied,
        );
        return Some(TerminationCause::TimeLimit);
    }

    if state.cumulative_reward > cfg.limits.max_cumulative_reward {
        state.limit_reached = true;
        return Some(TerminationCause::RewardLimit);
    }

    None
}

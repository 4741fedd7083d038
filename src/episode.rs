// src/episode.rs
//
// Episode lifecycle controller.
//
// State machine: Idle -> Active -> Terminating -> Idle. There is no
// separate terminal state — termination drains immediately and the next
// begin starts a fresh episode. No cross-episode agent state survives a
// reset; goals are reused but rewound to their base state.
//
// Per-tick evaluation order (after the motion mapper has run and the
// integrator has advanced):
//   1. contact classification (fatal classes terminate, bridges pay)
//   2. goal trigger checks (debounced collection protocol)
//   3. fall check against the level's height threshold
//   4. anti-exploit guard (time budget, reward ceiling)
//   5. progress + stuck detectors
// The first stage to decide a termination cause wins; later stages are
// skipped for that tick.

use crate::config::Config;
use crate::goal::{self, CollectOutcome};
use crate::level::{GoalState, Level};
use crate::progress;
use crate::reward::{self, apply_event, RewardEvent, RewardReason};
use crate::spawn::SpawnSample;
use crate::state::{AgentState, EpisodePhase, TerminationCause};
use crate::types::{ContactEvent, ContactPhase, TimestampMs, Vec3, NEVER_MS};

/// Explicitly passed simulation context (replaces ambient global state).
/// The orchestrating harness owns it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimContext {
    /// While true, ticks are no-ops and no time accrues against the agent.
    pub paused: bool,
}

/// Begin a new episode: place the body, rewind every goal, pick the first
/// target, and clear all detector/guard state.
pub fn begin_episode(
    state: &mut AgentState,
    goals: &mut [GoalState],
    spawn: &SpawnSample,
    cfg: &Config,
    now_ms: TimestampMs,
    episode_id: u64,
) {
    // Body.
    state.position = spawn.position;
    state.velocity = Vec3::ZERO;
    state.yaw_deg = spawn.yaw_deg.rem_euclid(360.0);
    state.pitch_deg = 0.0;
    state.smooth_pitch = 0.0;
    state.smooth_yaw = 0.0;
    state.grounded = true;
    state.airborne = false;
    state.last_jump_ms = NEVER_MS;
    state.on_bridge = false;
    state.last_bridge_bonus_ms = NEVER_MS;

    // Goals back to their initial (non-collected, non-toggled) state.
    for g in goals.iter_mut() {
        g.reset();
    }

    // Detectors and guards.
    state.reference_position = spawn.position;
    state.stuck_timer_ms = 0;
    state.stuck_counter = 0;
    state.cumulative_reward = 0.0;
    state.limit_reached = false;
    state.last_progress_ms = now_ms;
    state.last_goal_collection_ms = NEVER_MS;
    state.goals_collected = 0;

    // Episode bookkeeping.
    state.phase = EpisodePhase::Active;
    state.termination = None;
    state.episode_id = episode_id;
    state.episode_start_ms = now_ms;

    goal::retarget(state, goals, cfg.goals.selection);
}

/// Evaluate one decision tick. Returns the termination cause, if any.
///
/// `contacts` come from the body/world collaborator; `dt_ms` is the
/// decision interval (used by the stuck accumulator).
pub fn evaluate_tick(
    state: &mut AgentState,
    goals: &mut [GoalState],
    level: &Level,
    contacts: &[ContactEvent],
    cfg: &Config,
    now_ms: TimestampMs,
    dt_ms: i64,
    applied: &mut Vec<RewardEvent>,
) -> Option<TerminationCause> {
    if state.phase != EpisodePhase::Active {
        return None;
    }

    let mut cause = classify_contacts(state, contacts, cfg, now_ms, applied);

    if cause.is_none() {
        cause = check_goal_triggers(state, goals, level, cfg, now_ms, applied);
    }

    if cause.is_none() && state.position.y < level.fall_height {
        apply_event(
            state,
            RewardEvent::new(RewardReason::FallPenalty, cfg.rewards.fall_penalty),
            applied,
        );
        cause = Some(TerminationCause::FellOutOfBounds);
    }

    if cause.is_none() {
        cause = reward::check_limits(state, cfg, now_ms, applied);
    }

    if cause.is_none() {
        progress::check_progress(state, goals, cfg, now_ms, applied);
        if progress::check_stuck(state, cfg, dt_ms, applied) {
            cause = Some(TerminationCause::StuckLimit);
        }
    }

    if let Some(c) = cause {
        state.termination = Some(c);
        state.phase = EpisodePhase::Terminating;
    }

    cause
}

/// Terminating -> Idle is always immediate.
pub fn finish_termination(state: &mut AgentState) {
    if state.phase == EpisodePhase::Terminating {
        state.phase = EpisodePhase::Idle;
    }
}

fn classify_contacts(
    state: &mut AgentState,
    contacts: &[ContactEvent],
    cfg: &Config,
    now_ms: TimestampMs,
    applied: &mut Vec<RewardEvent>,
) -> Option<TerminationCause> {
    for contact in contacts {
        if contact.class.is_fatal() && contact.phase != ContactPhase::End {
            apply_event(
                state,
                RewardEvent::new(
                    RewardReason::CollisionPenalty,
                    cfg.rewards.collision_penalty,
                ),
                applied,
            );
            return Some(TerminationCause::FatalCollision);
        }

        match (contact.class, contact.phase) {
            (crate::types::ContactClass::Bridge, ContactPhase::Begin) => {
                state.on_bridge = true;
            }
            (crate::types::ContactClass::Bridge, ContactPhase::Sustain) => {
                if state.on_bridge
                    && now_ms - state.last_bridge_bonus_ms > cfg.rewards.bridge_bonus_cooldown_ms
                {
                    apply_event(
                        state,
                        RewardEvent::new(RewardReason::BridgeBonus, cfg.rewards.bridge_bonus),
                        applied,
                    );
                    state.last_bridge_bonus_ms = now_ms;
                }
            }
            (crate::types::ContactClass::Bridge, ContactPhase::End) => {
                state.on_bridge = false;
            }
            (crate::types::ContactClass::Finish, ContactPhase::Begin) => {
                apply_event(
                    state,
                    RewardEvent::new(
                        RewardReason::LevelComplete,
                        cfg.goals.level_complete_reward,
                    ),
                    applied,
                );
                return Some(TerminationCause::LevelComplete);
            }
            _ => {}
        }
    }

    None
}

fn check_goal_triggers(
    state: &mut AgentState,
    goals: &mut [GoalState],
    level: &Level,
    cfg: &Config,
    now_ms: TimestampMs,
    applied: &mut Vec<RewardEvent>,
) -> Option<TerminationCause> {
    for idx in 0..goals.len() {
        if goals[idx].retired {
            continue;
        }
        if state.position.distance(goals[idx].position) > level.goal_radius {
            continue;
        }
        match goal::try_collect(
            state,
            goals,
            idx,
            level.required_goals,
            cfg,
            now_ms,
            applied,
        ) {
            CollectOutcome::LevelComplete => return Some(TerminationCause::LevelComplete),
            CollectOutcome::Collected | CollectOutcome::Ignored => {}
        }
    }
    None
}

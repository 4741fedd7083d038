// src/progress.rs
//
// Progress and stuck detectors. Both run once per decision tick.
//
// Progress is measured against the threshold-anchored `best_distance`
// baseline: sub-threshold positional jitter never pays, which closes the
// oscillation exploit of a naive per-tick distance-delta reward. The
// record bonus is the unthresholded companion stream over the running
// minimum. Stuck detection accumulates near-zero-displacement time and
// escalates monotonically: bigger penalties first, forced termination
// after the configured count.

use crate::config::Config;
use crate::level::GoalState;
use crate::reward::{apply_event, RewardEvent, RewardReason};
use crate::state::AgentState;
use crate::types::TimestampMs;

/// Evaluate goal-directed progress for this tick.
///
/// With no tracked goal this degrades to a no-op: only passive penalties
/// (stuck detection) still apply.
pub fn check_progress(
    state: &mut AgentState,
    goals: &[GoalState],
    cfg: &Config,
    now_ms: TimestampMs,
    applied: &mut Vec<RewardEvent>,
) {
    let Some(idx) = state.target_goal else {
        return;
    };
    let current = state.position.distance(goals[idx].position);

    // Significant progress: reward the full accumulated delta, then move
    // the baseline exactly once. A second evaluation at an unchanged
    // position sees delta 0 and cannot double-reward.
    let delta = state.best_distance - current;
    if delta >= cfg.progress.progress_threshold {
        apply_event(
            state,
            RewardEvent::new(RewardReason::Progress, delta * cfg.progress.progress_multiplier),
            applied,
        );
        state.best_distance = current;
        state.last_progress_ms = now_ms;
    }

    // New record approach: unthresholded bonus over the running minimum.
    if current < state.record_distance {
        apply_event(
            state,
            RewardEvent::new(
                RewardReason::RecordBonus,
                (state.record_distance - current) * cfg.progress.record_multiplier,
            ),
            applied,
        );
        state.record_distance = current;
    }

    state.last_distance = current;

    // Flat penalty once per expired window; restamping keeps it from
    // firing every tick.
    if now_ms - state.last_progress_ms > cfg.progress.no_progress_window_ms {
        apply_event(
            state,
            RewardEvent::new(
                RewardReason::NoProgressPenalty,
                cfg.progress.no_progress_penalty,
            ),
            applied,
        );
        state.last_progress_ms = now_ms;
    }
}

/// Accumulate stuck time and escalate. Returns true when the episode must
/// terminate with the stuck-limit cause.
pub fn check_stuck(
    state: &mut AgentState,
    cfg: &Config,
    dt_ms: i64,
    applied: &mut Vec<RewardEvent>,
) -> bool {
    let displacement = state.position.distance(state.reference_position);

    if displacement < cfg.stuck.displacement_threshold {
        state.stuck_timer_ms += dt_ms;
        if state.stuck_timer_ms >= cfg.stuck.window_ms {
            state.stuck_counter += 1;
            let mut penalty = cfg.stuck.penalty;
            if state.stuck_counter >= cfg.stuck.escalation_threshold {
                penalty *= cfg.stuck.escalation_factor.max(1.0);
            }
            apply_event(
                state,
                RewardEvent::new(RewardReason::StuckPenalty, penalty),
                applied,
            );
            state.stuck_timer_ms = 0;

            if state.stuck_counter >= cfg.stuck.terminate_after {
                return true;
            }
        }
    } else {
        // Real movement: the timer and the reference advance, the counter
        // does not.
        state.stuck_timer_ms = 0;
        state.reference_position = state.position;
    }

    false
}

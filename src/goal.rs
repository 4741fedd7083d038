// src/goal.rs
//
// Spatial goal tracker and the goal collection protocol.
//
// The tracker picks the current target among active goals (nearest or
// lowest-index) and, critically, resets the three distance baselines in
// lockstep with every retarget so progress rewards never leak across goal
// changes. Collection is debounced on both the goal and the agent so one
// overlapping contact cannot be counted twice.

use crate::config::{Config, GoalSelection};
use crate::level::{GoalKind, GoalState};
use crate::reward::{apply_event, RewardEvent, RewardReason};
use crate::state::AgentState;
use crate::types::{TimestampMs, Vec3};

/// Pick the target among active goals, or None when all are retired.
///
/// Nearest mode breaks ties by iteration order (first encountered wins).
pub fn select_target(position: Vec3, goals: &[GoalState], selection: GoalSelection) -> Option<usize> {
    match selection {
        GoalSelection::Nearest => {
            let mut best: Option<(usize, f64)> = None;
            for (idx, goal) in goals.iter().enumerate() {
                if !goal.is_active() {
                    continue;
                }
                let d = position.distance(goal.position);
                match best {
                    Some((_, best_d)) if d >= best_d => {}
                    _ => best = Some((idx, d)),
                }
            }
            best.map(|(idx, _)| idx)
        }
        GoalSelection::Ordered => goals.iter().position(|g| g.is_active()),
    }
}

/// Re-run target selection and reset the distance baselines in lockstep.
///
/// With no active goal left the baselines go unbounded and goal-directed
/// reward degrades gracefully to zero.
pub fn retarget(state: &mut AgentState, goals: &[GoalState], selection: GoalSelection) {
    state.target_goal = select_target(state.position, goals, selection);
    match state.target_goal {
        Some(idx) => {
            let d = state.position.distance(goals[idx].position);
            state.best_distance = d;
            state.record_distance = d;
            state.last_distance = d;
        }
        None => {
            state.best_distance = f64::INFINITY;
            state.record_distance = f64::INFINITY;
            state.last_distance = f64::INFINITY;
        }
    }
}

/// Outcome of one collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Debounced, retired, or otherwise not counted.
    Ignored,
    /// Counted; the episode continues.
    Collected,
    /// Counted and it was the last required retirement.
    LevelComplete,
}

/// Handle contact between the agent and goal `idx`.
///
/// Applies the collection reward, toggles or retires the goal, re-runs the
/// tracker, and reports level completion once the required number of goals
/// has retired (which also pays the terminal bonus).
pub fn try_collect(
    state: &mut AgentState,
    goals: &mut [GoalState],
    idx: usize,
    required_goals: usize,
    cfg: &Config,
    now_ms: TimestampMs,
    applied: &mut Vec<RewardEvent>,
) -> CollectOutcome {
    let debounce = cfg.goals.collection_debounce_ms;

    {
        let goal = &goals[idx];
        if goal.retired {
            return CollectOutcome::Ignored;
        }
        // Re-entrancy guard on both sides of the contact.
        if now_ms - goal.last_collection_ms <= debounce
            || now_ms - state.last_goal_collection_ms <= debounce
        {
            return CollectOutcome::Ignored;
        }
    }

    goals[idx].last_collection_ms = now_ms;
    state.last_goal_collection_ms = now_ms;
    state.goals_collected += 1;

    apply_event(
        state,
        RewardEvent::new(RewardReason::GoalCollected, cfg.goals.collect_reward),
        applied,
    );

    let kind = goals[idx].kind;
    match kind {
        GoalKind::Single => {
            goals[idx].retired = true;
        }
        GoalKind::TwoStage { offset } => {
            if !goals[idx].at_offset {
                goals[idx].position = goals[idx].base_position + offset;
                goals[idx].at_offset = true;
            } else {
                goals[idx].position = goals[idx].base_position;
                goals[idx].at_offset = false;
                goals[idx].retired = true;
            }
        }
    }

    let retired = goals.iter().filter(|g| g.retired).count();
    retarget(state, goals, cfg.goals.selection);

    if retired >= required_goals.min(goals.len()).max(1) {
        apply_event(
            state,
            RewardEvent::new(RewardReason::LevelComplete, cfg.goals.level_complete_reward),
            applied,
        );
        return CollectOutcome::LevelComplete;
    }

    CollectOutcome::Collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::GoalSpec;
    use crate::state::EpisodePhase;

    fn goals_at(positions: &[Vec3]) -> Vec<GoalState> {
        positions
            .iter()
            .map(|&p| {
                GoalState::from_spec(&GoalSpec {
                    position: p,
                    kind: GoalKind::Single,
                })
            })
            .collect()
    }

    fn active_state_at(p: Vec3) -> AgentState {
        let mut s = AgentState::new();
        s.phase = EpisodePhase::Active;
        s.position = p;
        s.reference_position = p;
        s
    }

    #[test]
    fn nearest_selection_prefers_closest_active() {
        let mut goals = goals_at(&[
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(0.0, 0.0, 5.0),
        ]);
        let pos = Vec3::ZERO;
        assert_eq!(select_target(pos, &goals, GoalSelection::Nearest), Some(1));

        goals[1].retired = true;
        assert_eq!(select_target(pos, &goals, GoalSelection::Nearest), Some(2));

        for g in &mut goals {
            g.retired = true;
        }
        assert_eq!(select_target(pos, &goals, GoalSelection::Nearest), None);
    }

    #[test]
    fn nearest_tie_break_is_first_encountered() {
        let goals = goals_at(&[Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -4.0)]);
        assert_eq!(
            select_target(Vec3::ZERO, &goals, GoalSelection::Nearest),
            Some(0)
        );
    }

    #[test]
    fn ordered_selection_ignores_distance() {
        let mut goals = goals_at(&[Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, 1.0)]);
        assert_eq!(select_target(Vec3::ZERO, &goals, GoalSelection::Ordered), Some(0));
        goals[0].retired = true;
        assert_eq!(select_target(Vec3::ZERO, &goals, GoalSelection::Ordered), Some(1));
    }

    #[test]
    fn retarget_resets_baselines_in_lockstep() {
        let goals = goals_at(&[Vec3::new(0.0, 0.0, 7.0)]);
        let mut state = active_state_at(Vec3::ZERO);
        state.best_distance = 1.0;
        state.record_distance = 0.5;

        retarget(&mut state, &goals, GoalSelection::Nearest);
        assert_eq!(state.target_goal, Some(0));
        assert!((state.best_distance - 7.0).abs() < 1e-12);
        assert!((state.record_distance - 7.0).abs() < 1e-12);
        assert!((state.last_distance - 7.0).abs() < 1e-12);
    }

    #[test]
    fn collection_is_debounced_on_reentry() {
        let cfg = Config::default();
        let mut goals = goals_at(&[Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)]);
        let mut state = active_state_at(Vec3::ZERO);
        let mut applied = Vec::new();

        let first = try_collect(&mut state, &mut goals, 0, 2, &cfg, 1_000, &mut applied);
        assert_eq!(first, CollectOutcome::Collected);
        assert_eq!(state.goals_collected, 1);

        // Same overlapping contact a tick later: silently ignored.
        let second = try_collect(&mut state, &mut goals, 1, 2, &cfg, 1_060, &mut applied);
        assert_eq!(second, CollectOutcome::Ignored);
        assert_eq!(state.goals_collected, 1);

        // After the window the other goal is collectable again.
        let third = try_collect(&mut state, &mut goals, 1, 2, &cfg, 1_601, &mut applied);
        assert_eq!(third, CollectOutcome::LevelComplete);
        assert_eq!(state.goals_collected, 2);
    }

    #[test]
    fn two_stage_goal_shuttles_then_retires() {
        let cfg = Config::default();
        let offset = Vec3::new(5.0, 0.0, 0.0);
        let mut goals = vec![GoalState::from_spec(&GoalSpec {
            position: Vec3::new(0.0, 0.0, 2.0),
            kind: GoalKind::TwoStage { offset },
        })];
        let mut state = active_state_at(Vec3::ZERO);
        let mut applied = Vec::new();

        let first = try_collect(&mut state, &mut goals, 0, 1, &cfg, 1_000, &mut applied);
        assert_eq!(first, CollectOutcome::Collected);
        assert!(goals[0].at_offset);
        assert!(goals[0].is_active());
        assert_eq!(goals[0].position, Vec3::new(5.0, 0.0, 2.0));
        // Baselines follow the shuttled goal.
        assert!((state.best_distance - state.position.distance(goals[0].position)).abs() < 1e-12);

        let second = try_collect(&mut state, &mut goals, 0, 1, &cfg, 2_000, &mut applied);
        assert_eq!(second, CollectOutcome::LevelComplete);
        assert!(goals[0].retired);
        assert_eq!(goals[0].position, goals[0].base_position);

        let reasons: Vec<_> = applied.iter().map(|e| e.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RewardReason::GoalCollected,
                RewardReason::GoalCollected,
                RewardReason::LevelComplete
            ]
        );
    }

    #[test]
    fn collection_rewards_accumulate() {
        let cfg = Config::default();
        let mut goals = goals_at(&[Vec3::ZERO]);
        let mut state = active_state_at(Vec3::ZERO);
        let mut applied = Vec::new();

        let out = try_collect(&mut state, &mut goals, 0, 1, &cfg, 1_000, &mut applied);
        assert_eq!(out, CollectOutcome::LevelComplete);
        let expected = cfg.goals.collect_reward + cfg.goals.level_complete_reward;
        assert!((state.cumulative_reward - expected).abs() < 1e-12);
    }
}

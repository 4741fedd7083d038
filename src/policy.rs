// src/policy.rs
//
// Policy trait and built-in implementations.
//
// The decision-requesting collaborator invokes `act` once per decision
// interval and treats the returned action vector as opaque input data for
// the motion mapper. Policies must be pure: same observation, same action.

use crate::motion::{Action, DiscreteAction, MoveCommand, TurnCommand};
use crate::observation::Observation;

/// Current scripted seeker version.
pub const HEURISTIC_POLICY_VERSION: &str = "seeker-v1.0.0";

/// Interface for all policy implementations (scripted or learned).
pub trait Policy: Send + Sync {
    /// Unique version string for this policy implementation.
    fn version(&self) -> &str;

    /// Compute an action given the current observation.
    ///
    /// Must be a pure function: same observation -> same action.
    fn act(&self, obs: &Observation) -> Action;

    /// Reset the policy for a new episode.
    ///
    /// The seed enables deterministic episode sequences for stateful
    /// policies; the built-in policies are stateless.
    fn reset_episode(&mut self, seed: u64, episode_id: u64);
}

/// Scripted goal-seeker: the human-heuristic baseline.
///
/// Turns toward the tracked goal while the bearing is off, walks forward
/// once roughly aligned, never jumps. Deliberately simple — it exists to
/// drive episodes deterministically, not to solve courses optimally.
pub struct HeuristicPolicy {
    version: String,
    _seed: u64,
    _episode_id: u64,
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self {
            version: HEURISTIC_POLICY_VERSION.to_string(),
            _seed: 0,
            _episode_id: 0,
        }
    }
}

impl Policy for HeuristicPolicy {
    fn version(&self) -> &str {
        &self.version
    }

    fn act(&self, obs: &Observation) -> Action {
        if !obs.has_goal {
            return Action::idle();
        }

        let turn = if obs.goal_bearing > 0.15 {
            TurnCommand::Right
        } else if obs.goal_bearing < -0.15 {
            TurnCommand::Left
        } else {
            TurnCommand::Hold
        };

        let movement = if obs.goal_alignment > 0.0 {
            MoveCommand::Forward
        } else {
            MoveCommand::Hold
        };

        Action::Discrete(DiscreteAction {
            movement,
            turn,
            jump: false,
        })
    }

    fn reset_episode(&mut self, seed: u64, episode_id: u64) {
        self._seed = seed;
        self._episode_id = episode_id;
    }
}

/// Policy that holds every channel neutral. Useful as a do-nothing
/// baseline and for exercising the stuck detector.
#[derive(Debug, Default)]
pub struct IdlePolicy;

impl IdlePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for IdlePolicy {
    fn version(&self) -> &str {
        "idle-v1.0.0"
    }

    fn act(&self, _obs: &Observation) -> Action {
        Action::idle()
    }

    fn reset_episode(&mut self, _seed: u64, _episode_id: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::level::{GoalKind, GoalSpec, GoalState};
    use crate::state::AgentState;
    use crate::types::Vec3;

    fn obs_with_goal_at(p: Vec3) -> Observation {
        let cfg = Config::default();
        let goals = vec![GoalState::from_spec(&GoalSpec {
            position: p,
            kind: GoalKind::Single,
        })];
        let mut state = AgentState::new();
        crate::goal::retarget(&mut state, &goals, cfg.goals.selection);
        Observation::from_state(&state, &goals, &cfg, 1_000, 0)
    }

    #[test]
    fn seeker_walks_toward_aligned_goal() {
        let obs = obs_with_goal_at(Vec3::new(0.0, 0.0, 10.0));
        let policy = HeuristicPolicy::new();
        match policy.act(&obs) {
            Action::Discrete(a) => {
                assert_eq!(a.movement, MoveCommand::Forward);
                assert_eq!(a.turn, TurnCommand::Hold);
                assert!(!a.jump);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn seeker_turns_toward_offset_goal() {
        let obs = obs_with_goal_at(Vec3::new(10.0, 0.0, 0.0));
        let policy = HeuristicPolicy::new();
        match policy.act(&obs) {
            Action::Discrete(a) => assert_eq!(a.turn, TurnCommand::Right),
            other => panic!("unexpected action {other:?}"),
        }

        let obs = obs_with_goal_at(Vec3::new(-10.0, 0.0, 0.0));
        match policy.act(&obs) {
            Action::Discrete(a) => assert_eq!(a.turn, TurnCommand::Left),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn seeker_idles_without_goal() {
        let cfg = Config::default();
        let state = AgentState::new();
        let obs = Observation::from_state(&state, &[], &cfg, 1_000, 0);
        let policy = HeuristicPolicy::new();
        assert_eq!(policy.act(&obs), Action::idle());
    }

    #[test]
    fn policies_are_pure() {
        let obs = obs_with_goal_at(Vec3::new(3.0, 0.0, 4.0));
        let policy = HeuristicPolicy::new();
        assert_eq!(policy.act(&obs), policy.act(&obs));
        let idle = IdlePolicy::new();
        assert_eq!(idle.act(&obs), idle.act(&obs));
    }
}

// src/observation.rs
//
// Versioned Observation schema for policy input.
//
// Design requirements:
// - Versioned (obs_version field) for schema evolution
// - Serializable (serde) for logging and replay
// - Zero-filled goal features with an explicit has_goal flag when every
//   goal is retired (keeps the vector shape stable)
// - Normalized/scaled features for stable training
//
// All fields are finite; canonical JSON is used for byte-identical
// determinism assertions in tests.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::level::GoalState;
use crate::state::AgentState;
use crate::types::{forward_from_yaw, right_from_yaw, TimestampMs};

/// Current observation schema version.
/// Increment when adding/removing/changing fields.
pub const OBS_VERSION: u32 = 1;

/// Positional scale: world units per observation unit.
const POSITION_SCALE: f64 = 10.0;

/// State snapshot handed to policies once per decision interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    // ----- Metadata -----
    /// Schema version for forwards/backwards compatibility.
    pub obs_version: u32,
    pub timestamp_ms: TimestampMs,
    pub tick_index: u64,
    pub episode_id: u64,

    // ----- Agent pose (scaled) -----
    pub position_x: f64,
    pub position_z: f64,
    pub height: f64,

    // ----- Goal features (zero-filled when no goal remains) -----
    pub has_goal: bool,
    /// Direction to the goal, planar components (scaled).
    pub goal_dx: f64,
    pub goal_dz: f64,
    /// Distance to the goal (scaled).
    pub goal_distance: f64,
    /// dot(forward, direction): 1 = dead ahead, -1 = behind.
    pub goal_alignment: f64,
    /// cross(forward, direction).y: >0 = turn right, <0 = turn left.
    pub goal_bearing: f64,
    /// Goal direction in body-local coordinates.
    pub goal_local_x: f64,
    pub goal_local_z: f64,

    // ----- Body state -----
    pub grounded: bool,
    pub airborne: bool,
    pub on_bridge: bool,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    /// Remaining jump cooldown in [0, 1]: 0 = ready, 1 = just fired.
    pub jump_cooldown_frac: f64,
    pub can_jump: bool,

    // ----- Episode scalars -----
    pub cumulative_reward: f64,
    pub stuck_counter: u32,
}

impl Observation {
    /// Build an Observation from agent state. Deterministic given the
    /// same state.
    pub fn from_state(
        state: &AgentState,
        goals: &[GoalState],
        cfg: &Config,
        now_ms: TimestampMs,
        tick_index: u64,
    ) -> Self {
        let mut obs = Observation {
            obs_version: OBS_VERSION,
            timestamp_ms: now_ms,
            tick_index,
            episode_id: state.episode_id,
            position_x: state.position.x / POSITION_SCALE,
            position_z: state.position.z / POSITION_SCALE,
            height: state.position.y / POSITION_SCALE,
            has_goal: false,
            goal_dx: 0.0,
            goal_dz: 0.0,
            goal_distance: 0.0,
            goal_alignment: 0.0,
            goal_bearing: 0.0,
            goal_local_x: 0.0,
            goal_local_z: 0.0,
            grounded: state.grounded,
            airborne: state.airborne,
            on_bridge: state.on_bridge,
            velocity_x: state.velocity.x / POSITION_SCALE,
            velocity_y: state.velocity.y / POSITION_SCALE,
            velocity_z: state.velocity.z / POSITION_SCALE,
            jump_cooldown_frac: state.jump_cooldown_frac(now_ms, cfg.motion.jump_cooldown_ms),
            can_jump: state.can_jump(now_ms, cfg.motion.jump_cooldown_ms),
            cumulative_reward: state.cumulative_reward,
            stuck_counter: state.stuck_counter,
        };

        if let Some(idx) = state.target_goal {
            if let Some(goal) = goals.get(idx) {
                let to_goal = goal.position - state.position;
                let dir = to_goal.normalized();
                let forward = forward_from_yaw(state.yaw_deg);
                let right = right_from_yaw(state.yaw_deg);

                obs.has_goal = true;
                obs.goal_dx = to_goal.x / POSITION_SCALE;
                obs.goal_dz = to_goal.z / POSITION_SCALE;
                obs.goal_distance = to_goal.length() / POSITION_SCALE;
                obs.goal_alignment = forward.dot(dir);
                obs.goal_bearing = forward.cross(dir).y;
                obs.goal_local_x = right.dot(dir);
                obs.goal_local_z = forward.dot(dir);
            }
        }

        obs
    }

    /// Serialize to canonical JSON bytes for byte-for-byte comparison.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        // serde_json preserves struct field order, which is all the
        // canonicalization this schema needs.
        serde_json::to_vec(self)
    }
}

// src/motion.rs
//
// Action-to-motion mapping.
//
// Fully deterministic given (action, grounded/cooldown state) — no hidden
// randomness. Discrete commands override horizontal velocity each tick at
// a fixed speed while the vertical component is left to the integrator;
// turning is kinematic (fixed angular increment, not an impulse); the jump
// is a single gated impulse with a cooldown and an airborne flag with a
// timeout safety net. Continuous commands drive a lateral strafe channel
// and a smoothed attitude (pitch/yaw) cruise.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::level::Level;
use crate::reward::{apply_event, RewardEvent, RewardReason};
use crate::state::AgentState;
use crate::types::{forward_from_attitude, forward_from_yaw, right_from_yaw, TimestampMs, Vec3};

/// Forward/backward channel of the discrete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveCommand {
    #[default]
    Hold,
    Forward,
    Backward,
}

/// Turn channel of the discrete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnCommand {
    #[default]
    Hold,
    Left,
    Right,
}

/// Discrete action vector (runner profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscreteAction {
    pub movement: MoveCommand,
    pub turn: TurnCommand,
    pub jump: bool,
}

/// Continuous action vector (driver / pilot profiles).
///
/// All channels are deflections in [-1, 1]; out-of-range values are
/// clamped at the mapping boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuousAction {
    pub lateral: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub boost: bool,
}

/// Either action family. The core treats the vector purely as input data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Discrete(DiscreteAction),
    Continuous(ContinuousAction),
}

impl Action {
    /// Neutral action: hold everything.
    pub fn idle() -> Action {
        Action::Discrete(DiscreteAction::default())
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::idle()
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

/// Refresh the airborne flag from grounding state.
///
/// Cleared on a stable landing (grounded with |v_y| at rest), or by the
/// safety net when collision geometry never re-triggers the grounded
/// check: long enough aloft with near-zero vertical speed.
pub fn update_grounding(state: &mut AgentState, cfg: &Config, now_ms: TimestampMs) {
    if state.grounded {
        if state.velocity.y <= cfg.motion.landing_velocity_eps {
            state.airborne = false;
        }
    } else if state.airborne
        && now_ms - state.last_jump_ms > cfg.motion.airborne_safety_ms
        && state.velocity.y.abs() < cfg.motion.airborne_safety_velocity
    {
        state.airborne = false;
    }
}

/// Map one action onto the body for this decision tick.
pub fn apply_action(
    state: &mut AgentState,
    action: &Action,
    level: &Level,
    cfg: &Config,
    now_ms: TimestampMs,
    dt_ms: i64,
    applied: &mut Vec<RewardEvent>,
) {
    update_grounding(state, cfg, now_ms);

    match action {
        Action::Discrete(a) => apply_discrete(state, a, cfg, now_ms, dt_ms, applied),
        Action::Continuous(a) => apply_continuous(state, a, level, cfg, dt_ms),
    }
}

fn apply_discrete(
    state: &mut AgentState,
    action: &DiscreteAction,
    cfg: &Config,
    now_ms: TimestampMs,
    dt_ms: i64,
    applied: &mut Vec<RewardEvent>,
) {
    let dt = dt_ms as f64 / 1_000.0;

    // Kinematic turn.
    match action.turn {
        TurnCommand::Left => state.yaw_deg -= cfg.motion.turn_rate_deg * dt,
        TurnCommand::Right => state.yaw_deg += cfg.motion.turn_rate_deg * dt,
        TurnCommand::Hold => {}
    }
    state.yaw_deg = state.yaw_deg.rem_euclid(360.0);

    // Horizontal velocity is fully overridden; vertical is preserved for
    // the integrator.
    let dir = match action.movement {
        MoveCommand::Forward => forward_from_yaw(state.yaw_deg),
        MoveCommand::Backward => -forward_from_yaw(state.yaw_deg),
        MoveCommand::Hold => Vec3::ZERO,
    };
    state.velocity = Vec3::new(
        dir.x * cfg.motion.move_speed,
        state.velocity.y,
        dir.z * cfg.motion.move_speed,
    );

    if action.jump {
        if state.can_jump(now_ms, cfg.motion.jump_cooldown_ms) {
            state.velocity.y += cfg.motion.jump_impulse;
            state.last_jump_ms = now_ms;
            state.airborne = true;
            state.grounded = false;
        } else {
            apply_event(
                state,
                RewardEvent::new(RewardReason::JumpRefused, cfg.rewards.jump_refused_penalty),
                applied,
            );
        }
    }
}

fn apply_continuous(
    state: &mut AgentState,
    action: &ContinuousAction,
    level: &Level,
    cfg: &Config,
    dt_ms: i64,
) {
    let dt = dt_ms as f64 / 1_000.0;
    let m = &cfg.motion;

    // Smoothed deflections chase the commanded deflections.
    let step = m.attitude_smoothing * dt;
    state.smooth_pitch = move_towards(state.smooth_pitch, action.pitch.clamp(-1.0, 1.0), step);
    state.smooth_yaw = move_towards(state.smooth_yaw, action.yaw.clamp(-1.0, 1.0), step);

    state.pitch_deg = (state.pitch_deg + state.smooth_pitch * m.pitch_rate_deg * dt)
        .clamp(-m.max_pitch_deg, m.max_pitch_deg);
    state.yaw_deg = (state.yaw_deg + state.smooth_yaw * m.yaw_rate_deg * dt).rem_euclid(360.0);

    let speed = m.cruise_speed
        * if action.boost {
            m.boost_multiplier
        } else {
            1.0
        };
    let cruise = forward_from_attitude(state.yaw_deg, state.pitch_deg) * speed;
    let strafe = right_from_yaw(state.yaw_deg) * (action.lateral.clamp(-1.0, 1.0) * m.lateral_speed);

    // Full velocity override: the attitude owns the vertical channel too.
    state.velocity = cruise + strafe;

    // Lateral corridor around the spawn lane.
    if m.lateral_limit.is_finite() {
        let min_x = level.spawn_position.x - m.lateral_limit;
        let max_x = level.spawn_position.x + m.lateral_limit;
        state.position.x = state.position.x.clamp(min_x, max_x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlProfile;
    use crate::state::EpisodePhase;

    fn runner_setup() -> (Config, Level, AgentState) {
        let cfg = Config::default();
        let level = Level::obstacle_course();
        let mut state = AgentState::new();
        state.phase = EpisodePhase::Active;
        state.grounded = true;
        (cfg, level, state)
    }

    #[test]
    fn forward_overrides_horizontal_and_preserves_vertical() {
        let (cfg, level, mut state) = runner_setup();
        state.velocity = Vec3::new(9.0, -3.0, 9.0);
        state.grounded = false; // falling
        let action = Action::Discrete(DiscreteAction {
            movement: MoveCommand::Forward,
            ..DiscreteAction::default()
        });
        let mut applied = Vec::new();

        apply_action(&mut state, &action, &level, &cfg, 1_000, 60, &mut applied);
        assert!((state.velocity.x - 0.0).abs() < 1e-9);
        assert!((state.velocity.z - cfg.motion.move_speed).abs() < 1e-9);
        assert!((state.velocity.y - -3.0).abs() < 1e-12, "gravity channel untouched");
    }

    #[test]
    fn hold_zeroes_horizontal_motion() {
        let (cfg, level, mut state) = runner_setup();
        state.velocity = Vec3::new(4.0, 2.0, 4.0);
        let mut applied = Vec::new();
        apply_action(&mut state, &Action::idle(), &level, &cfg, 1_000, 60, &mut applied);
        assert!((state.velocity.x).abs() < 1e-12);
        assert!((state.velocity.z).abs() < 1e-12);
        assert!((state.velocity.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn turn_is_kinematic_fixed_increment() {
        let (cfg, level, mut state) = runner_setup();
        let action = Action::Discrete(DiscreteAction {
            turn: TurnCommand::Right,
            ..DiscreteAction::default()
        });
        let mut applied = Vec::new();
        apply_action(&mut state, &action, &level, &cfg, 1_000, 100, &mut applied);
        assert!((state.yaw_deg - cfg.motion.turn_rate_deg * 0.1).abs() < 1e-9);
    }

    #[test]
    fn jump_gate_accepts_then_refuses_with_penalty() {
        let (cfg, level, mut state) = runner_setup();
        let jump = Action::Discrete(DiscreteAction {
            jump: true,
            ..DiscreteAction::default()
        });
        let mut applied = Vec::new();

        apply_action(&mut state, &jump, &level, &cfg, 1_000, 60, &mut applied);
        assert!(state.airborne);
        assert_eq!(state.last_jump_ms, 1_000);
        assert!((state.velocity.y - cfg.motion.jump_impulse).abs() < 1e-12);
        assert!(applied.is_empty());

        // Still airborne: refused, penalized, no second impulse.
        let vy = state.velocity.y;
        apply_action(&mut state, &jump, &level, &cfg, 1_060, 60, &mut applied);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].reason, RewardReason::JumpRefused);
        assert!((state.velocity.y - vy).abs() < 1e-12);
        assert_eq!(state.last_jump_ms, 1_000);
    }

    #[test]
    fn jump_refused_during_cooldown_even_when_grounded() {
        let (cfg, level, mut state) = runner_setup();
        let jump = Action::Discrete(DiscreteAction {
            jump: true,
            ..DiscreteAction::default()
        });
        let mut applied = Vec::new();

        apply_action(&mut state, &jump, &level, &cfg, 1_000, 60, &mut applied);
        // Land immediately: grounded, vertical at rest.
        state.grounded = true;
        state.velocity.y = 0.0;

        apply_action(&mut state, &jump, &level, &cfg, 1_100, 60, &mut applied);
        assert_eq!(applied.len(), 1, "cooldown still running at +100ms");

        applied.clear();
        apply_action(&mut state, &jump, &level, &cfg, 1_201, 60, &mut applied);
        assert!(applied.is_empty(), "cooldown elapsed at +201ms");
        assert_eq!(state.last_jump_ms, 1_201);
    }

    #[test]
    fn airborne_safety_net_clears_flag() {
        let (cfg, _level, mut state) = runner_setup();
        state.airborne = true;
        state.grounded = false;
        state.last_jump_ms = 0;
        state.velocity.y = 0.1; // wedged on geometry, not moving vertically

        update_grounding(&mut state, &cfg, 500);
        assert!(state.airborne, "before the safety window");

        update_grounding(&mut state, &cfg, 1_100);
        assert!(!state.airborne, "safety net must clear the flag");
    }

    #[test]
    fn stable_landing_clears_airborne() {
        let (cfg, _level, mut state) = runner_setup();
        state.airborne = true;
        state.grounded = true;
        state.velocity.y = 0.05;
        update_grounding(&mut state, &cfg, 2_000);
        assert!(!state.airborne);
    }

    #[test]
    fn continuous_pitch_is_smoothed_and_clamped() {
        let cfg = Config::for_profile(ControlProfile::Pilot);
        let level = Level::checkpoint_circuit();
        let mut state = AgentState::new();
        state.phase = EpisodePhase::Active;
        let full_up = Action::Continuous(ContinuousAction {
            pitch: 1.0,
            ..ContinuousAction::default()
        });
        let mut applied = Vec::new();

        apply_action(&mut state, &full_up, &level, &cfg, 1_000, 100, &mut applied);
        // Smoothing: deflection only reached 0.2 after 100ms at 2.0/s.
        assert!((state.smooth_pitch - 0.2).abs() < 1e-9);
        assert!(state.pitch_deg > 0.0 && state.pitch_deg < cfg.motion.max_pitch_deg);

        for _ in 0..100 {
            apply_action(&mut state, &full_up, &level, &cfg, 1_000, 100, &mut applied);
        }
        assert!((state.pitch_deg - cfg.motion.max_pitch_deg).abs() < 1e-9);
        assert!(state.velocity.y > 0.0, "nose up climbs");
    }

    #[test]
    fn lateral_corridor_clamps_position() {
        let cfg = Config::for_profile(ControlProfile::Driver);
        let level = Level::obstacle_course();
        let mut state = AgentState::new();
        state.phase = EpisodePhase::Active;
        state.position = Vec3::new(level.spawn_position.x + 100.0, 0.0, 0.0);
        let action = Action::Continuous(ContinuousAction {
            lateral: 1.0,
            ..ContinuousAction::default()
        });
        let mut applied = Vec::new();

        apply_action(&mut state, &action, &level, &cfg, 1_000, 60, &mut applied);
        assert!(
            (state.position.x - (level.spawn_position.x + cfg.motion.lateral_limit)).abs() < 1e-9
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let (cfg, level, state0) = runner_setup();
        let action = Action::Discrete(DiscreteAction {
            movement: MoveCommand::Forward,
            turn: TurnCommand::Left,
            jump: true,
        });

        let mut s1 = state0.clone();
        let mut s2 = state0;
        let mut a1 = Vec::new();
        let mut a2 = Vec::new();
        apply_action(&mut s1, &action, &level, &cfg, 1_000, 60, &mut a1);
        apply_action(&mut s2, &action, &level, &cfg, 1_000, 60, &mut a2);
        assert_eq!(s1.velocity, s2.velocity);
        assert!((s1.yaw_deg - s2.yaw_deg).abs() < 1e-15);
        assert_eq!(a1, a2);
    }

    #[test]
    fn move_towards_saturates() {
        assert!((move_towards(0.0, 1.0, 0.25) - 0.25).abs() < 1e-12);
        assert!((move_towards(0.9, 1.0, 0.25) - 1.0).abs() < 1e-12);
        assert!((move_towards(0.0, -1.0, 0.25) + 0.25).abs() < 1e-12);
    }
}

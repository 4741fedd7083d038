// src/level.rs
//
// Static scene description and per-episode goal state.
//
// A Level is the scene collaborator: it supplies the goal set, the fatal /
// walkable hazard volumes, the spawn transform, and the out-of-bounds
// height. Contact classes are resolved here, once, at build time — the
// per-collision path never sees a tag string.
//
// Goals are created at level load and reused across episodes: reset to
// their base state at episode begin, toggled / retired on contact, never
// destroyed.

use serde::{Deserialize, Serialize};

use crate::types::{ContactClass, TimestampMs, Vec3, NEVER_MS};

/// Goal behavior on collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GoalKind {
    /// Retires on first contact.
    Single,
    /// Shuttles to `base + offset` on first contact, retires on the second.
    TwoStage { offset: Vec3 },
}

/// Static goal description inside a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub position: Vec3,
    pub kind: GoalKind,
}

/// Live goal state, reused across episodes.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// Position at level load; the reset target.
    pub base_position: Vec3,
    /// Current (possibly toggled) position.
    pub position: Vec3,
    pub kind: GoalKind,
    /// No longer collectable this episode.
    pub retired: bool,
    /// Two-stage goal currently sitting at its offset position.
    pub at_offset: bool,
    /// Goal-side collection debounce stamp.
    pub last_collection_ms: TimestampMs,
}

impl GoalState {
    pub fn from_spec(spec: &GoalSpec) -> Self {
        Self {
            base_position: spec.position,
            position: spec.position,
            kind: spec.kind,
            retired: false,
            at_offset: false,
            last_collection_ms: NEVER_MS,
        }
    }

    /// Back to the initial (non-collected, non-toggled) state.
    pub fn reset(&mut self) {
        self.position = self.base_position;
        self.retired = false;
        self.at_offset = false;
        self.last_collection_ms = NEVER_MS;
    }

    /// Available for collection and targeting.
    pub fn is_active(&self) -> bool {
        !self.retired
    }
}

/// Axis-aligned hazard / trigger volume with a resolved contact class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub class: ContactClass,
    pub min: Vec3,
    pub max: Vec3,
}

impl Hazard {
    pub fn new(class: ContactClass, min: Vec3, max: Vec3) -> Self {
        Self { class, min, max }
    }

    /// Build from a scene tag. Returns None for tags the core ignores.
    pub fn from_tag(tag: &str, min: Vec3, max: Vec3) -> Option<Self> {
        ContactClass::from_tag(tag).map(|class| Self { class, min, max })
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether (x, z) lies inside the volume's footprint.
    pub fn footprint_contains(&self, x: f64, z: f64) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }
}

/// Static level description, scoped to one agent instance.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    /// Fixed spawn transform (randomized spawn offsets from here).
    pub spawn_position: Vec3,
    pub spawn_yaw_deg: f64,
    pub goals: Vec<GoalSpec>,
    pub hazards: Vec<Hazard>,
    /// Walkable floor height for the ground clamp.
    pub ground_height: f64,
    /// Falling below this y terminates the episode.
    pub fall_height: f64,
    /// Goal trigger radius.
    pub goal_radius: f64,
    /// Goal retirements needed for level completion.
    pub required_goals: usize,
}

impl Level {
    /// Instantiate the live goal set for this level.
    pub fn build_goals(&self) -> Vec<GoalState> {
        self.goals.iter().map(GoalState::from_spec).collect()
    }

    /// Whether the floor has a hole under (x, z). Pit volumes are holes:
    /// the ground clamp does not apply above them.
    pub fn is_over_pit(&self, x: f64, z: f64) -> bool {
        self.hazards
            .iter()
            .any(|h| h.class == ContactClass::Pit && h.footprint_contains(x, z))
    }

    /// Whether a bridge spans (x, z). Bridges are walkable: they restore
    /// the ground clamp over a pit hole.
    pub fn is_on_walkway(&self, x: f64, z: f64) -> bool {
        self.hazards
            .iter()
            .any(|h| h.class == ContactClass::Bridge && h.footprint_contains(x, z))
    }

    /// Small demo obstacle course: one plain goal, one two-stage goal, a
    /// pit off the direct line, and a bridge strip on the way.
    pub fn obstacle_course() -> Level {
        Level {
            name: "obstacle-course".to_string(),
            spawn_position: Vec3::new(0.0, 0.0, -8.0),
            spawn_yaw_deg: 0.0,
            goals: vec![
                GoalSpec {
                    position: Vec3::new(0.0, 0.0, 0.0),
                    kind: GoalKind::Single,
                },
                GoalSpec {
                    position: Vec3::new(0.0, 0.0, 6.0),
                    kind: GoalKind::TwoStage {
                        offset: Vec3::new(5.0, 0.0, 0.0),
                    },
                },
            ],
            hazards: vec![
                Hazard::new(
                    ContactClass::Pit,
                    Vec3::new(3.0, -6.0, -6.0),
                    Vec3::new(5.0, -0.5, -3.0),
                ),
                // Pit across the lane, spanned by a narrow bridge.
                Hazard::new(
                    ContactClass::Pit,
                    Vec3::new(-2.0, -6.0, 2.0),
                    Vec3::new(2.0, -0.5, 4.0),
                ),
                Hazard::new(
                    ContactClass::Bridge,
                    Vec3::new(-1.0, -0.5, 2.0),
                    Vec3::new(1.0, 1.0, 4.0),
                ),
            ],
            ground_height: 0.0,
            fall_height: -5.0,
            goal_radius: 1.0,
            required_goals: 2,
        }
    }

    /// Ordered checkpoint circuit for the pilot profile.
    pub fn checkpoint_circuit() -> Level {
        Level {
            name: "checkpoint-circuit".to_string(),
            spawn_position: Vec3::new(0.0, 10.0, 0.0),
            spawn_yaw_deg: 0.0,
            goals: vec![
                GoalSpec {
                    position: Vec3::new(0.0, 10.0, 40.0),
                    kind: GoalKind::Single,
                },
                GoalSpec {
                    position: Vec3::new(30.0, 14.0, 70.0),
                    kind: GoalKind::Single,
                },
                GoalSpec {
                    position: Vec3::new(60.0, 10.0, 40.0),
                    kind: GoalKind::Single,
                },
            ],
            hazards: Vec::new(),
            ground_height: 0.0,
            fall_height: 0.5,
            goal_radius: 4.0,
            required_goals: 3,
        }
    }
}

// src/types.rs
//
// Common shared types for the gauntlet episode core.

use serde::{Deserialize, Serialize};

/// Millisecond timestamp on the simulation timebase.
pub type TimestampMs = i64;

/// Sentinel for "this has never happened". Far enough in the past that
/// any cooldown / debounce comparison against it passes.
pub const NEVER_MS: TimestampMs = i64::MIN / 4;

/// Minimal 3D vector used for positions, velocities, and offsets.
///
/// f64 throughout; the episode core never needs more vector machinery
/// than this, so we carry no linear-algebra dependency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vec3) -> f64 {
        (*self - other).length()
    }

    /// Copy with the vertical component zeroed.
    pub fn horizontal(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(&self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            Vec3::new(self.x / len, self.y / len, self.z / len)
        } else {
            Vec3::ZERO
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

/// Heading (yaw, degrees) to a world-space forward unit vector.
///
/// Yaw 0 faces +z; positive yaw turns clockwise when viewed from above.
pub fn forward_from_yaw(yaw_deg: f64) -> Vec3 {
    let r = yaw_deg.to_radians();
    Vec3::new(r.sin(), 0.0, r.cos())
}

/// Right-hand unit vector for a heading (perpendicular to forward, in-plane).
pub fn right_from_yaw(yaw_deg: f64) -> Vec3 {
    forward_from_yaw(yaw_deg + 90.0)
}

/// Forward unit vector for a full attitude (yaw + pitch, degrees).
///
/// Positive pitch is nose-up.
pub fn forward_from_attitude(yaw_deg: f64, pitch_deg: f64) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    let pitch = pitch_deg.to_radians();
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
}

/// Closed classification of things the agent's body can touch.
///
/// Resolved once when a level is built; the per-collision path never
/// re-parses tag strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactClass {
    /// Hole in the course floor. Fatal.
    Pit,
    /// Moving hazard (swinging / patrolling obstacle). Fatal.
    Moving,
    /// Static fatal obstacle.
    Obstacle,
    /// Walkable bridge surface; counts as grounded and pays a small bonus.
    Bridge,
    /// Finish line volume; completes the level on entry.
    Finish,
    /// Non-fatal checkpoint marker volume.
    Checkpoint,
}

impl ContactClass {
    /// Whether touching this class ends the episode.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ContactClass::Pit | ContactClass::Moving | ContactClass::Obstacle
        )
    }

    /// Stable lowercase name (used in logs / telemetry).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactClass::Pit => "pit",
            ContactClass::Moving => "moving",
            ContactClass::Obstacle => "obstacle",
            ContactClass::Bridge => "bridge",
            ContactClass::Finish => "finish",
            ContactClass::Checkpoint => "checkpoint",
        }
    }

    /// Resolve a scene tag at level-build time. Returns None for tags the
    /// episode core does not care about.
    pub fn from_tag(tag: &str) -> Option<ContactClass> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pit" => Some(ContactClass::Pit),
            "moving" => Some(ContactClass::Moving),
            "obstacle" | "spit" => Some(ContactClass::Obstacle),
            "bridge" => Some(ContactClass::Bridge),
            "finish" => Some(ContactClass::Finish),
            "checkpoint" => Some(ContactClass::Checkpoint),
            _ => None,
        }
    }
}

/// Phase of a contact relative to the previous physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    /// Overlap started this step.
    Begin,
    /// Overlap continues from an earlier step.
    Sustain,
    /// Overlap ended this step.
    End,
}

/// One contact report from the body/world collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub class: ContactClass,
    pub phase: ContactPhase,
}

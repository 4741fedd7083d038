// src/spawn.rs
//
// Seeded spawn placement for episode resets.
//
// Sampling is deterministic given a seed: the sampler is reseeded at every
// episode begin, so the same seed always yields the same spawn transform
// regardless of how many episodes ran before.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::types::Vec3;

/// Spawn placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Randomize the spawn point within the box below. When false the
    /// level's fixed spawn transform is used verbatim.
    pub randomize: bool,
    /// Half-extent of the spawn box along x (around the level spawn).
    pub box_half_x: f64,
    /// Half-extent of the spawn box along z.
    pub box_half_z: f64,
    /// Randomize the initial heading over the full circle.
    pub randomize_heading: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            randomize: false,
            box_half_x: 1.0,
            box_half_z: 3.0,
            randomize_heading: true,
        }
    }
}

impl SpawnConfig {
    /// Randomized placement with the default box.
    pub fn randomized() -> Self {
        Self {
            randomize: true,
            ..Self::default()
        }
    }
}

/// One sampled spawn transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSample {
    pub position: Vec3,
    pub yaw_deg: f64,
}

/// Deterministic spawn sampler.
pub struct SpawnSampler {
    cfg: SpawnConfig,
    rng: ChaCha8Rng,
}

impl SpawnSampler {
    pub fn new(cfg: SpawnConfig, seed: u64) -> Self {
        Self {
            cfg,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Reseed for a new episode.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Sample a spawn transform for this level.
    pub fn sample(&mut self, level: &Level) -> SpawnSample {
        if !self.cfg.randomize {
            return SpawnSample {
                position: level.spawn_position,
                yaw_deg: level.spawn_yaw_deg,
            };
        }

        let dx = if self.cfg.box_half_x > 0.0 {
            self.rng.gen_range(-self.cfg.box_half_x..self.cfg.box_half_x)
        } else {
            0.0
        };
        let dz = if self.cfg.box_half_z > 0.0 {
            self.rng.gen_range(-self.cfg.box_half_z..self.cfg.box_half_z)
        } else {
            0.0
        };
        let yaw = if self.cfg.randomize_heading {
            self.rng.gen_range(0.0..360.0)
        } else {
            level.spawn_yaw_deg
        };

        SpawnSample {
            position: level.spawn_position + Vec3::new(dx, 0.0, dz),
            yaw_deg: yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_spawn_ignores_rng() {
        let level = Level::obstacle_course();
        let mut sampler = SpawnSampler::new(SpawnConfig::default(), 7);
        let a = sampler.sample(&level);
        let b = sampler.sample(&level);
        assert_eq!(a, b);
        assert_eq!(a.position, level.spawn_position);
        assert!((a.yaw_deg - level.spawn_yaw_deg).abs() < 1e-12);
    }

    #[test]
    fn randomized_spawn_is_deterministic_per_seed() {
        let level = Level::obstacle_course();
        let mut s1 = SpawnSampler::new(SpawnConfig::randomized(), 42);
        let mut s2 = SpawnSampler::new(SpawnConfig::randomized(), 42);
        assert_eq!(s1.sample(&level), s2.sample(&level));

        s1.reseed(42);
        let again = s1.sample(&level);
        s2.reseed(42);
        assert_eq!(again, s2.sample(&level));
    }

    #[test]
    fn randomized_spawn_stays_inside_box() {
        let level = Level::obstacle_course();
        let cfg = SpawnConfig::randomized();
        let mut sampler = SpawnSampler::new(cfg.clone(), 9);
        for _ in 0..50 {
            let s = sampler.sample(&level);
            assert!((s.position.x - level.spawn_position.x).abs() <= cfg.box_half_x);
            assert!((s.position.z - level.spawn_position.z).abs() <= cfg.box_half_z);
            assert!((0.0..360.0).contains(&s.yaw_deg));
        }
    }
}

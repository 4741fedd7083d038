// src/telemetry.rs
//
// Per-tick telemetry for episode runs.
//
// Telemetry must be enough to reconstruct a run offline:
// - obs_version, policy_version, config_version
// - the action actually applied
// - per-tick reward events (the full tagged breakdown)
// - episode boundary markers (start/end, termination cause)
//
// Records are JSONL: one serde_json object per line, with a "type" field
// distinguishing boundary markers from tick records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::motion::Action;
use crate::observation::{Observation, OBS_VERSION};
use crate::reward::RewardEvent;
use crate::state::TerminationCause;
use crate::types::TimestampMs;

/// Environment variable pointing telemetry at a JSONL file.
pub const TELEMETRY_PATH_ENV: &str = "GAUNTLET_TELEMETRY_PATH";

/// Per-tick record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    // ----- Metadata -----
    pub obs_version: u32,
    pub policy_version: String,
    pub config_version: String,
    pub episode_id: u64,
    pub tick_index: u64,
    pub timestamp_ms: TimestampMs,

    // ----- Observation summary -----
    pub position_x: f64,
    pub position_z: f64,
    pub goal_distance: f64,
    pub has_goal: bool,
    pub grounded: bool,

    // ----- Action and reward -----
    pub action: Option<Action>,
    /// Scalar reward this tick.
    pub reward: f64,
    /// Applied event breakdown.
    pub events: Vec<RewardEvent>,

    // ----- Episode scalars -----
    pub cumulative_reward: f64,
    pub stuck_counter: u32,
    pub limit_reached: bool,
}

impl TickRecord {
    pub fn new(
        obs: &Observation,
        action: Option<&Action>,
        policy_version: &str,
        config_version: &str,
        events: &[RewardEvent],
        limit_reached: bool,
    ) -> Self {
        Self {
            obs_version: OBS_VERSION,
            policy_version: policy_version.to_string(),
            config_version: config_version.to_string(),
            episode_id: obs.episode_id,
            tick_index: obs.tick_index,
            timestamp_ms: obs.timestamp_ms,
            position_x: obs.position_x,
            position_z: obs.position_z,
            goal_distance: obs.goal_distance,
            has_goal: obs.has_goal,
            grounded: obs.grounded,
            action: action.copied(),
            reward: events.iter().map(|e| e.delta).sum(),
            events: events.to_vec(),
            cumulative_reward: obs.cumulative_reward,
            stuck_counter: obs.stuck_counter,
            limit_reached,
        }
    }
}

#[derive(Debug, Serialize)]
struct EpisodeStartMarker<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    episode_id: u64,
    seed: u64,
    base_ms: TimestampMs,
}

#[derive(Debug, Serialize)]
struct EpisodeEndMarker<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    episode_id: u64,
    seed: u64,
    end_ms: TimestampMs,
    termination: Option<&'a str>,
    cumulative_reward: f64,
    total_ticks: u64,
}

#[derive(Debug, Serialize)]
struct TickMarker<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(flatten)]
    record: &'a TickRecord,
}

/// JSONL telemetry writer. Disabled by default; writes only when given a
/// path (directly or via GAUNTLET_TELEMETRY_PATH).
pub struct EpisodeTelemetry {
    writer: Option<BufWriter<File>>,
}

impl Default for EpisodeTelemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

impl EpisodeTelemetry {
    /// Telemetry that drops everything.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Write JSONL records to `path`.
    pub fn to_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Resolve from the environment: enabled iff GAUNTLET_TELEMETRY_PATH
    /// is set and creatable; warns and disables otherwise.
    pub fn from_env() -> Self {
        match std::env::var(TELEMETRY_PATH_ENV) {
            Ok(path) if !path.is_empty() => match Self::to_file(&path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("[telemetry] WARN: cannot open {path:?}: {e}; disabling");
                    Self::disabled()
                }
            },
            _ => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn log_episode_start(&mut self, episode_id: u64, seed: u64, base_ms: TimestampMs) {
        let marker = EpisodeStartMarker {
            kind: "episode_start",
            episode_id,
            seed,
            base_ms,
        };
        self.write_json(&marker);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_episode_end(
        &mut self,
        episode_id: u64,
        seed: u64,
        end_ms: TimestampMs,
        termination: Option<TerminationCause>,
        cumulative_reward: f64,
        total_ticks: u64,
    ) {
        let marker = EpisodeEndMarker {
            kind: "episode_end",
            episode_id,
            seed,
            end_ms,
            termination: termination.map(|c| c.as_str()),
            cumulative_reward,
            total_ticks,
        };
        self.write_json(&marker);
    }

    pub fn log_tick(&mut self, record: &TickRecord) {
        let marker = TickMarker {
            kind: "tick",
            record,
        };
        self.write_json(&marker);
    }

    pub fn flush(&mut self) {
        if let Some(w) = &mut self.writer {
            let _ = w.flush();
        }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) {
        let Some(w) = &mut self.writer else {
            return;
        };
        match serde_json::to_string(value) {
            Ok(line) => {
                let _ = writeln!(w, "{line}");
            }
            Err(e) => eprintln!("[telemetry] WARN: serialization failed: {e}"),
        }
    }
}

impl Drop for EpisodeTelemetry {
    fn drop(&mut self) {
        self.flush();
    }
}

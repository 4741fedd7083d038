// src/logging.rs
//
// Event sinks for the episode runner.
// - EventSink: trait used by the runner
// - NoopSink:  discards all events
// - FileSink:  writes one JSON line per tick for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::Config;
use crate::reward::RewardEvent;
use crate::state::AgentState;

/// Abstract sink for per-tick run logging.
pub trait EventSink {
    fn log_tick(&mut self, tick: u64, cfg: &Config, state: &AgentState, events: &[RewardEvent]);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_tick(&mut self, _tick: u64, _cfg: &Config, _state: &AgentState, _events: &[RewardEvent]) {
        // intentionally no-op
    }
}

/// JSONL file sink.
///
/// Each tick is written as a single JSON object on its own line. The
/// payload is kept small and the JSON is encoded manually so the sink
/// stays cheap on the hot path.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: &str) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn log_tick(&mut self, tick: u64, _cfg: &Config, state: &AgentState, events: &[RewardEvent]) {
        let reward: f64 = events.iter().map(|e| e.delta).sum();
        let line = format!(
            "{{\
                \"tick\":{},\
                \"x\":{:.4},\
                \"y\":{:.4},\
                \"z\":{:.4},\
                \"grounded\":{},\
                \"reward\":{:.6},\
                \"cumulative_reward\":{:.6},\
                \"stuck_counter\":{}\
            }}",
            tick,
            state.position.x,
            state.position.y,
            state.position.z,
            state.grounded,
            reward,
            state.cumulative_reward,
            state.stuck_counter,
        );
        let _ = writeln!(self.writer, "{line}");
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::RewardReason;

    #[test]
    fn file_sink_writes_one_line_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticks.jsonl");

        let cfg = Config::default();
        let state = AgentState::new();
        let events = [RewardEvent::new(RewardReason::StuckPenalty, -0.2)];

        {
            let mut sink = FileSink::create(path.to_str().unwrap()).unwrap();
            sink.log_tick(0, &cfg, &state, &events);
            sink.log_tick(1, &cfg, &state, &[]);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["tick"], 0);
        assert!((first["reward"].as_f64().unwrap() + 0.2).abs() < 1e-9);
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let cfg = Config::default();
        let state = AgentState::new();
        let mut sink = NoopSink;
        sink.log_tick(0, &cfg, &state, &[]);
    }
}

//! JSON frame export for offline inspection and replay.

use crate::error::SimError;
use hummingbird_env::{FlowerVisual, RenderSink, ZoneId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    pub tick: u64,

    pub agents: Vec<AgentFrame>,

    pub flowers: Vec<FlowerFrame>,

    /// Flower state changes and other notable events since the last frame
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<SimEvent>,
}

/// Agent state at frame time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFrame {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub nectar_obtained: f32,
    pub cumulative_reward: f32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_zone: Option<u32>,
    pub frozen: bool,
}

/// Flower state at frame time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerFrame {
    pub zone: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub nectar: f32,
    pub active: bool,
}

/// Simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Some("warn".to_string()),
        }
    }
}

/// Render sink that counts flower state updates and, when recording,
/// keeps them as events for the next exported frame.
#[derive(Debug, Default)]
pub struct FlowerEventLog {
    recording: bool,
    pending: Vec<SimEvent>,
    pub full_updates: u64,
    pub empty_updates: u64,
}

impl FlowerEventLog {
    pub fn new(recording: bool) -> Self {
        Self {
            recording,
            ..Self::default()
        }
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        if !recording {
            self.pending.clear();
        }
    }

    pub fn push(&mut self, event: SimEvent) {
        if self.recording {
            self.pending.push(event);
        }
    }

    /// Takes the events gathered since the last call.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl RenderSink for FlowerEventLog {
    fn flower_visual_changed(&mut self, zone: ZoneId, visual: FlowerVisual) {
        match visual {
            FlowerVisual::Full => self.full_updates += 1,
            FlowerVisual::Empty => {
                self.empty_updates += 1;
                self.push(SimEvent::info(format!("{} empty", zone)));
            }
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Nectar collected by all agents
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_nectar: Option<f64>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            total_nectar: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, total_nectar: Option<f64>) {
        self.passed = passed;
        self.total_nectar = total_nectar;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

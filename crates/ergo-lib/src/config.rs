use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Full study description. Everything the generator and analyzer need is
/// carried here explicitly; there is no ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    pub name: String,
    #[serde(default = "default_participants")]
    pub participants: u32,
    #[serde(default = "default_sessions")]
    pub sessions: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub durations: Durations,
    #[serde(default)]
    pub noise: NoiseParams,
    #[serde(default)]
    pub profile: ProfileParams,
    #[serde(default = "default_stage_width")]
    pub stage_width_s: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Durations {
    pub rest_s: u32,
    pub exercise_s: u32,
    pub recovery_s: u32,
}

impl Durations {
    /// Fixed length of every session series, in samples (one per second).
    pub fn total_s(&self) -> u32 {
        self.rest_s + self.exercise_s + self.recovery_s
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            rest_s: 5 * 60,
            exercise_s: 30 * 60,
            recovery_s: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Per-sample Gaussian sd around each trajectory point (bpm).
    pub sample_sd: f64,
    /// Sd of the per-second training-effect perturbation (bpm).
    pub training_sd: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            sample_sd: 10.0,
            training_sd: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileParams {
    pub resting_mean: f64,
    pub resting_sd: f64,
    pub submax_mean: f64,
    pub submax_sd: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            resting_mean: 60.0,
            resting_sd: 10.0,
            submax_mean: 150.0,
            submax_sd: 15.0,
        }
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            name: "training-study".into(),
            participants: default_participants(),
            sessions: default_sessions(),
            seed: None,
            durations: Durations::default(),
            noise: NoiseParams::default(),
            profile: ProfileParams::default(),
            stage_width_s: default_stage_width(),
        }
    }
}

fn default_participants() -> u32 {
    10
}

fn default_sessions() -> u32 {
    5
}

fn default_stage_width() -> u32 {
    180
}

pub fn read_config(path: &Path) -> Result<StudyConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: StudyConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

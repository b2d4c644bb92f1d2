use serde::{Deserialize, Serialize};

/// Per-second heart-rate samples for one (participant, session) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSeries {
    /// 1-based participant identifier
    pub participant: u32,
    /// 1-based session identifier
    pub session: u32,
    /// One sample per elapsed second, beats/min
    pub samples: Vec<f64>,
}

impl SessionSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }
}

/// Resting and submaximal heart rate drawn once per participant; every
/// trajectory for that participant is parametrized by these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub resting_hr: f64,
    pub submax_hr: f64,
}

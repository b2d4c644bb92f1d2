use thiserror::Error;

/// Typed failures of the study pipelines. Everything else travels as
/// `anyhow::Error` with context attached at the seam that failed.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error(
        "P{participant}_S{session} has {actual} samples, expected {expected}"
    )]
    LengthMismatch {
        participant: u32,
        session: u32,
        expected: usize,
        actual: usize,
    },

    #[error("exercise window of {window_s}s is not divisible by stage width {stage_width_s}s")]
    StageDivisibility { window_s: u32, stage_width_s: u32 },

    #[error("remote store failed on {name}: {source}")]
    RemoteIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session file {name}: {reason}")]
    MalformedSession { name: String, reason: String },
}

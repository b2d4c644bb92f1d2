use crate::error::StudyError;
use crate::signal::SessionSeries;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

/// Per-session files are `P<participant>_S<session>.csv`, identifiers
/// 1-based with no zero padding.
pub fn session_file_name(participant: u32, session: u32) -> String {
    format!("P{participant}_S{session}.csv")
}

/// Inverse of [`session_file_name`].
pub fn parse_session_file_name(name: &str) -> Result<(u32, u32)> {
    let malformed = |reason: &str| StudyError::MalformedSession {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let stem = name
        .strip_suffix(".csv")
        .ok_or_else(|| malformed("missing .csv suffix"))?;
    let (p, s) = stem
        .split_once('_')
        .ok_or_else(|| malformed("expected P<id>_S<id>"))?;
    let participant = p
        .strip_prefix('P')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| malformed("bad participant id"))?;
    let session = s
        .strip_prefix('S')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| malformed("bad session id"))?;
    Ok((participant, session))
}

/// Encode one session as the two-column table: an unnamed zero-based
/// elapsed-seconds index column and `heart_rate`, one header row.
pub fn encode_session(series: &SessionSeries) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["", "heart_rate"])?;
    for (elapsed, value) in series.samples.iter().enumerate() {
        writer.write_record([elapsed.to_string(), value.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing session csv: {e}"))
}

/// Decode a fetched session file. The index column must count up from
/// zero without gaps; anything else is a malformed file, reported before
/// the dataset-level length validation ever runs.
pub fn decode_session(name: &str, bytes: &[u8]) -> Result<SessionSeries> {
    let (participant, session) = parse_session_file_name(name)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {name} row {}", row + 1))?;
        if record.len() != 2 {
            return Err(StudyError::MalformedSession {
                name: name.to_string(),
                reason: format!("row {} has {} fields, expected 2", row + 1, record.len()),
            }
            .into());
        }
        let elapsed: usize = record[0]
            .parse()
            .with_context(|| format!("{name}: bad index at row {}", row + 1))?;
        if elapsed != row {
            return Err(StudyError::MalformedSession {
                name: name.to_string(),
                reason: format!("index {elapsed} at row {row}, expected {row}"),
            }
            .into());
        }
        let value: f64 = record[1]
            .parse()
            .with_context(|| format!("{name}: bad heart_rate at row {}", row + 1))?;
        samples.push(value);
    }
    if samples.is_empty() {
        return Err(StudyError::MalformedSession {
            name: name.to_string(),
            reason: "no samples".to_string(),
        }
        .into());
    }
    Ok(SessionSeries {
        participant,
        session,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        assert_eq!(session_file_name(3, 12), "P3_S12.csv");
        assert_eq!(parse_session_file_name("P3_S12.csv").unwrap(), (3, 12));
        assert!(parse_session_file_name("P3-S12.csv").is_err());
        assert!(parse_session_file_name("P3_S12.txt").is_err());
    }

    #[test]
    fn encode_then_decode_preserves_samples_exactly() {
        let series = SessionSeries {
            participant: 1,
            session: 2,
            samples: vec![61.25, 63.0, 58.7071067811865, 90.125],
        };
        let bytes = encode_session(&series).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(",heart_rate\n"));
        let back = decode_session("P1_S2.csv", &bytes).unwrap();
        assert_eq!(back.participant, 1);
        assert_eq!(back.session, 2);
        assert_eq!(back.samples, series.samples);
    }

    #[test]
    fn gapped_index_is_rejected() {
        let bytes = b",heart_rate\n0,60.0\n2,61.0\n".to_vec();
        let err = decode_session("P1_S1.csv", &bytes).unwrap_err();
        let study = err.downcast_ref::<StudyError>().unwrap();
        assert!(matches!(study, StudyError::MalformedSession { .. }));
    }
}

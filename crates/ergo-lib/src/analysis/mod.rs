use crate::config::Durations;
use crate::error::StudyError;
use crate::io::session::decode_session;
use crate::signal::SessionSeries;
use crate::store::FileStore;
use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use serde::Serialize;

/// One row of the stage-mean output.
#[derive(Debug, Clone, Serialize)]
pub struct StageMeanRow {
    pub participant: u32,
    pub session: u32,
    pub stage: u32,
    pub mean_hr: f64,
}

/// List and fetch every session file from the store.
pub fn fetch_dataset(store: &dyn FileStore) -> Result<Vec<SessionSeries>> {
    let names = store.list_files()?;
    if names.is_empty() {
        anyhow::bail!("store contains no session files");
    }
    let mut dataset = Vec::with_capacity(names.len());
    for name in names {
        let bytes = store.download(&name)?;
        let series = decode_session(&name, &bytes).with_context(|| format!("decoding {name}"))?;
        dataset.push(series);
    }
    info!("fetched {} session files", dataset.len());
    Ok(dataset)
}

/// Reshape the dataset into one row per (participant, session,
/// elapsed_seconds) with its heart_rate value.
pub fn long_table(dataset: &[SessionSeries]) -> Result<DataFrame> {
    let rows: usize = dataset.iter().map(|s| s.len()).sum();
    let mut participants = Vec::with_capacity(rows);
    let mut sessions = Vec::with_capacity(rows);
    let mut elapsed = Vec::with_capacity(rows);
    let mut heart_rate = Vec::with_capacity(rows);
    for series in dataset {
        for (second, &value) in series.samples.iter().enumerate() {
            participants.push(series.participant);
            sessions.push(series.session);
            elapsed.push(second as u32);
            heart_rate.push(value);
        }
    }
    let df = df!(
        "participant" => participants,
        "session" => sessions,
        "elapsed_seconds" => elapsed,
        "heart_rate" => heart_rate,
    )?;
    Ok(df)
}

/// Enforce the long-table invariant: within every (participant, session)
/// group, `elapsed_seconds` is the exact contiguous range [0, expected-1].
/// Violations halt the pipeline instead of flowing into aggregation.
pub fn validate_long_table(df: &DataFrame, expected: usize) -> Result<()> {
    let stats = df
        .clone()
        .lazy()
        .group_by([col("participant"), col("session")])
        .agg([
            col("elapsed_seconds").count().alias("n"),
            col("elapsed_seconds").n_unique().alias("n_unique"),
            col("elapsed_seconds").min().alias("min"),
            col("elapsed_seconds").max().alias("max"),
        ])
        .sort(["participant", "session"], SortMultipleOptions::default())
        .collect()?;

    let participants = stats.column("participant")?.u32()?;
    let sessions = stats.column("session")?.u32()?;
    let counts = stats.column("n")?.u32()?;
    let uniques = stats.column("n_unique")?.u32()?;
    let mins = stats.column("min")?.u32()?;
    let maxs = stats.column("max")?.u32()?;
    for i in 0..stats.height() {
        let actual = counts.get(i).unwrap_or(0) as usize;
        let contiguous = uniques.get(i).unwrap_or(0) as usize == actual
            && mins.get(i) == Some(0)
            && maxs.get(i).map(|m| m as usize) == Some(actual.saturating_sub(1));
        if actual != expected || !contiguous {
            return Err(StudyError::LengthMismatch {
                participant: participants.get(i).unwrap_or(0),
                session: sessions.get(i).unwrap_or(0),
                expected,
                actual,
            }
            .into());
        }
    }
    Ok(())
}

/// Trim to the exercise window `(rest_s, rest_s + exercise_s]`, partition
/// each group into consecutive fixed-width stages, and collapse each stage
/// to its mean heart rate. The stage label comes from the computed group
/// index, so the divisibility precondition is checked up front rather than
/// silently dropping a partial final stage.
pub fn stage_means(df: &DataFrame, durations: &Durations, stage_width_s: u32) -> Result<DataFrame> {
    let window = durations.exercise_s;
    if stage_width_s == 0 || window % stage_width_s != 0 {
        return Err(StudyError::StageDivisibility {
            window_s: window,
            stage_width_s,
        }
        .into());
    }
    let lower = durations.rest_s;
    let upper = durations.rest_s + window;
    let stages = df
        .clone()
        .lazy()
        .filter(
            col("elapsed_seconds")
                .gt(lit(lower))
                .and(col("elapsed_seconds").lt_eq(lit(upper))),
        )
        .with_column(
            ((col("elapsed_seconds") - lit(lower + 1)).floor_div(lit(stage_width_s)) + lit(1u32))
                .cast(DataType::UInt32)
                .alias("stage"),
        )
        .group_by([col("participant"), col("session"), col("stage")])
        .agg([col("heart_rate").mean().alias("mean_hr")])
        .sort(
            ["participant", "session", "stage"],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(stages)
}

/// Number of stages the window splits into. Callers must have passed the
/// divisibility check in [`stage_means`] first.
pub fn stage_count(durations: &Durations, stage_width_s: u32) -> u32 {
    durations.exercise_s / stage_width_s
}

/// Keep only the first and last stage of every (participant, session)
/// group for the before/after comparison.
pub fn first_last_stages(stages: &DataFrame, n_stages: u32) -> Result<DataFrame> {
    let out = stages
        .clone()
        .lazy()
        .filter(
            col("stage")
                .eq(lit(1u32))
                .or(col("stage").eq(lit(n_stages))),
        )
        .collect()?;
    Ok(out)
}

/// Pull a stage-mean frame back into typed rows (for JSON output).
pub fn stage_rows(df: &DataFrame) -> Result<Vec<StageMeanRow>> {
    let participants = df.column("participant")?.u32()?;
    let sessions = df.column("session")?.u32()?;
    let stages = df.column("stage")?.u32()?;
    let means = df.column("mean_hr")?.f64()?;
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        rows.push(StageMeanRow {
            participant: participants.get(i).unwrap_or(0),
            session: sessions.get(i).unwrap_or(0),
            stage: stages.get(i).unwrap_or(0),
            mean_hr: means.get(i).unwrap_or(f64::NAN),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::session::{encode_session, session_file_name};
    use crate::store::LocalDirStore;
    use tempfile::tempdir;

    // Small study shape: 80-second sessions, 60s exercise window, 6s
    // stages. Samples equal their elapsed second so stage means are easy
    // to compute by hand.
    fn durations() -> Durations {
        Durations {
            rest_s: 10,
            exercise_s: 60,
            recovery_s: 10,
        }
    }

    fn ramp_dataset() -> Vec<SessionSeries> {
        let mut dataset = Vec::new();
        for participant in 1..=2u32 {
            for session in 1..=2u32 {
                dataset.push(SessionSeries {
                    participant,
                    session,
                    samples: (0..80).map(|i| i as f64).collect(),
                });
            }
        }
        dataset
    }

    #[test]
    fn long_table_passes_validation() {
        let df = long_table(&ramp_dataset()).unwrap();
        assert_eq!(df.height(), 4 * 80);
        validate_long_table(&df, 80).unwrap();
    }

    #[test]
    fn truncated_session_fails_with_length_mismatch() {
        let mut dataset = ramp_dataset();
        dataset[2].samples.pop();
        let df = long_table(&dataset).unwrap();
        let err = validate_long_table(&df, 80).unwrap_err();
        match err.downcast_ref::<StudyError>().unwrap() {
            StudyError::LengthMismatch {
                participant,
                session,
                expected,
                actual,
            } => {
                assert_eq!((*participant, *session), (2, 1));
                assert_eq!(*expected, 80);
                assert_eq!(*actual, 79);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn full_length_session_short_by_one_second_is_caught() {
        let dataset = vec![SessionSeries {
            participant: 1,
            session: 1,
            samples: vec![100.0; 2399],
        }];
        let df = long_table(&dataset).unwrap();
        let err = validate_long_table(&df, 2400).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StudyError>().unwrap(),
            StudyError::LengthMismatch {
                expected: 2400,
                actual: 2399,
                ..
            }
        ));
    }

    #[test]
    fn duplicated_second_fails_validation() {
        let df = df!(
            "participant" => [1u32, 1, 1],
            "session" => [1u32, 1, 1],
            "elapsed_seconds" => [0u32, 1, 1],
            "heart_rate" => [60.0, 61.0, 62.0],
        )
        .unwrap();
        assert!(validate_long_table(&df, 3).is_err());
    }

    #[test]
    fn stage_means_of_a_ramp_are_exact() {
        let df = long_table(&ramp_dataset()).unwrap();
        let stages = stage_means(&df, &durations(), 6).unwrap();
        // 10 stages per group, 4 groups
        assert_eq!(stages.height(), 40);
        let rows = stage_rows(&stages).unwrap();
        let first = rows.iter().find(|r| r.stage == 1).unwrap();
        // window is seconds 11..=70; stage 1 covers 11..=16
        assert!((first.mean_hr - 13.5).abs() < 1e-12);
        let last = rows.iter().find(|r| r.stage == 10).unwrap();
        assert!((last.mean_hr - 67.5).abs() < 1e-12);
    }

    #[test]
    fn first_and_last_selection_keeps_two_rows_per_group() {
        let df = long_table(&ramp_dataset()).unwrap();
        let stages = stage_means(&df, &durations(), 6).unwrap();
        let picked = first_last_stages(&stages, stage_count(&durations(), 6)).unwrap();
        assert_eq!(picked.height(), 2 * 4);
        for row in stage_rows(&picked).unwrap() {
            assert!(row.stage == 1 || row.stage == 10);
        }
    }

    #[test]
    fn indivisible_stage_width_is_a_hard_error() {
        let df = long_table(&ramp_dataset()).unwrap();
        let err = stage_means(&df, &durations(), 7).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StudyError>().unwrap(),
            StudyError::StageDivisibility { .. }
        ));
        // default study shape: 1800s window, 170s stages do not divide it
        let full = Durations::default();
        let err = stage_means(&df, &full, 170).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StudyError>().unwrap(),
            StudyError::StageDivisibility { window_s: 1800, stage_width_s: 170 }
        ));
    }

    #[test]
    fn stage_rows_serialize_for_the_cli_summary() {
        let row = StageMeanRow {
            participant: 2,
            session: 3,
            stage: 10,
            mean_hr: 131.5,
        };
        let js = serde_json::to_string(&row).unwrap();
        assert_eq!(
            js,
            "{\"participant\":2,\"session\":3,\"stage\":10,\"mean_hr\":131.5}"
        );
    }

    #[test]
    fn store_round_trip_reproduces_per_second_values() {
        let dir = tempdir().unwrap();
        let store = LocalDirStore::create(dir.path().join("study")).unwrap();
        let dataset = ramp_dataset();
        for series in &dataset {
            let name = session_file_name(series.participant, series.session);
            store.upload(&name, &encode_session(series).unwrap()).unwrap();
        }
        let fetched = fetch_dataset(&store).unwrap();
        assert_eq!(fetched.len(), dataset.len());
        for series in &dataset {
            let back = fetched
                .iter()
                .find(|f| f.participant == series.participant && f.session == series.session)
                .unwrap();
            assert_eq!(back.samples, series.samples);
        }
    }
}

pub mod trajectory;

use crate::config::{ProfileParams, StudyConfig};
use crate::io::session::{encode_session, session_file_name};
use crate::resample::fourier_resample;
use crate::signal::{ParticipantProfile, SessionSeries};
use crate::store::FileStore;
use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Draw the per-participant resting/submaximal heart rates. Profiles are
/// drawn before any of that participant's sessions so a fixed seed gives
/// one reproducible random-number stream for the whole study.
pub fn draw_profile(params: &ProfileParams, rng: &mut impl Rng) -> Result<ParticipantProfile> {
    let resting = Normal::new(params.resting_mean, params.resting_sd)?;
    let submax = Normal::new(params.submax_mean, params.submax_sd)?;
    Ok(ParticipantProfile {
        resting_hr: resting.sample(rng),
        submax_hr: submax.sample(rng),
    })
}

/// One Gaussian draw per trajectory point, trajectory value as the mean.
pub fn noisy_samples(trend: &[f64], sample_sd: f64, rng: &mut impl Rng) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(trend.len());
    for &mean in trend {
        out.push(Normal::new(mean, sample_sd)?.sample(rng));
    }
    Ok(out)
}

/// Simulated fitness improvement across repeated sessions: for 1-based
/// session index > 1, every sample gets an independent N(-index, sd)
/// perturbation. Session 1 is left untouched.
pub fn apply_training_effect(
    samples: &mut [f64],
    session: u32,
    training_sd: f64,
    rng: &mut impl Rng,
) -> Result<()> {
    if session <= 1 {
        return Ok(());
    }
    let shift = Normal::new(-(session as f64), training_sd)?;
    for value in samples.iter_mut() {
        *value += shift.sample(rng);
    }
    Ok(())
}

/// Trajectory -> noise -> fixed-length resample -> training adjustment.
pub fn generate_session(
    profile: &ParticipantProfile,
    cfg: &StudyConfig,
    session: u32,
    rng: &mut impl Rng,
) -> Result<Vec<f64>> {
    let trend = trajectory::build_trajectory(profile.resting_hr, profile.submax_hr, rng);
    let noisy = noisy_samples(&trend, cfg.noise.sample_sd, rng)?;
    let mut samples = fourier_resample(&noisy, cfg.durations.total_s() as usize)?;
    apply_training_effect(&mut samples, session, cfg.noise.training_sd, rng)?;
    Ok(samples)
}

/// Generate the full participants x sessions dataset in participant-major
/// order, seeded from the config (seed 0 when unset).
pub fn generate_study(cfg: &StudyConfig) -> Result<Vec<SessionSeries>> {
    let mut rng = StdRng::seed_from_u64(cfg.seed.unwrap_or(0));
    generate_study_with_rng(cfg, &mut rng)
}

pub fn generate_study_with_rng(cfg: &StudyConfig, rng: &mut StdRng) -> Result<Vec<SessionSeries>> {
    let mut dataset = Vec::with_capacity((cfg.participants * cfg.sessions) as usize);
    for participant in 1..=cfg.participants {
        let profile = draw_profile(&cfg.profile, rng)?;
        debug!(
            "participant {participant}: resting {:.1} bpm, submax {:.1} bpm",
            profile.resting_hr, profile.submax_hr
        );
        for session in 1..=cfg.sessions {
            let samples = generate_session(&profile, cfg, session, rng)?;
            dataset.push(SessionSeries {
                participant,
                session,
                samples,
            });
        }
    }
    info!(
        "generated {} sessions for {} participants",
        dataset.len(),
        cfg.participants
    );
    Ok(dataset)
}

/// Push every session file to the store. No dedup, no resume: the first
/// failing upload aborts the batch.
pub fn sync_study(store: &dyn FileStore, dataset: &[SessionSeries]) -> Result<usize> {
    for series in dataset {
        let name = session_file_name(series.participant, series.session);
        let bytes = encode_session(series)?;
        store.upload(&name, &bytes)?;
        debug!("uploaded {name} ({} samples)", series.len());
    }
    Ok(dataset.len())
}

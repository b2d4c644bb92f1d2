use rand::Rng;

/// Build one heart-rate trend for a session: rest, ramp-up, a perturbed
/// near-peak plateau, a brief dip, recovery to peak, then decline. The
/// trend is a concatenation of ten jittered integer ranges; every jitter
/// is an independent draw, so the length varies from call to call.
///
/// Segment boundaries are deliberately left unsmoothed and duplicates are
/// kept, which injects mid-trace roughness into the trend itself.
pub fn build_trajectory(resting_hr: f64, submax_hr: f64, rng: &mut impl Rng) -> Vec<f64> {
    let r = resting_hr.round() as i64;
    let s = submax_hr.round() as i64;
    let mut jit = |lo: i64, hi: i64| rng.gen_range(lo..=hi);

    let mut points = Vec::new();
    // resting wander
    span(r, r + jit(2, 8), &mut points);
    span(r, r + jit(5, 15), &mut points);
    // ramp toward submax
    span(r, s - jit(5, 15), &mut points);
    // near-peak plateau with a brief dip
    span(s - jit(5, 15), s - 20, &mut points);
    span(s - jit(5, 15) - jit(5, 15), s - jit(5, 15), &mut points);
    span(s - jit(5, 15), s, &mut points);
    span(s, s - jit(2, 8), &mut points);
    span(s, s - jit(2, 8), &mut points);
    // decline into recovery
    span(s, s - jit(10, 20), &mut points);
    span(s - jit(10, 30), s - jit(30, 50), &mut points);
    points
}

/// Emit every integer from `start` to `stop` inclusive, descending when
/// `stop < start` and a single value when the endpoints coincide.
fn span(start: i64, stop: i64, out: &mut Vec<f64>) {
    if start <= stop {
        out.extend((start..=stop).map(|v| v as f64));
    } else {
        out.extend((stop..=start).rev().map(|v| v as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn span_handles_both_directions_and_single_points() {
        let mut out = Vec::new();
        span(3, 6, &mut out);
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);
        out.clear();
        span(6, 3, &mut out);
        assert_eq!(out, vec![6.0, 5.0, 4.0, 3.0]);
        out.clear();
        span(5, 5, &mut out);
        assert_eq!(out, vec![5.0]);
    }

    #[test]
    fn trajectory_starts_at_rest_and_reaches_submax() {
        let mut rng = StdRng::seed_from_u64(7);
        let traj = build_trajectory(60.0, 150.0, &mut rng);
        assert_eq!(traj[0], 60.0);
        assert!(traj.iter().any(|&v| v == 150.0), "plateau should touch submax");
        // final decline segment ends somewhere in submax - [30, 50]
        let last = *traj.last().unwrap();
        assert!((100.0..=120.0).contains(&last), "ended at {last}");
    }

    #[test]
    fn trajectory_length_varies_between_calls() {
        let mut rng = StdRng::seed_from_u64(11);
        let lengths: Vec<usize> = (0..8)
            .map(|_| build_trajectory(60.0, 150.0, &mut rng).len())
            .collect();
        assert!(lengths.windows(2).any(|w| w[0] != w[1]), "{lengths:?}");
    }

    #[test]
    fn trajectory_is_reproducible_from_a_seed() {
        let a = build_trajectory(58.0, 147.0, &mut StdRng::seed_from_u64(42));
        let b = build_trajectory(58.0, 147.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}

use anyhow::{bail, Result};
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

/// Band-limited resampling to an exact target length.
///
/// Works in the Fourier domain: forward real FFT of the source, spectrum
/// truncated or zero-padded to the target bin count, inverse real FFT at
/// the target length, scaled by 1/L. The ratio target/source may be any
/// rational number; the output always has exactly `target_len` samples and
/// the low-frequency trend survives the rate change.
pub fn fourier_resample(samples: &[f64], target_len: usize) -> Result<Vec<f64>> {
    let source_len = samples.len();
    if source_len == 0 {
        bail!("cannot resample an empty series");
    }
    if target_len == 0 {
        bail!("resample target length must be positive");
    }
    if source_len == target_len {
        return Ok(samples.to_vec());
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(source_len);
    let mut input = samples.to_vec();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut input, &mut spectrum)?;

    let c2r = planner.plan_fft_inverse(target_len);
    let mut resized = c2r.make_input_vec();
    let keep = spectrum.len().min(resized.len());
    resized[..keep].copy_from_slice(&spectrum[..keep]);
    for bin in resized.iter_mut().skip(keep) {
        *bin = Complex::new(0.0, 0.0);
    }
    // DC and (for even lengths) Nyquist bins of a real spectrum carry no phase.
    resized[0].im = 0.0;
    if target_len % 2 == 0 {
        let nyquist = resized.len() - 1;
        resized[nyquist].im = 0.0;
    }

    let mut output = c2r.make_output_vec();
    c2r.process(&mut resized, &mut output)?;
    let scale = 1.0 / source_len as f64;
    for value in output.iter_mut() {
        *value *= scale;
    }
    Ok(output)
}

//! Blood time-activity-curve resampling onto scanner frame times.
//!
//! Arterial samples arrive on their own clock; kinetic modeling needs the
//! curve evaluated at the PET frame times. Early samples (up to a threshold)
//! are noisy and sparse, so that segment is replaced by a least-squares line
//! through the origin region; later frame times are linearly interpolated
//! between neighboring samples.

use std::path::Path;

use tracing::info;

use pet_bids::{frame_times_from_sidecar, load_tsv_simple, save_tsv_simple};
use pet_core::CallArgs;

use super::require_str;
use crate::errors::OpError;

/// One measured blood sample: time in seconds and activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodSample {
    pub time: f64,
    pub activity: f64,
}

fn linear_fit(samples: &[BloodSample]) -> (f64, f64) {
    let n = samples.len() as f64;
    if samples.len() < 2 {
        return (0.0, samples.first().map(|s| s.activity).unwrap_or(0.0));
    }
    let mean_t = samples.iter().map(|s| s.time).sum::<f64>() / n;
    let mean_a = samples.iter().map(|s| s.activity).sum::<f64>() / n;
    let sxx: f64 = samples.iter().map(|s| (s.time - mean_t).powi(2)).sum();
    let sxy: f64 = samples.iter().map(|s| (s.time - mean_t) * (s.activity - mean_a)).sum();
    if sxx == 0.0 {
        return (0.0, mean_a);
    }
    let slope = sxy / sxx;
    (slope, mean_a - slope * mean_t)
}

fn interpolate(samples: &[BloodSample], t: f64) -> f64 {
    match samples.iter().position(|s| s.time >= t) {
        Some(0) => samples[0].activity,
        Some(i) => {
            let (lo, hi) = (samples[i - 1], samples[i]);
            let span = hi.time - lo.time;
            if span == 0.0 {
                lo.activity
            } else {
                lo.activity + (hi.activity - lo.activity) * (t - lo.time) / span
            }
        }
        // Past the last sample: hold the final value.
        None => samples.last().map(|s| s.activity).unwrap_or(0.0),
    }
}

/// Evaluates the blood curve at each frame time. Frame times at or below
/// `lin_fit_thresh_secs` use a least-squares line through the early samples;
/// later times interpolate between measured points. Negative fitted values
/// are clamped to zero.
pub fn resample_on_frame_times(
    samples: &[BloodSample],
    frame_times: &[f64],
    lin_fit_thresh_secs: f64,
) -> Vec<f64> {
    let early: Vec<BloodSample> =
        samples.iter().copied().filter(|s| s.time <= lin_fit_thresh_secs).collect();
    let (slope, intercept) = linear_fit(&early);
    frame_times
        .iter()
        .map(|&t| {
            let value = if t <= lin_fit_thresh_secs && early.len() >= 2 {
                slope * t + intercept
            } else {
                interpolate(samples, t)
            };
            value.max(0.0)
        })
        .collect()
}

fn parse_blood_tsv(path: &Path) -> Result<Vec<BloodSample>, OpError> {
    let rows = load_tsv_simple(path)?;
    let mut samples = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let time = row.first().map(|c| c.trim().parse::<f64>());
        let activity = row.get(1).map(|c| c.trim().parse::<f64>());
        match (time, activity) {
            (Some(Ok(time)), Some(Ok(activity))) => samples.push(BloodSample { time, activity }),
            // First row may be a header; anything after that must parse.
            _ if idx == 0 => continue,
            _ => {
                return Err(OpError::MalformedCurve {
                    path: path.to_string_lossy().into_owned(),
                    line: idx + 1,
                })
            }
        }
    }
    samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(samples)
}

/// Resamples a raw arterial blood curve onto the frame times of a reference
/// PET series and writes the result as a two-column table.
///
/// Expected keywords: `blood_tac_path`, `reference_4dpet_img_path`,
/// `out_tac_path`, `lin_fit_thresh_in_mins` and `rescale_constant`.
pub fn resample_blood_tac(args: &CallArgs) -> Result<(), OpError> {
    let blood_path = require_str(args, "blood_tac_path")?;
    let reference = require_str(args, "reference_4dpet_img_path")?;
    let out_path = require_str(args, "out_tac_path")?;
    let thresh_secs = args.get_f64("lin_fit_thresh_in_mins").unwrap_or(30.0) * 60.0;
    let rescale = args.get_f64("rescale_constant").unwrap_or(37000.0);

    let samples = parse_blood_tsv(Path::new(blood_path))?;
    let frame_times = frame_times_from_sidecar(reference, "FrameReferenceTime")
        .or_else(|_| frame_times_from_sidecar(reference, "FrameTimesStart"))?;
    let resampled = resample_on_frame_times(&samples, &frame_times, thresh_secs);

    let mut rows = vec![vec!["time".to_string(), "activity".to_string()]];
    rows.extend(
        frame_times
            .iter()
            .zip(&resampled)
            .map(|(t, v)| vec![t.to_string(), (v * rescale).to_string()]),
    );
    save_tsv_simple(Path::new(out_path), &rows)?;
    info!(frames = frame_times.len(), path = out_path, "resampled blood curve");
    Ok(())
}

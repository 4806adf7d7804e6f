//! Image-to-image transforms, delegated to AFNI executables.
//!
//! Each public `fn(&CallArgs) -> Result<(), OpError>` matches the
//! image-to-image payload contract: positional `(input, output)` first,
//! transform parameters as keywords.

use std::path::Path;

use tracing::warn;

use pet_bids::frame_times_from_sidecar;
use pet_core::CallArgs;

use super::process::ToolInvocation;
use super::{io_paths, require_str};
use crate::errors::OpError;

/// Auto-crop via `3dAutobox`: trims zero-padding around the head, keeping
/// `pad_voxels` of margin.
pub fn crop_invocation(input: &str, output: &str, pad_voxels: i64) -> ToolInvocation {
    ToolInvocation::new("3dAutobox")
        .arg("-input")
        .arg(input)
        .arg("-prefix")
        .arg(output)
        .arg("-npad")
        .arg(pad_voxels.to_string())
}

pub fn threshold_crop(args: &CallArgs) -> Result<(), OpError> {
    let (input, output) = io_paths(args)?;
    let pad_voxels = args.get_i64("pad_voxels").unwrap_or(3);
    crop_invocation(input, output, pad_voxels).run()?;
    Ok(())
}

/// Sibling path for a generated motion target image.
pub fn motion_target_path(output_image_path: &str) -> String {
    let path = Path::new(output_image_path);
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let stem = name.strip_suffix(".nii.gz").or_else(|| name.strip_suffix(".nii")).unwrap_or(&name);
    path.with_file_name(format!("{stem}_motion-target.nii.gz"))
        .to_string_lossy()
        .into_owned()
}

/// Mean-over-time target via `3dTstat -mean`.
pub fn mean_target_invocation(input: &str, target: &str) -> ToolInvocation {
    ToolInvocation::new("3dTstat").arg("-mean").arg("-prefix").arg(target).arg(input)
}

/// Summed-series target via `3dTstat -sum`.
pub fn sum_target_invocation(input: &str, target: &str) -> ToolInvocation {
    ToolInvocation::new("3dTstat").arg("-sum").arg("-prefix").arg(target).arg(input)
}

/// Frame-wise rigid realignment via `3dvolreg` against `base` (a dataset
/// path or a frame index).
pub fn volreg_invocation(input: &str, output: &str, base: &str, verbose: bool) -> ToolInvocation {
    let mut inv = ToolInvocation::new("3dvolreg");
    if verbose {
        inv = inv.arg("-verbose");
    }
    inv.arg("-base").arg(base).arg("-prefix").arg(output).arg(input)
}

/// Motion correction against a derived target image. The target flavor
/// follows `motion_target_option` (`mean_image` or `weighted_series_sum`).
pub fn moco_frames_above_mean(args: &CallArgs) -> Result<(), OpError> {
    let (input, output) = io_paths(args)?;
    let target_option = args.get_str("motion_target_option").unwrap_or("mean_image");
    let verbose = args.get_bool("verbose").unwrap_or(false);
    let target = motion_target_path(output);
    let target_inv = match target_option {
        "weighted_series_sum" => sum_target_invocation(input, &target),
        "mean_image" => mean_target_invocation(input, &target),
        other => {
            warn!(option = other, "unrecognized motion target option, using mean image");
            mean_target_invocation(input, &target)
        }
    };
    target_inv.run()?;
    volreg_invocation(input, output, &target, verbose).run()?;
    Ok(())
}

/// Index of the anchor frame for windowed motion correction: the last frame
/// that starts inside the first `w_size` seconds.
pub fn windowed_anchor_index(frame_times: &[f64], w_size: f64) -> usize {
    frame_times
        .iter()
        .rposition(|t| *t < w_size)
        .unwrap_or(0)
}

/// Windowed motion correction: realigns all frames to an anchor frame
/// chosen from the first acquisition window. Frame starts come from the
/// input image's sidecar; without timing information the first frame is
/// the anchor.
pub fn windowed_moco(args: &CallArgs) -> Result<(), OpError> {
    let (input, output) = io_paths(args)?;
    let w_size = args.get_f64("w_size").unwrap_or(60.0);
    let verbose = args.get_bool("verbose").unwrap_or(false);
    let anchor = match frame_times_from_sidecar(input, "FrameTimesStart")
        .or_else(|_| frame_times_from_sidecar(input, "FrameReferenceTime"))
    {
        Ok(times) => windowed_anchor_index(&times, w_size),
        Err(err) => {
            warn!(%err, "no frame timing for windowed moco, anchoring on frame 0");
            0
        }
    };
    volreg_invocation(input, output, &anchor.to_string(), verbose).run()?;
    Ok(())
}

/// Rigid-body registration via `3dAllineate` with a mutual-information
/// metric.
pub fn allineate_invocation(
    input: &str,
    output: &str,
    reference: &str,
    verbose: bool,
) -> ToolInvocation {
    let mut inv = ToolInvocation::new("3dAllineate");
    if verbose {
        inv = inv.arg("-verb");
    }
    inv.arg("-base")
        .arg(reference)
        .arg("-source")
        .arg(input)
        .arg("-prefix")
        .arg(output)
        .arg("-cost")
        .arg("mi")
}

/// Registers a (motion-corrected) PET series onto an anatomical reference.
pub fn register_pet_to_t1(args: &CallArgs) -> Result<(), OpError> {
    let (input, output) = io_paths(args)?;
    let reference = require_str(args, "reference_image_path")?;
    let verbose = args.get_bool("verbose").unwrap_or(false);
    allineate_invocation(input, output, reference, verbose).run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_command_line() {
        let inv = crop_invocation("/d/in.nii.gz", "/d/out.nii.gz", 3);
        assert_eq!(inv.command_line(),
                   "3dAutobox -input /d/in.nii.gz -prefix /d/out.nii.gz -npad 3");
    }

    #[test]
    fn volreg_against_a_frame_index() {
        let inv = volreg_invocation("/d/in.nii.gz", "/d/out.nii.gz", "4", false);
        assert_eq!(inv.command_line(), "3dvolreg -base 4 -prefix /d/out.nii.gz /d/in.nii.gz");
    }

    #[test]
    fn allineate_uses_mutual_information() {
        let inv = allineate_invocation("/d/pet.nii.gz", "/d/reg.nii.gz", "/d/t1.nii.gz", false);
        assert_eq!(
            inv.command_line(),
            "3dAllineate -base /d/t1.nii.gz -source /d/pet.nii.gz -prefix /d/reg.nii.gz -cost mi"
        );
    }

    #[test]
    fn motion_target_sits_next_to_the_output() {
        assert_eq!(motion_target_path("/out/sub-01_ses-01_desc-Moco_pet.nii.gz"),
                   "/out/sub-01_ses-01_desc-Moco_pet_motion-target.nii.gz");
    }

    #[test]
    fn windowed_anchor_is_the_last_frame_in_the_window() {
        let times = [0.0, 15.0, 30.0, 45.0, 60.0, 120.0];
        assert_eq!(windowed_anchor_index(&times, 60.0), 3);
        assert_eq!(windowed_anchor_index(&times, 1000.0), 5);
        // Window shorter than the first frame start: anchor on frame 0.
        assert_eq!(windowed_anchor_index(&[30.0, 60.0], 10.0), 0);
    }
}

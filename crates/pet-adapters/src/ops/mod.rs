//! External collaborators invoked by steps.
//!
//! Every function here follows the wrapped-function contract from pet-core:
//! it receives the step's call payload and works through side effects (file
//! creation). Image transforms and ROI sampling shell out to AFNI
//! executables on `PATH`; blood-curve resampling is tabular math done
//! natively.

mod blood;
mod image;
mod process;
mod tacs;

pub use blood::{resample_blood_tac, resample_on_frame_times, BloodSample};
pub use image::{
    allineate_invocation, crop_invocation, mean_target_invocation, moco_frames_above_mean,
    motion_target_path, register_pet_to_t1, sum_target_invocation, threshold_crop,
    volreg_invocation, windowed_moco,
};
pub use process::ToolInvocation;
pub use tacs::{
    maskave_invocation, parse_label_map, sanitize_region_name, tac_output_path, write_roi_tacs,
    RoiLabel,
};

use pet_core::CallArgs;

use crate::errors::OpError;

/// Fetches a keyword argument that must be a non-empty string.
pub(crate) fn require_str<'a>(args: &'a CallArgs, name: &str) -> Result<&'a str, OpError> {
    match args.get_str(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(OpError::MissingArg { name: name.to_string() }),
    }
}

/// Fetches the `(input, output)` image paths from the two leading
/// positional slots of an image-to-image payload.
pub(crate) fn io_paths(args: &CallArgs) -> Result<(&str, &str), OpError> {
    let input = args
        .str_at(0)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| OpError::MissingArg { name: "input_image_path".to_string() })?;
    let output = args
        .str_at(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| OpError::MissingArg { name: "output_image_path".to_string() })?;
    Ok((input, output))
}

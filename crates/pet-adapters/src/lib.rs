//! pet-adapters: concrete processing steps for the pet-core engine.
//!
//! - `ops`: the external collaborators behind each step — wrappers around
//!   AFNI command-line tools for image transforms and ROI sampling, plus a
//!   native tabular implementation of blood-curve resampling.
//! - `presets`: named factory functions that fix a step's function
//!   reference and parameter defaults while leaving path slots empty, ready
//!   to be linked and inferred by a pipeline.

pub mod errors;
pub mod ops;
pub mod presets;

pub use errors::OpError;
pub use presets::{
    default_moco_frames_above_mean, default_register_pet_to_t1,
    default_resample_blood_tac_on_scanner_times, default_threshold_cropping,
    default_windowed_moco, default_write_tacs_from_segmentation_rois, ParamMap,
};

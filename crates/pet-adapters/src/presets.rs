//! Preset step factories.
//!
//! Each `default_*` function builds a step with its function reference and
//! parameter defaults fixed, path slots empty, ready to be linked into a
//! pipeline and have its outputs inferred. The image presets accept a
//! parameter-override map; an override that names an unknown parameter or
//! carries a value of the wrong shape is rejected as a whole — the factory
//! warns and returns the unmodified defaults rather than failing.

use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use pet_core::{
    CallArgs, DynError, ImageToImageStep, ResampleBloodTacStep, StepError, StepFn,
    TacsFromSegmentationStep,
};

use crate::errors::OpError;
use crate::ops;

/// Parameter map for preset overrides, insertion-ordered like `CallArgs`.
pub type ParamMap = IndexMap<String, Value>;

/// Adapts a plain operation function into the engine's function contract.
pub fn step_fn(f: fn(&CallArgs) -> Result<(), OpError>) -> StepFn {
    Arc::new(move |args: &CallArgs| f(args).map_err(|e| Box::new(e) as DynError))
}

fn compatible(default: &Value, value: &Value) -> bool {
    // Null defaults are "optional" parameters and accept anything; a null
    // override clears an optional value.
    default.is_null()
        || value.is_null()
        || mem::discriminant(default) == mem::discriminant(value)
}

fn validate_overrides(
    step: &str,
    defaults: &ParamMap,
    overrides: &ParamMap,
) -> Result<(), StepError> {
    for (name, value) in overrides {
        match defaults.get(name) {
            None => {
                return Err(StepError::UnknownParameter {
                    step: step.to_string(),
                    name: name.clone(),
                })
            }
            Some(default) if !compatible(default, value) => {
                return Err(StepError::InvalidParameter {
                    step: step.to_string(),
                    name: name.clone(),
                    reason: format!("expected a value like {default}, got {value}"),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Defaults with overrides applied, or the unmodified defaults if any
/// override is rejected.
fn resolve_params(step: &str, defaults: &ParamMap, overrides: Option<&ParamMap>) -> ParamMap {
    let Some(overrides) = overrides else {
        return defaults.clone();
    };
    match validate_overrides(step, defaults, overrides) {
        Ok(()) => {
            let mut merged = defaults.clone();
            for (name, value) in overrides {
                merged.insert(name.clone(), value.clone());
            }
            merged
        }
        Err(err) => {
            warn!(step, %err, "rejecting parameter overrides, keeping preset defaults");
            defaults.clone()
        }
    }
}

const INPUT_KEY: &str = "input_image_path";
const OUTPUT_KEY: &str = "output_image_path";

fn image_step_from_params(name: &str, function: StepFn, params: &ParamMap) -> ImageToImageStep {
    let input = params.get(INPUT_KEY).and_then(Value::as_str).unwrap_or_default();
    let output = params.get(OUTPUT_KEY).and_then(Value::as_str).unwrap_or_default();
    let mut extra = CallArgs::new();
    for (key, value) in params {
        if key != INPUT_KEY && key != OUTPUT_KEY {
            extra.set_kwarg(key, value.clone());
        }
    }
    ImageToImageStep::new(name, function, input, output, extra)
}

fn image_preset(
    name: &str,
    function: StepFn,
    defaults: ParamMap,
    overrides: Option<&ParamMap>,
) -> ImageToImageStep {
    let params = resolve_params(name, &defaults, overrides);
    image_step_from_params(name, function, &params)
}

/// Zero-threshold auto-cropping around the head.
pub fn default_threshold_cropping(overrides: Option<&ParamMap>) -> ImageToImageStep {
    let mut defaults = ParamMap::new();
    defaults.insert(INPUT_KEY.to_string(), Value::from(""));
    defaults.insert(OUTPUT_KEY.to_string(), Value::from(""));
    defaults.insert("pad_voxels".to_string(), Value::from(3));
    defaults.insert("verbose".to_string(), Value::from(false));
    image_preset("thresh_crop", step_fn(ops::threshold_crop), defaults, overrides)
}

/// Motion correction against a derived target image.
pub fn default_moco_frames_above_mean(overrides: Option<&ParamMap>) -> ImageToImageStep {
    let mut defaults = ParamMap::new();
    defaults.insert(INPUT_KEY.to_string(), Value::from(""));
    defaults.insert(OUTPUT_KEY.to_string(), Value::from(""));
    defaults.insert("motion_target_option".to_string(), Value::from("mean_image"));
    defaults.insert("half_life".to_string(), Value::Null);
    defaults.insert("verbose".to_string(), Value::from(false));
    image_preset(
        "moco_frames_above_mean",
        step_fn(ops::moco_frames_above_mean),
        defaults,
        overrides,
    )
}

/// Windowed motion correction anchored inside the first acquisition window.
pub fn default_windowed_moco(overrides: Option<&ParamMap>) -> ImageToImageStep {
    let mut defaults = ParamMap::new();
    defaults.insert(INPUT_KEY.to_string(), Value::from(""));
    defaults.insert(OUTPUT_KEY.to_string(), Value::from(""));
    defaults.insert("motion_target_option".to_string(), Value::from("weighted_series_sum"));
    defaults.insert("w_size".to_string(), Value::from(60.0));
    defaults.insert("verbose".to_string(), Value::from(false));
    image_preset("windowed_moco", step_fn(ops::windowed_moco), defaults, overrides)
}

/// Rigid registration of a PET series onto an anatomical image. The
/// anatomical reference stays empty by default; it is per-subject data, not
/// a tuning parameter, so callers set it via an override or `set_param`.
pub fn default_register_pet_to_t1(overrides: Option<&ParamMap>) -> ImageToImageStep {
    let mut defaults = ParamMap::new();
    defaults.insert(INPUT_KEY.to_string(), Value::from(""));
    defaults.insert(OUTPUT_KEY.to_string(), Value::from(""));
    defaults.insert("reference_image_path".to_string(), Value::from(""));
    defaults.insert("motion_target_option".to_string(), Value::from("weighted_series_sum"));
    defaults.insert("half_life".to_string(), Value::Null);
    defaults.insert("verbose".to_string(), Value::from(false));
    image_preset("register_pet_to_t1", step_fn(ops::register_pet_to_t1), defaults, overrides)
}

/// Per-region TAC extraction. All path slots start empty.
pub fn default_write_tacs_from_segmentation_rois() -> TacsFromSegmentationStep {
    TacsFromSegmentationStep::new(
        step_fn(ops::write_roi_tacs),
        "",
        "",
        "",
        "",
        "",
        "FrameReferenceTime",
        false,
    )
}

/// Blood-curve resampling onto scanner frame times. The 30-minute fit
/// threshold and the 37 kBq/mL rescale constant match the usual acquisition
/// protocol.
pub fn default_resample_blood_tac_on_scanner_times() -> ResampleBloodTacStep {
    ResampleBloodTacStep::new(step_fn(ops::resample_blood_tac), "", "", "", 30.0, 37000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn threshold_cropping_defaults() {
        let step = default_threshold_cropping(None);
        assert_eq!(step.name(), "thresh_crop");
        assert_eq!(step.input_image_path(), "");
        assert_eq!(step.params().get_i64("pad_voxels"), Some(3));
        assert!(!step.can_potentially_run());
    }

    #[test]
    fn valid_overrides_are_applied() {
        let mut overrides = ParamMap::new();
        overrides.insert("pad_voxels".to_string(), json!(7));
        overrides.insert(INPUT_KEY.to_string(), json!("/d/pet.nii.gz"));
        let step = default_threshold_cropping(Some(&overrides));
        assert_eq!(step.params().get_i64("pad_voxels"), Some(7));
        assert_eq!(step.input_image_path(), "/d/pet.nii.gz");
    }

    #[test]
    fn unknown_override_key_falls_back_to_defaults() {
        let mut overrides = ParamMap::new();
        overrides.insert("pad_voxels".to_string(), json!(7));
        overrides.insert("no_such_parameter".to_string(), json!(1));
        let step = default_threshold_cropping(Some(&overrides));
        assert_eq!(step, default_threshold_cropping(None));
    }

    #[test]
    fn wrongly_shaped_override_falls_back_to_defaults() {
        let mut overrides = ParamMap::new();
        overrides.insert("w_size".to_string(), json!("sixty"));
        let step = default_windowed_moco(Some(&overrides));
        assert_eq!(step, default_windowed_moco(None));
    }

    #[test]
    fn null_defaults_accept_any_override_value() {
        let mut overrides = ParamMap::new();
        overrides.insert("half_life".to_string(), json!(6586.2));
        let step = default_moco_frames_above_mean(Some(&overrides));
        assert_eq!(step.params().get_f64("half_life"), Some(6586.2));
    }

    #[test]
    fn fixed_presets_start_not_ready() {
        assert!(!default_write_tacs_from_segmentation_rois().can_potentially_run());
        let blood = default_resample_blood_tac_on_scanner_times();
        assert!(!blood.can_potentially_run());
        assert_eq!(blood.lin_fit_thresh_in_mins(), 30.0);
        assert_eq!(blood.rescale_constant(), 37000.0);
    }
}

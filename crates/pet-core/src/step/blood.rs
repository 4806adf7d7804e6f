//! Blood-curve resampling step.
//!
//! Resamples a raw blood time-activity curve onto the scanner's native
//! frame times, read from a reference 4D image. Linking wires the
//! *reference image* slot to an upstream image step's output, because the
//! usual composition is "resample against the registered image that defines
//! frame timing"; the raw curve stays the caller's responsibility.

use std::fmt;

use indexmap::IndexMap;
use tracing::info;

use pet_bids::{gen_bids_like_filepath, parse_subject_and_session};

use crate::errors::StepError;
use crate::model::CallArgs;
use crate::step::StepFn;

/// Fixed step name.
pub const BLOOD_RESAMPLE_STEP_NAME: &str = "resample_PTAC_on_scanner";

/// Descriptor token stamped on every inferred output of this step.
pub const ON_SCANNER_FRAMES_DESC: &str = "OnScannerFrameTimes";

#[derive(Clone)]
pub struct ResampleBloodTacStep {
    function: StepFn,
    raw_blood_tac_path: String,
    input_image_path: String,
    resampled_tac_path: String,
    lin_fit_thresh_in_mins: f64,
    rescale_constant: f64,
}

impl ResampleBloodTacStep {
    pub fn new(
        function: StepFn,
        raw_blood_tac_path: impl Into<String>,
        input_image_path: impl Into<String>,
        resampled_tac_path: impl Into<String>,
        lin_fit_thresh_in_mins: f64,
        rescale_constant: f64,
    ) -> Self {
        Self {
            function,
            raw_blood_tac_path: raw_blood_tac_path.into(),
            input_image_path: input_image_path.into(),
            resampled_tac_path: resampled_tac_path.into(),
            lin_fit_thresh_in_mins,
            rescale_constant,
        }
    }

    pub fn name(&self) -> &str {
        BLOOD_RESAMPLE_STEP_NAME
    }

    pub fn raw_blood_tac_path(&self) -> &str {
        &self.raw_blood_tac_path
    }

    pub fn set_raw_blood_tac_path(&mut self, path: impl Into<String>) {
        self.raw_blood_tac_path = path.into();
    }

    /// Path of the 4D image whose frame times the curve is resampled onto.
    pub fn input_image_path(&self) -> &str {
        &self.input_image_path
    }

    pub fn set_input_image_path(&mut self, path: impl Into<String>) {
        self.input_image_path = path.into();
    }

    pub fn resampled_tac_path(&self) -> &str {
        &self.resampled_tac_path
    }

    pub fn set_resampled_tac_path(&mut self, path: impl Into<String>) {
        self.resampled_tac_path = path.into();
    }

    pub fn lin_fit_thresh_in_mins(&self) -> f64 {
        self.lin_fit_thresh_in_mins
    }

    pub fn rescale_constant(&self) -> f64 {
        self.rescale_constant
    }

    pub fn call_args(&self) -> CallArgs {
        let mut args = CallArgs::new();
        args.set_kwarg("blood_tac_path", self.raw_blood_tac_path.as_str())
            .set_kwarg("reference_4dpet_img_path", self.input_image_path.as_str())
            .set_kwarg("out_tac_path", self.resampled_tac_path.as_str())
            .set_kwarg("lin_fit_thresh_in_mins", self.lin_fit_thresh_in_mins)
            .set_kwarg("rescale_constant", self.rescale_constant);
        args
    }

    pub fn missing_slots(&self) -> Vec<String> {
        self.call_args().empty_string_slots()
    }

    pub fn can_potentially_run(&self) -> bool {
        self.missing_slots().is_empty()
    }

    pub fn execute(&self) -> Result<(), StepError> {
        info!(step = BLOOD_RESAMPLE_STEP_NAME, "executing");
        (self.function)(&self.call_args()).map_err(|source| StepError::Execution {
            step: BLOOD_RESAMPLE_STEP_NAME.to_string(),
            source,
        })?;
        info!(step = BLOOD_RESAMPLE_STEP_NAME, "finished");
        Ok(())
    }

    /// Derives the resampled curve path. Identifiers come from the *raw
    /// curve* path, not the reference image, and the name always carries
    /// the `OnScannerFrameTimes` descriptor under modality `preproc`.
    pub fn infer_outputs_from_inputs(
        &mut self,
        out_dir: &str,
        suffix: Option<&str>,
        ext: Option<&str>,
        extra_desc: &IndexMap<String, String>,
    ) {
        let (sub_id, ses_id) = parse_subject_and_session(&self.raw_blood_tac_path);
        let mut desc = IndexMap::new();
        desc.insert("desc".to_string(), ON_SCANNER_FRAMES_DESC.to_string());
        desc.extend(extra_desc.clone());
        self.resampled_tac_path = gen_bids_like_filepath(
            &sub_id,
            &ses_id,
            out_dir,
            "preproc",
            suffix.unwrap_or("blood"),
            ext.unwrap_or(".tsv"),
            &desc,
        );
    }
}

impl fmt::Debug for ResampleBloodTacStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResampleBloodTacStep")
            .field("raw_blood_tac_path", &self.raw_blood_tac_path)
            .field("input_image_path", &self.input_image_path)
            .field("resampled_tac_path", &self.resampled_tac_path)
            .field("lin_fit_thresh_in_mins", &self.lin_fit_thresh_in_mins)
            .field("rescale_constant", &self.rescale_constant)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ResampleBloodTacStep {
    fn eq(&self, other: &Self) -> bool {
        self.call_args() == other.call_args()
    }
}

impl fmt::Display for ResampleBloodTacStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ResampleBloodTacStep(name={BLOOD_RESAMPLE_STEP_NAME})")?;
        writeln!(f, "Arguments Passed:")?;
        write!(f, "{}", self.call_args())
    }
}

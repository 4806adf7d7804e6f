//! Tissue-curve (TAC) extraction step.
//!
//! Produces one time-activity curve file per region of an input
//! segmentation, so output inference derives a directory and a filename
//! prefix rather than a single path.

use std::fmt;

use tracing::info;

use pet_bids::{gen_bids_like_dir_path, parse_subject_and_session, snake_to_camel_case};

use crate::errors::StepError;
use crate::model::CallArgs;
use crate::step::StepFn;

/// Fixed step name embedded in inferred output prefixes.
pub const TACS_STEP_NAME: &str = "write_roi_tacs";

#[derive(Clone)]
pub struct TacsFromSegmentationStep {
    function: StepFn,
    input_image_path: String,
    segmentation_image_path: String,
    segmentation_label_map_path: String,
    out_tacs_dir: String,
    out_tacs_prefix: String,
    time_keyword: String,
    verbose: bool,
}

impl TacsFromSegmentationStep {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        function: StepFn,
        input_image_path: impl Into<String>,
        segmentation_image_path: impl Into<String>,
        segmentation_label_map_path: impl Into<String>,
        out_tacs_dir: impl Into<String>,
        out_tacs_prefix: impl Into<String>,
        time_keyword: impl Into<String>,
        verbose: bool,
    ) -> Self {
        Self {
            function,
            input_image_path: input_image_path.into(),
            segmentation_image_path: segmentation_image_path.into(),
            segmentation_label_map_path: segmentation_label_map_path.into(),
            out_tacs_dir: out_tacs_dir.into(),
            out_tacs_prefix: out_tacs_prefix.into(),
            time_keyword: time_keyword.into(),
            verbose,
        }
    }

    pub fn name(&self) -> &str {
        TACS_STEP_NAME
    }

    pub fn input_image_path(&self) -> &str {
        &self.input_image_path
    }

    pub fn set_input_image_path(&mut self, path: impl Into<String>) {
        self.input_image_path = path.into();
    }

    pub fn segmentation_image_path(&self) -> &str {
        &self.segmentation_image_path
    }

    pub fn set_segmentation_image_path(&mut self, path: impl Into<String>) {
        self.segmentation_image_path = path.into();
    }

    pub fn segmentation_label_map_path(&self) -> &str {
        &self.segmentation_label_map_path
    }

    pub fn set_segmentation_label_map_path(&mut self, path: impl Into<String>) {
        self.segmentation_label_map_path = path.into();
    }

    pub fn out_tacs_dir(&self) -> &str {
        &self.out_tacs_dir
    }

    pub fn set_out_tacs_dir(&mut self, path: impl Into<String>) {
        self.out_tacs_dir = path.into();
    }

    pub fn out_tacs_prefix(&self) -> &str {
        &self.out_tacs_prefix
    }

    pub fn set_out_tacs_prefix(&mut self, prefix: impl Into<String>) {
        self.out_tacs_prefix = prefix.into();
    }

    pub fn out_path_and_prefix(&self) -> (&str, &str) {
        (&self.out_tacs_dir, &self.out_tacs_prefix)
    }

    pub fn set_out_path_and_prefix(&mut self, dir: impl Into<String>, prefix: impl Into<String>) {
        self.out_tacs_dir = dir.into();
        self.out_tacs_prefix = prefix.into();
    }

    pub fn time_keyword(&self) -> &str {
        &self.time_keyword
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Derived call payload, keyword-only, in declaration order.
    pub fn call_args(&self) -> CallArgs {
        let mut args = CallArgs::new();
        args.set_kwarg("input_image_path", self.input_image_path.as_str())
            .set_kwarg("segmentation_image_path", self.segmentation_image_path.as_str())
            .set_kwarg("label_map_path", self.segmentation_label_map_path.as_str())
            .set_kwarg("out_tac_dir", self.out_tacs_dir.as_str())
            .set_kwarg("out_tac_prefix", self.out_tacs_prefix.as_str())
            .set_kwarg("time_frame_keyword", self.time_keyword.as_str())
            .set_kwarg("verbose", self.verbose);
        args
    }

    pub fn missing_slots(&self) -> Vec<String> {
        self.call_args().empty_string_slots()
    }

    pub fn can_potentially_run(&self) -> bool {
        self.missing_slots().is_empty()
    }

    pub fn execute(&self) -> Result<(), StepError> {
        info!(step = TACS_STEP_NAME, "executing");
        (self.function)(&self.call_args()).map_err(|source| StepError::Execution {
            step: TACS_STEP_NAME.to_string(),
            source,
        })?;
        info!(step = TACS_STEP_NAME, "finished");
        Ok(())
    }

    /// Derives the output directory and filename prefix. Identifiers come
    /// from the input image, never from the segmentation; the modality
    /// subdirectory is always `tacs`.
    pub fn infer_outputs_from_inputs(&mut self, out_dir: &str) {
        let (sub_id, ses_id) = parse_subject_and_session(&self.input_image_path);
        self.out_tacs_dir = gen_bids_like_dir_path(&sub_id, &ses_id, "tacs", out_dir);
        let camel = snake_to_camel_case(TACS_STEP_NAME);
        self.out_tacs_prefix = format!("sub-{sub_id}_ses-{ses_id}_desc-{camel}");
    }
}

impl fmt::Debug for TacsFromSegmentationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacsFromSegmentationStep")
            .field("input_image_path", &self.input_image_path)
            .field("segmentation_image_path", &self.segmentation_image_path)
            .field("segmentation_label_map_path", &self.segmentation_label_map_path)
            .field("out_tacs_dir", &self.out_tacs_dir)
            .field("out_tacs_prefix", &self.out_tacs_prefix)
            .field("time_keyword", &self.time_keyword)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TacsFromSegmentationStep {
    fn eq(&self, other: &Self) -> bool {
        self.call_args() == other.call_args()
    }
}

impl fmt::Display for TacsFromSegmentationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TacsFromSegmentationStep(name={TACS_STEP_NAME})")?;
        writeln!(f, "Arguments Passed:")?;
        write!(f, "{}", self.call_args())
    }
}

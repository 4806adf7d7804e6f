//! Image-to-image transform step.
//!
//! The wrapped function's contract is fixed: the first two positional
//! arguments of the derived payload are the input and output image paths;
//! everything after them is transform parameters.

use std::fmt;

use indexmap::IndexMap;
use tracing::info;

use pet_bids::{
    gen_bids_like_filepath, parse_subject_and_session, safe_copy_meta, snake_to_camel_case,
};

use crate::errors::StepError;
use crate::model::CallArgs;
use crate::step::StepFn;

/// A step transforming exactly one input image into one output image.
#[derive(Clone)]
pub struct ImageToImageStep {
    name: String,
    function: StepFn,
    input_image_path: String,
    output_image_path: String,
    params: CallArgs,
    defaults: CallArgs,
}

impl ImageToImageStep {
    pub fn new(
        name: impl Into<String>,
        function: StepFn,
        input_image_path: impl Into<String>,
        output_image_path: impl Into<String>,
        params: CallArgs,
    ) -> Self {
        let defaults = params.clone();
        Self {
            name: name.into(),
            function,
            input_image_path: input_image_path.into(),
            output_image_path: output_image_path.into(),
            params,
            defaults,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_image_path(&self) -> &str {
        &self.input_image_path
    }

    pub fn set_input_image_path(&mut self, path: impl Into<String>) {
        self.input_image_path = path.into();
    }

    pub fn output_image_path(&self) -> &str {
        &self.output_image_path
    }

    pub fn set_output_image_path(&mut self, path: impl Into<String>) {
        self.output_image_path = path.into();
    }

    /// Transform parameters (everything beyond the two path slots).
    pub fn params(&self) -> &CallArgs {
        &self.params
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.params.set_kwarg(name, value);
    }

    /// Full call payload: `(input, output, *params)` plus keyword params.
    /// Derived on demand so it can never drift from the named slots.
    pub fn call_args(&self) -> CallArgs {
        let mut positional = vec![
            serde_json::Value::from(self.input_image_path.as_str()),
            serde_json::Value::from(self.output_image_path.as_str()),
        ];
        positional.extend(self.params.positional.iter().cloned());
        CallArgs { positional, keyword: self.params.keyword.clone() }
    }

    pub fn missing_slots(&self) -> Vec<String> {
        let mut missing = Vec::new();
        // The params scan below only sees transform parameters; the two
        // image slots are checked here by name.
        if self.input_image_path.is_empty() {
            missing.push("input_image_path".to_string());
        }
        if self.output_image_path.is_empty() {
            missing.push("output_image_path".to_string());
        }
        missing.extend(self.params.empty_string_slots());
        missing
    }

    pub fn can_potentially_run(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Runs the transform, then (by default) copies the input image's
    /// companion metadata record next to the output image. Transforms only
    /// touch pixel data; skipping the copy silently desynchronizes the
    /// output from its frame timing.
    pub fn execute(&self, copy_meta_file: bool) -> Result<(), StepError> {
        info!(step = %self.name, "executing");
        let payload = self.call_args();
        (self.function)(&payload).map_err(|source| StepError::Execution {
            step: self.name.clone(),
            source,
        })?;
        if copy_meta_file {
            safe_copy_meta(&self.input_image_path, &self.output_image_path).map_err(|e| {
                StepError::Execution { step: self.name.clone(), source: Box::new(e) }
            })?;
        }
        info!(step = %self.name, "finished");
        Ok(())
    }

    /// Derives the output image path from the input path's subject/session
    /// identifiers, the step's name (as a `desc-` token) and any extra
    /// descriptors. Unparseable inputs proceed with placeholder identifiers.
    pub fn infer_outputs_from_inputs(
        &mut self,
        out_dir: &str,
        der_type: &str,
        suffix: Option<&str>,
        ext: Option<&str>,
        extra_desc: &IndexMap<String, String>,
    ) {
        let (sub_id, ses_id) = parse_subject_and_session(&self.input_image_path);
        let mut desc = IndexMap::new();
        desc.insert("desc".to_string(), snake_to_camel_case(&self.name));
        desc.extend(extra_desc.clone());
        let filepath = gen_bids_like_filepath(
            &sub_id,
            &ses_id,
            out_dir,
            der_type,
            suffix.unwrap_or("pet"),
            ext.unwrap_or(".nii.gz"),
            &desc,
        );
        self.output_image_path = filepath;
    }
}

impl fmt::Debug for ImageToImageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageToImageStep")
            .field("name", &self.name)
            .field("input_image_path", &self.input_image_path)
            .field("output_image_path", &self.output_image_path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ImageToImageStep {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.input_image_path == other.input_image_path
            && self.output_image_path == other.output_image_path
            && self.params == other.params
            && self.defaults == other.defaults
    }
}

impl fmt::Display for ImageToImageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ImageToImageStep(name={})", self.name)?;
        writeln!(f, "Input & Output Paths:")?;
        writeln!(f, "    input_image_path: {}", self.input_image_path)?;
        writeln!(f, "    output_image_path: {}", self.output_image_path)?;
        writeln!(f, "Arguments Passed:")?;
        write!(f, "{}", self.params)?;
        writeln!(f, "Default Arguments:")?;
        write!(f, "{}", self.defaults)
    }
}

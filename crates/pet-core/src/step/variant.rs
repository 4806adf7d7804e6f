//! The closed set of step variants and the polymorphic operations over it.
//!
//! Linking and output inference are dispatched by explicit variant match
//! rather than open-ended downcasting: the set of variants is small and
//! enumerable, and a pair with no linking rule must fail loudly instead of
//! leaving an input slot silently unset.

use std::fmt;

use indexmap::IndexMap;

use crate::errors::StepError;
use crate::model::CallArgs;
use crate::step::{
    FunctionStep, ImageToImageStep, ResampleBloodTacStep, TacsFromSegmentationStep,
};

/// Variant tag, used for dispatch and for linking-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepVariant {
    Function,
    ImageToImage,
    TacsFromSegmentation,
    ResampleBloodTac,
}

/// A step as held by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStep {
    Function(FunctionStep),
    ImageToImage(ImageToImageStep),
    TacsFromSegmentation(TacsFromSegmentationStep),
    ResampleBloodTac(ResampleBloodTacStep),
}

impl PipelineStep {
    pub fn variant(&self) -> StepVariant {
        match self {
            PipelineStep::Function(_) => StepVariant::Function,
            PipelineStep::ImageToImage(_) => StepVariant::ImageToImage,
            PipelineStep::TacsFromSegmentation(_) => StepVariant::TacsFromSegmentation,
            PipelineStep::ResampleBloodTac(_) => StepVariant::ResampleBloodTac,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PipelineStep::Function(s) => s.name(),
            PipelineStep::ImageToImage(s) => s.name(),
            PipelineStep::TacsFromSegmentation(s) => s.name(),
            PipelineStep::ResampleBloodTac(s) => s.name(),
        }
    }

    /// Current call payload snapshot, however the variant stores it.
    pub fn call_args(&self) -> CallArgs {
        match self {
            PipelineStep::Function(s) => s.args().clone(),
            PipelineStep::ImageToImage(s) => s.call_args(),
            PipelineStep::TacsFromSegmentation(s) => s.call_args(),
            PipelineStep::ResampleBloodTac(s) => s.call_args(),
        }
    }

    pub fn missing_slots(&self) -> Vec<String> {
        match self {
            PipelineStep::Function(s) => s.missing_slots(),
            PipelineStep::ImageToImage(s) => s.missing_slots(),
            PipelineStep::TacsFromSegmentation(s) => s.missing_slots(),
            PipelineStep::ResampleBloodTac(s) => s.missing_slots(),
        }
    }

    pub fn can_potentially_run(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Executes the step. Image-to-image steps also copy the companion
    /// metadata record forward (use the concrete type to opt out).
    pub fn execute(&self) -> Result<(), StepError> {
        match self {
            PipelineStep::Function(s) => s.execute(),
            PipelineStep::ImageToImage(s) => s.execute(true),
            PipelineStep::TacsFromSegmentation(s) => s.execute(),
            PipelineStep::ResampleBloodTac(s) => s.execute(),
        }
    }

    /// Wires this step's input to `sending`'s output.
    ///
    /// Rules, by receiving variant:
    /// - image-to-image takes the sender's output image as its input image;
    /// - TAC extraction takes it as the main input image (segmentation slots
    ///   stay untouched);
    /// - blood resampling takes it as the *reference image*;
    /// all only when the sender is itself image-to-image. Every other pair
    /// is a linking mismatch.
    pub fn set_input_as_output_from(&mut self, sending: &PipelineStep) -> Result<(), StepError> {
        match (&mut *self, sending) {
            (PipelineStep::ImageToImage(recv), PipelineStep::ImageToImage(send)) => {
                recv.set_input_image_path(send.output_image_path());
                Ok(())
            }
            (PipelineStep::TacsFromSegmentation(recv), PipelineStep::ImageToImage(send)) => {
                recv.set_input_image_path(send.output_image_path());
                Ok(())
            }
            (PipelineStep::ResampleBloodTac(recv), PipelineStep::ImageToImage(send)) => {
                recv.set_input_image_path(send.output_image_path());
                Ok(())
            }
            (recv, send) => Err(StepError::LinkingMismatch {
                sending: send.name().to_string(),
                sending_variant: send.variant(),
                receiving: recv.name().to_string(),
                receiving_variant: recv.variant(),
            }),
        }
    }

    /// Derives output locations from input provenance. `suffix`/`ext`
    /// default per variant; the generic function step defines no policy.
    pub fn infer_outputs_from_inputs(
        &mut self,
        out_dir: &str,
        der_type: &str,
        suffix: Option<&str>,
        ext: Option<&str>,
        extra_desc: &IndexMap<String, String>,
    ) -> Result<(), StepError> {
        match self {
            PipelineStep::ImageToImage(s) => {
                s.infer_outputs_from_inputs(out_dir, der_type, suffix, ext, extra_desc);
                Ok(())
            }
            PipelineStep::TacsFromSegmentation(s) => {
                s.infer_outputs_from_inputs(out_dir);
                Ok(())
            }
            PipelineStep::ResampleBloodTac(s) => {
                s.infer_outputs_from_inputs(out_dir, suffix, ext, extra_desc);
                Ok(())
            }
            PipelineStep::Function(s) => Err(StepError::OutputInferenceUnsupported {
                step: s.name().to_string(),
                variant: StepVariant::Function,
            }),
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Function(s) => s.fmt(f),
            PipelineStep::ImageToImage(s) => s.fmt(f),
            PipelineStep::TacsFromSegmentation(s) => s.fmt(f),
            PipelineStep::ResampleBloodTac(s) => s.fmt(f),
        }
    }
}

impl From<FunctionStep> for PipelineStep {
    fn from(step: FunctionStep) -> Self {
        PipelineStep::Function(step)
    }
}

impl From<ImageToImageStep> for PipelineStep {
    fn from(step: ImageToImageStep) -> Self {
        PipelineStep::ImageToImage(step)
    }
}

impl From<TacsFromSegmentationStep> for PipelineStep {
    fn from(step: TacsFromSegmentationStep) -> Self {
        PipelineStep::TacsFromSegmentation(step)
    }
}

impl From<ResampleBloodTacStep> for PipelineStep {
    fn from(step: ResampleBloodTacStep) -> Self {
        PipelineStep::ResampleBloodTac(step)
    }
}

//! pet-core: step/pipeline composition engine for PET processing chains.
//!
//! An analysis function becomes a [`step::FunctionStep`] (or one of the
//! typed variants with fixed slot contracts); steps compose into a linear
//! [`pipeline::Pipeline`] by linking one step's output location to the next
//! step's input, with output locations inferred from the subject/session
//! identifiers embedded in input file names.

pub mod errors;
pub mod model;
pub mod pipeline;
pub mod step;

pub use errors::{DynError, StepError};
pub use model::CallArgs;
pub use pipeline::{Pipeline, RunReport};
pub use step::{
    FunctionStep, ImageToImageStep, PipelineStep, ResampleBloodTacStep, StepFn, StepVariant,
    TacsFromSegmentationStep,
};

//! Step definitions.
//!
//! A step is a named, re-parameterizable wrapper around one external
//! processing function. This module defines:
//! - `FunctionStep`: the generic base, storing the call payload directly.
//! - The typed variants with fixed slot contracts: `ImageToImageStep`,
//!   `TacsFromSegmentationStep`, `ResampleBloodTacStep`.
//! - `PipelineStep`: the closed variant enum through which linking and
//!   output inference dispatch.

mod blood;
mod function;
mod image;
mod tacs;
mod variant;

pub use blood::ResampleBloodTacStep;
pub use function::{FunctionStep, StepFn};
pub use image::ImageToImageStep;
pub use tacs::TacsFromSegmentationStep;
pub use variant::{PipelineStep, StepVariant};

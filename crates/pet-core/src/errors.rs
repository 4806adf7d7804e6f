//! Error taxonomy of the composition engine.
//!
//! Wrapped functions fail for domain reasons the engine does not interpret;
//! those surface unmodified inside `Execution`. Everything else is a local
//! construction/wiring problem detected by the engine itself.

use thiserror::Error;

use crate::step::StepVariant;

/// Error type returned by wrapped functions. The engine never inspects it
/// beyond attaching the owning step's name.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StepError {
    /// A step was asked to run while required path slots are still empty.
    #[error("step `{step}` is not ready to run; empty required slots: {missing:?}")]
    NotReady { step: String, missing: Vec<String> },

    /// `set_input_as_output_from` has no rule for this pair of variants.
    #[error("no linking rule from `{sending}` ({sending_variant:?}) into `{receiving}` ({receiving_variant:?})")]
    LinkingMismatch {
        sending: String,
        sending_variant: StepVariant,
        receiving: String,
        receiving_variant: StepVariant,
    },

    /// The variant defines no output-inference policy.
    #[error("step `{step}` ({variant:?}) has no output-inference policy")]
    OutputInferenceUnsupported { step: String, variant: StepVariant },

    /// A parameter name unknown to the step's constructor.
    #[error("unknown parameter `{name}` for step `{step}`")]
    UnknownParameter { step: String, name: String },

    /// A known parameter carrying a value of the wrong shape.
    #[error("invalid value for parameter `{name}` of step `{step}`: {reason}")]
    InvalidParameter { step: String, name: String, reason: String },

    /// Two steps with the same name in one pipeline.
    #[error("pipeline `{pipeline}` already contains a step named `{name}`")]
    DuplicateStepName { pipeline: String, name: String },

    /// Lookup of a step name that is not in the pipeline.
    #[error("pipeline `{pipeline}` has no step named `{name}`")]
    UnknownStep { pipeline: String, name: String },

    /// The wrapped function raised; propagated without retry or rollback.
    #[error("step `{step}` failed: {source}")]
    Execution {
        step: String,
        #[source]
        source: DynError,
    },
}

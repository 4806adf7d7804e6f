//! Generic function-based step.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::errors::{DynError, StepError};
use crate::model::CallArgs;

/// Contract for a wrapped function: it receives the step's current call
/// payload (positional first, then keywords) and does its work through side
/// effects, typically file creation. The engine captures no return value.
pub type StepFn = Arc<dyn Fn(&CallArgs) -> Result<(), DynError> + Send + Sync>;

/// The atomic execution unit: one external function plus its arguments.
///
/// The function's signature is never validated at construction; mismatches
/// surface only when the function runs.
#[derive(Clone)]
pub struct FunctionStep {
    name: String,
    function: StepFn,
    args: CallArgs,
    defaults: CallArgs,
}

impl FunctionStep {
    pub fn new(name: impl Into<String>, function: StepFn, args: CallArgs) -> Self {
        let defaults = args.clone();
        Self { name: name.into(), function, args, defaults }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current argument snapshot; what `execute` will pass to the function.
    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Argument set captured at construction, kept for debugging dumps.
    pub fn defaults(&self) -> &CallArgs {
        &self.defaults
    }

    pub fn set_kwarg(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.args.set_kwarg(name, value);
    }

    pub fn set_positional(&mut self, index: usize, value: impl Into<serde_json::Value>) {
        if index < self.args.positional.len() {
            self.args.positional[index] = value.into();
        }
    }

    pub fn missing_slots(&self) -> Vec<String> {
        self.args.empty_string_slots()
    }

    /// Cheap local precondition check: every string slot is non-empty. Does
    /// not verify that referenced files exist.
    pub fn can_potentially_run(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Invokes the wrapped function with the current arguments. Failures
    /// propagate unmodified; no retry, no rollback of partial outputs.
    pub fn execute(&self) -> Result<(), StepError> {
        info!(step = %self.name, "executing");
        (self.function)(&self.args).map_err(|source| StepError::Execution {
            step: self.name.clone(),
            source,
        })?;
        info!(step = %self.name, "finished");
        Ok(())
    }
}

impl fmt::Debug for FunctionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionStep")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl PartialEq for FunctionStep {
    fn eq(&self, other: &Self) -> bool {
        // The wrapped function is opaque; identity is name + arguments.
        self.name == other.name && self.args == other.args && self.defaults == other.defaults
    }
}

impl fmt::Display for FunctionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FunctionStep(name={})", self.name)?;
        writeln!(f, "Arguments Passed:")?;
        write!(f, "{}", self.args)?;
        writeln!(f, "Default Arguments:")?;
        write!(f, "{}", self.defaults)
    }
}

//! Ordered, strictly sequential pipeline of steps.
//!
//! The dependency structure is implicit in insertion order: processing
//! chains here are linear, so no DAG is kept. Each run checks readiness
//! before invoking a step; a failure aborts the run and leaves any partial
//! outputs of the failed step in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::StepError;
use crate::step::PipelineStep;

pub struct Pipeline {
    name: String,
    steps: Vec<PipelineStep>,
}

/// Summary of one sequential run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps_run: Vec<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a step. Names must be unique so lookup and linking by name
    /// stay unambiguous.
    pub fn add_step(&mut self, step: impl Into<PipelineStep>) -> Result<(), StepError> {
        let step = step.into();
        if self.steps.iter().any(|s| s.name() == step.name()) {
            return Err(StepError::DuplicateStepName {
                pipeline: self.name.clone(),
                name: step.name().to_string(),
            });
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name() == name)
    }

    pub fn step_mut(&mut self, name: &str) -> Option<&mut PipelineStep> {
        self.steps.iter_mut().find(|s| s.name() == name)
    }

    /// Wires `receiving`'s input to `sending`'s output, by step name. The
    /// sending step is read only transiently during this call; no edge
    /// between the two steps is retained.
    pub fn link(&mut self, sending: &str, receiving: &str) -> Result<(), StepError> {
        let pipeline = self.name.clone();
        let sending_step = self
            .step(sending)
            .ok_or_else(|| StepError::UnknownStep { pipeline: pipeline.clone(), name: sending.to_string() })?
            .clone();
        let receiving_step = self
            .step_mut(receiving)
            .ok_or(StepError::UnknownStep { pipeline, name: receiving.to_string() })?;
        receiving_step.set_input_as_output_from(&sending_step)
    }

    /// Runs every step in insertion order. Readiness is checked before each
    /// invocation; the first failure aborts the remaining steps.
    pub fn run(&self) -> Result<RunReport, StepError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(pipeline = %self.name, %run_id, steps = self.steps.len(), "pipeline run started");
        let mut steps_run = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let missing = step.missing_slots();
            if !missing.is_empty() {
                return Err(StepError::NotReady { step: step.name().to_string(), missing });
            }
            step.execute()?;
            steps_run.push(step.name().to_string());
        }
        let finished_at = Utc::now();
        info!(pipeline = %self.name, %run_id, "pipeline run finished");
        Ok(RunReport { run_id, pipeline: self.name.clone(), started_at, finished_at, steps_run })
    }
}

//! Validation pipeline implementation.

use crate::catalog::HookCatalog;
use crate::core::error::ValidationReport;
use crate::graph::ModelSystem;
use crate::validation::stages::{
    LinkIntegrity, ParameterValues, RequiredHooks, TypeResolution, ValidationStage,
};
use log::debug;

/// Multi-stage validation pipeline.
///
/// Runs a series of validation stages on a model system before it is saved.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the default validation pipeline with all standard stages.
    pub fn default_pipeline() -> Self {
        Self {
            stages: vec![
                Box::new(TypeResolution),
                Box::new(LinkIntegrity),
                Box::new(RequiredHooks),
                Box::new(ParameterValues),
            ],
        }
    }

    /// Create a minimal pipeline (just the checks that block saving).
    pub fn minimal_pipeline() -> Self {
        Self {
            stages: vec![Box::new(TypeResolution), Box::new(LinkIntegrity)],
        }
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Names of the stages, in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validate a model system through all stages.
    pub fn validate(&self, model_system: &ModelSystem, catalog: &HookCatalog) -> ValidationReport {
        let mut report = ValidationReport::new();

        for stage in &self.stages {
            match stage.validate(model_system, catalog) {
                Ok(warnings) => {
                    for warning in warnings {
                        report.add_warning(warning);
                    }
                }
                Err(errors) => {
                    debug!("{} found {} error(s)", stage.name(), errors.len());
                    for error in errors {
                        report.add_error(error);
                    }
                }
            }
        }

        report
    }

    /// Quick validation - just check if the model system can be saved.
    pub fn can_save(&self, model_system: &ModelSystem, catalog: &HookCatalog) -> bool {
        self.validate(model_system, catalog).can_save()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

//! Execution coordinator.
//!
//! `SkillEngine` drives one skill run as a state machine:
//!
//! 1. Gate the run (strict definitions, approval, input validation). Any
//!    failure here returns an error and no execution record is created.
//! 2. Create the `Execution` (`running`, variables = inputs) and persist it.
//! 3. Walk the steps in order: run each through the `StepExecutor`, append
//!    its `StepResult`, stop on a fatal failure, otherwise save the
//!    (extracted, transformed) result under `save_as`.
//! 4. Finalize as `completed` (with an output snapshot) or `failed`, stamp
//!    the completion time, and persist the final state.

use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use skillflow_types::config::EngineConfig;
use skillflow_types::error::RepositoryError;
use skillflow_types::execution::{
    Execution, ExecutionContext, ExecutionFilter, ExecutionStatus, StepResult, StepStatus,
};
use skillflow_types::skill::{Skill, SkillStep};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::repository::execution::ExecutionStore;
use crate::repository::skill::SkillCatalog;
use crate::tool::ToolInvoker;

use super::definition::{DefinitionError, validate_strict};
use super::interpolate::lookup_path;
use super::step_executor::StepExecutor;
use super::transform::transform;
use super::validator::{ValidationError, resolve_inputs, validate};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced to the caller of the engine.
///
/// Tool failures are not here: they are recorded in the execution's step
/// results and, when fatal, in its `error` field.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("skill '{0}' is disabled")]
    SkillDisabled(String),

    #[error("skill '{0}' requires approval before it can run")]
    ApprovalRequired(String),

    /// The run finished but its final state could not be stored. `execution`
    /// holds the true outcome.
    #[error(
        "execution {} finished as {} but could not be persisted: {source}",
        .execution.id,
        .execution.status
    )]
    Persistence {
        execution: Box<Execution>,
        source: RepositoryError,
    },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// ---------------------------------------------------------------------------
// SkillEngine
// ---------------------------------------------------------------------------

/// The skill execution engine.
///
/// Generic over its three collaborators so each deployment picks its own
/// catalog, tool invoker and execution store. Holds no per-run state and can
/// be shared behind an `Arc` to run independent executions concurrently.
pub struct SkillEngine<C: SkillCatalog, T: ToolInvoker, S: ExecutionStore> {
    catalog: C,
    invoker: T,
    store: S,
    config: EngineConfig,
    step_executor: StepExecutor,
}

impl<C: SkillCatalog, T: ToolInvoker, S: ExecutionStore> SkillEngine<C, T, S> {
    /// A zero `step_timeout_secs` is raised to one second.
    pub fn new(catalog: C, invoker: T, store: S, mut config: EngineConfig) -> Self {
        config.step_timeout_secs = config.step_timeout_secs.max(1);
        let step_executor = StepExecutor::new(Duration::from_secs(config.step_timeout_secs));
        Self {
            catalog,
            invoker,
            store,
            config,
            step_executor,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a skill from the catalog and execute it.
    pub async fn execute_by_id(
        &self,
        skill_id: &Uuid,
        inputs: Map<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<Execution, EngineError> {
        let skill = self
            .catalog
            .get(skill_id)
            .await?
            .ok_or_else(|| EngineError::SkillNotFound(skill_id.to_string()))?;

        if !skill.enabled {
            return Err(EngineError::SkillDisabled(skill.name));
        }

        self.execute(&skill, inputs, ctx).await
    }

    /// Execute `skill` against `inputs`.
    ///
    /// Returns the finalized execution, whether it `completed` or `failed`.
    /// An `Err` means the run was refused before it started or its final
    /// state could not be stored.
    pub async fn execute(
        &self,
        skill: &Skill,
        inputs: Map<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<Execution, EngineError> {
        let inputs = self.prepare(skill, inputs, ctx)?;

        let mut execution = Execution::start(skill, inputs, ctx);
        self.store.create_execution(&execution).await?;

        tracing::info!(
            execution_id = %execution.id,
            skill = skill.name.as_str(),
            actor = ctx.actor_id.as_str(),
            steps = skill.steps.len(),
            "starting skill execution"
        );

        let span = tracing::info_span!(
            "skill.execute",
            skill.name = skill.name.as_str(),
            execution.id = %execution.id,
        );
        self.run_steps(skill, &mut execution).instrument(span).await;

        if execution.status != ExecutionStatus::Failed {
            execution.status = ExecutionStatus::Completed;
            execution.output = Some(execution.variables.clone());
        }
        execution.completed_at = Some(Utc::now());

        tracing::info!(
            execution_id = %execution.id,
            skill = skill.name.as_str(),
            status = %execution.status,
            steps_evaluated = execution.step_results.len(),
            duration_ms = execution.duration_ms().unwrap_or_default(),
            "skill execution finished"
        );

        if let Err(source) = self.store.update_execution(&execution).await {
            tracing::warn!(
                execution_id = %execution.id,
                error = %source,
                "failed to persist final execution state"
            );
            return Err(EngineError::Persistence {
                execution: Box::new(execution),
                source,
            });
        }

        Ok(execution)
    }

    /// Get an execution by ID.
    pub async fn get_execution(&self, id: &Uuid) -> Result<Option<Execution>, EngineError> {
        Ok(self.store.get_execution(id).await?)
    }

    /// List executions matching `filter`, newest first.
    pub async fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, EngineError> {
        Ok(self.store.list_executions(filter).await?)
    }

    /// Walk the steps in order until the end or the first fatal failure.
    async fn run_steps(&self, skill: &Skill, execution: &mut Execution) {
        for step in &skill.steps {
            let result = self.step_executor.run(&self.invoker, step, execution).await;
            log_step(execution, &result);

            let fatal = result.status == StepStatus::Failed && !step.continue_on_error;
            let error = result.error.clone();
            let data = result.result.clone();
            execution.step_results.push(result);

            if fatal {
                execution.status = ExecutionStatus::Failed;
                execution.error = error;
                break;
            }

            if let Some(data) = data {
                save_result(step, data, &mut execution.variables);
            }

            if self.config.persist_each_step {
                if let Err(e) = self.store.update_execution(execution).await {
                    tracing::warn!(
                        execution_id = %execution.id,
                        step_id = step.id.as_str(),
                        error = %e,
                        "failed to persist step progress, continuing"
                    );
                }
            }
        }
    }

    /// Everything that must hold before an execution record may exist.
    fn prepare(
        &self,
        skill: &Skill,
        inputs: Map<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<Map<String, Value>, EngineError> {
        if self.config.strict_definitions {
            validate_strict(skill)?;
        }

        if skill.requires_approval && !ctx.approved {
            return Err(EngineError::ApprovalRequired(skill.name.clone()));
        }

        let inputs = resolve_inputs(skill, &inputs);
        validate(skill, &inputs)?;
        Ok(inputs)
    }
}

/// Store a step's result under `save_as`, after optional extract/transform.
/// A missing extract path stores `null`.
fn save_result(step: &SkillStep, data: Value, variables: &mut Map<String, Value>) {
    let Some(handling) = &step.result_handling else {
        return;
    };
    let Some(save_as) = &handling.save_as else {
        return;
    };

    let value = match &handling.extract {
        Some(path) => lookup_path(&data, path).cloned().unwrap_or(Value::Null),
        None => data,
    };
    let value = match handling.transform {
        Some(kind) => transform(value, kind),
        None => value,
    };

    variables.insert(save_as.clone(), value);
}

fn log_step(execution: &Execution, result: &StepResult) {
    match result.status {
        StepStatus::Success => tracing::debug!(
            execution_id = %execution.id,
            step_id = result.step_id.as_str(),
            tool = result.tool.as_str(),
            attempts = result.attempts,
            duration_ms = result.duration_ms,
            "step succeeded"
        ),
        StepStatus::Skipped => tracing::debug!(
            execution_id = %execution.id,
            step_id = result.step_id.as_str(),
            "step skipped"
        ),
        StepStatus::Failed => tracing::info!(
            execution_id = %execution.id,
            step_id = result.step_id.as_str(),
            tool = result.tool.as_str(),
            attempts = result.attempts,
            error = result.error.as_deref().unwrap_or_default(),
            "step failed"
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

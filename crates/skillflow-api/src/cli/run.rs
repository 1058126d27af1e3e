//! `skillflow run`: execute a skill from the catalog or straight from a file.
//!
//! File runs use in-memory stores, so nothing is written to the database.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use serde_json::{Map, Value};

use skillflow_core::repository::execution::ExecutionStore;
use skillflow_core::repository::skill::SkillCatalog;
use skillflow_core::skill::definition::load_skill_file;
use skillflow_core::skill::engine::{EngineError, SkillEngine};
use skillflow_core::tool::ToolInvoker;
use skillflow_infra::memory::execution::InMemoryExecutionStore;
use skillflow_infra::memory::skill::InMemorySkillCatalog;
use skillflow_infra::tool::http::HttpToolInvoker;
use skillflow_types::execution::{Execution, ExecutionContext, ExecutionStatus};
use skillflow_types::skill::{InputType, Skill};

use crate::cli::execution::print_execution;
use crate::state::AppState;

/// Arguments for `skillflow run`.
#[derive(Args)]
pub struct RunArgs {
    /// Skill UUID or name from the catalog.
    #[arg(required_unless_present = "file")]
    pub skill: Option<String>,

    /// Run a skill definition file without importing it.
    #[arg(long, short = 'f', conflicts_with = "skill")]
    pub file: Option<PathBuf>,

    /// Input value as KEY=VALUE (repeatable).
    #[arg(long = "input", short = 'i', value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    /// Inputs as a JSON object; `--input` values override its keys.
    #[arg(long, value_name = "JSON")]
    pub inputs_json: Option<String>,

    /// Actor (user) id recorded on the execution.
    #[arg(long, env = "SKILLFLOW_ACTOR", default_value = "cli")]
    pub actor: String,

    /// Customer the run is scoped to.
    #[arg(long)]
    pub customer: Option<String>,

    /// Approve skills that require approval.
    #[arg(long)]
    pub approve: bool,
}

/// Handle `skillflow run`.
pub async fn handle_run(args: RunArgs, state: &AppState, json: bool, quiet: bool) -> Result<()> {
    let mut ctx = ExecutionContext::new(&args.actor);
    ctx.customer_id = args.customer.clone();
    ctx.approved = args.approve;

    let execution = if let Some(file) = &args.file {
        let skill = load_skill_file(file)
            .with_context(|| format!("Failed to load skill file {}", file.display()))?;
        let inputs = parse_inputs(&skill, args.inputs_json.as_deref(), &args.inputs)?;

        let engine = SkillEngine::new(
            InMemorySkillCatalog::with_skills([skill.clone()]),
            HttpToolInvoker::new(&state.config.tools)?,
            InMemoryExecutionStore::new(),
            state.config.engine.clone(),
        );
        run_skill(&engine, &skill, inputs, &ctx).await?
    } else {
        let key = args.skill.as_deref().unwrap_or_default();
        let skill = state
            .find_skill(key)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to look up skill: {e}"))?
            .ok_or_else(|| anyhow::anyhow!("Skill '{key}' not found"))?;
        if !skill.enabled {
            bail!("Skill '{}' is disabled", skill.name);
        }
        let inputs = parse_inputs(&skill, args.inputs_json.as_deref(), &args.inputs)?;
        run_skill(state.engine.as_ref(), &skill, inputs, &ctx).await?
    };

    if !quiet || json {
        print_execution(&execution, json)?;
    }

    if execution.status == ExecutionStatus::Failed {
        bail!(
            "Execution {} failed: {}",
            execution.id,
            execution.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn run_skill<C, T, S>(
    engine: &SkillEngine<C, T, S>,
    skill: &Skill,
    inputs: Map<String, Value>,
    ctx: &ExecutionContext,
) -> Result<Execution>
where
    C: SkillCatalog,
    T: ToolInvoker,
    S: ExecutionStore,
{
    match engine.execute(skill, inputs, ctx).await {
        Ok(execution) => Ok(execution),
        Err(EngineError::Validation(e)) => {
            eprintln!();
            eprintln!("  {} Invalid inputs for '{}':", style("x").red().bold(), skill.name);
            for issue in &e.issues {
                eprintln!("    - {issue}");
            }
            eprintln!();
            bail!("{e}")
        }
        Err(EngineError::ApprovalRequired(name)) => {
            bail!("Skill '{name}' requires approval. Re-run with --approve to confirm.")
        }
        Err(EngineError::Persistence { execution, source }) => {
            eprintln!(
                "  {} Execution {} finished as {} but was not saved: {source}",
                style("!").yellow().bold(),
                execution.id,
                execution.status
            );
            Ok(*execution)
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the input map from `--inputs-json` and `--input KEY=VALUE` pairs.
///
/// Values for inputs declared as `string`, `date` or `customer` are kept
/// verbatim; anything else is parsed as JSON when possible so `days=30`
/// becomes a number and `tags=["a"]` an array.
pub fn parse_inputs(
    skill: &Skill,
    inputs_json: Option<&str>,
    pairs: &[String],
) -> Result<Map<String, Value>> {
    let mut inputs = match inputs_json {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("Invalid --inputs-json")? {
            Value::Object(map) => map,
            _ => bail!("--inputs-json must be a JSON object"),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Invalid input '{pair}': expected KEY=VALUE");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid input '{pair}': empty key");
        }

        let verbatim = skill.input(key).is_some_and(|input| {
            matches!(
                input.input_type,
                InputType::String | InputType::Date | InputType::Customer
            )
        });
        let value = if verbatim {
            Value::String(raw.to_string())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };
        inputs.insert(key.to_string(), value);
    }

    Ok(inputs)
}

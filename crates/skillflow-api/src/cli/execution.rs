//! CLI execution inspection subcommands.

use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use skillflow_types::execution::{Execution, ExecutionFilter, ExecutionStatus, StepStatus};

use crate::state::AppState;

/// Execution subcommands.
#[derive(Subcommand)]
pub enum ExecutionCommand {
    /// List recent executions, newest first.
    #[command(alias = "ls")]
    List {
        /// Only executions of this skill (UUID or name).
        #[arg(long)]
        skill: Option<String>,

        /// Filter by status (running, completed, failed, ...).
        #[arg(long)]
        status: Option<String>,

        /// Filter by actor id.
        #[arg(long)]
        actor: Option<String>,

        /// Filter by customer id.
        #[arg(long)]
        customer: Option<String>,

        /// Maximum number of executions to display.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show one execution with its step log.
    Show {
        /// Execution UUID.
        id: Uuid,
    },
}

/// Handle an execution subcommand.
pub async fn handle_execution_command(
    cmd: ExecutionCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        ExecutionCommand::List {
            skill,
            status,
            actor,
            customer,
            limit,
        } => {
            let skill_id = match skill {
                Some(key) => Some(
                    state
                        .find_skill(&key)
                        .await
                        .map_err(|e| anyhow::anyhow!("Failed to look up skill: {e}"))?
                        .ok_or_else(|| anyhow::anyhow!("Skill '{key}' not found"))?
                        .id,
                ),
                None => None,
            };
            let status = status
                .map(|s| s.parse::<ExecutionStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let filter = ExecutionFilter {
                skill_id,
                user_id: actor,
                customer_id: customer,
                status,
                limit: Some(limit),
            };
            handle_list(&filter, state, json).await
        }
        ExecutionCommand::Show { id } => {
            let Some(execution) = state.engine.get_execution(&id).await? else {
                bail!("Execution '{id}' not found");
            };
            print_execution(&execution, json)
        }
    }
}

async fn handle_list(filter: &ExecutionFilter, state: &AppState, json: bool) -> Result<()> {
    let executions = state.engine.list_executions(filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&executions)?);
        return Ok(());
    }

    if executions.is_empty() {
        println!();
        println!("  No executions found.");
        println!(
            "  Run a skill with: {}",
            style("skillflow run <skill> --input key=value").dim()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Execution").fg(Color::White),
            Cell::new("Skill").fg(Color::White),
            Cell::new("Status").fg(Color::White),
            Cell::new("Steps").fg(Color::White),
            Cell::new("Actor").fg(Color::White),
            Cell::new("Customer").fg(Color::White),
            Cell::new("Started").fg(Color::White),
            Cell::new("Duration").fg(Color::White),
        ]);

    for execution in &executions {
        table.add_row(vec![
            Cell::new(execution.id).fg(Color::DarkGrey),
            Cell::new(&execution.skill_name).fg(Color::Cyan),
            status_cell(execution.status),
            Cell::new(execution.step_results.len()),
            Cell::new(&execution.user_id),
            Cell::new(execution.customer_id.as_deref().unwrap_or("-")),
            Cell::new(execution.started_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format_duration(execution.duration_ms())),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

fn status_cell(status: ExecutionStatus) -> Cell {
    match status {
        ExecutionStatus::Completed => Cell::new("✓ completed").fg(Color::Green),
        ExecutionStatus::Failed => Cell::new("✗ failed").fg(Color::Red),
        ExecutionStatus::Running => Cell::new("● running").fg(Color::Yellow),
        ExecutionStatus::Pending => Cell::new("○ pending").fg(Color::DarkGrey),
        ExecutionStatus::Cancelled => Cell::new("◌ cancelled").fg(Color::DarkGrey),
    }
}

fn format_duration(ms: Option<i64>) -> String {
    match ms {
        None => "-".to_string(),
        Some(ms) if ms < 1000 => format!("{ms}ms"),
        Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
    }
}

/// Print an execution with its step log (or as JSON).
pub fn print_execution(execution: &Execution, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(execution)?);
        return Ok(());
    }

    let status = match execution.status {
        ExecutionStatus::Completed => style(execution.status.to_string()).green(),
        ExecutionStatus::Failed => style(execution.status.to_string()).red(),
        _ => style(execution.status.to_string()).yellow(),
    };

    println!();
    println!(
        "  {} {} {}",
        style("Execution").bold(),
        style(execution.id).dim(),
        status.bold()
    );
    println!("  Skill:     {}", style(&execution.skill_name).cyan());
    println!("  Actor:     {}", execution.user_id);
    if let Some(customer) = &execution.customer_id {
        println!("  Customer:  {customer}");
    }
    println!("  Started:   {}", execution.started_at.to_rfc3339());
    println!("  Duration:  {}", format_duration(execution.duration_ms()));
    if let Some(error) = &execution.error {
        println!("  Error:     {}", style(error).red());
    }

    if !execution.step_results.is_empty() {
        println!();
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("#"),
                Cell::new("Step").fg(Color::Cyan),
                Cell::new("Tool"),
                Cell::new("Status"),
                Cell::new("Attempts"),
                Cell::new("Duration"),
                Cell::new("Error"),
            ]);

        for (i, step) in execution.step_results.iter().enumerate() {
            let status = match step.status {
                StepStatus::Success => Cell::new("success").fg(Color::Green),
                StepStatus::Failed => Cell::new("failed").fg(Color::Red),
                StepStatus::Skipped => Cell::new("skipped").fg(Color::DarkGrey),
            };
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&step.step_name),
                Cell::new(&step.tool),
                status,
                Cell::new(step.attempts),
                Cell::new(format!("{}ms", step.duration_ms)),
                Cell::new(step.error.as_deref().unwrap_or("")),
            ]);
        }
        println!("{table}");
    }

    if let Some(output) = &execution.output {
        println!();
        println!("  {}", style("Output").bold());
        println!("{}", serde_json::to_string_pretty(output)?);
    }
    println!();

    Ok(())
}

//! CLI skill management subcommands.
//!
//! Import skill definition files into the catalog and inspect or remove
//! catalog entries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use skillflow_core::repository::skill::SkillCatalog;
use skillflow_core::skill::definition::{
    discover_skill_files, load_skill_file, serialize_skill_yaml,
};
use skillflow_infra::filesystem::skills_dir;
use skillflow_types::skill::{Skill, SkillFilter, SkillSource};

use crate::state::AppState;

/// Skill management subcommands.
#[derive(Subcommand)]
pub enum SkillCommand {
    /// Import skill definitions from a YAML/JSON file or a directory of them.
    Import {
        /// File or directory (defaults to `{data_dir}/skills`).
        path: Option<PathBuf>,

        /// Mark imported skills as system skills.
        #[arg(long)]
        system: bool,
    },

    /// List skills in the catalog.
    #[command(alias = "ls")]
    List {
        /// Filter by category.
        #[arg(long)]
        category: Option<String>,

        /// Filter by source (system, user).
        #[arg(long)]
        source: Option<String>,

        /// Filter by tag.
        #[arg(long)]
        tag: Option<String>,

        /// Only show enabled skills.
        #[arg(long)]
        enabled: bool,
    },

    /// Show a skill definition.
    Show {
        /// Skill UUID or name.
        skill: String,

        /// Print the definition as YAML.
        #[arg(long)]
        yaml: bool,
    },

    /// Delete a skill from the catalog.
    #[command(alias = "rm")]
    Delete {
        /// Skill UUID or name.
        skill: String,
    },

    /// Allow a skill to run.
    Enable {
        /// Skill UUID or name.
        skill: String,
    },

    /// Prevent a skill from running.
    Disable {
        /// Skill UUID or name.
        skill: String,
    },
}

/// Handle a skill subcommand.
pub async fn handle_skill_command(cmd: SkillCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        SkillCommand::Import { path, system } => {
            let path = path.unwrap_or_else(|| skills_dir(&state.data_dir));
            handle_import(&path, system, state, json).await
        }
        SkillCommand::List {
            category,
            source,
            tag,
            enabled,
        } => {
            let source = source
                .map(|s| s.parse::<SkillSource>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let filter = SkillFilter {
                category,
                source,
                enabled: enabled.then_some(true),
                tag,
            };
            handle_list(&filter, state, json).await
        }
        SkillCommand::Show { skill, yaml } => handle_show(&skill, yaml, state, json).await,
        SkillCommand::Delete { skill } => handle_delete(&skill, state, json).await,
        SkillCommand::Enable { skill } => handle_set_enabled(&skill, true, state, json).await,
        SkillCommand::Disable { skill } => handle_set_enabled(&skill, false, state, json).await,
    }
}

async fn require_skill(state: &AppState, key: &str) -> Result<Skill> {
    state
        .find_skill(key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to look up skill: {e}"))?
        .ok_or_else(|| anyhow::anyhow!("Skill '{key}' not found"))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Merge an imported definition with the catalog entry of the same name so
/// re-importing a file updates the skill in place.
fn merge_with_existing(mut skill: Skill, existing: Option<&Skill>, source: SkillSource) -> Skill {
    skill.source = source;
    skill.updated_at = Utc::now();
    if let Some(existing) = existing {
        skill.id = existing.id;
        skill.created_at = existing.created_at;
    }
    skill
}

async fn handle_import(path: &Path, system: bool, state: &AppState, json: bool) -> Result<()> {
    let files = if path.is_dir() {
        discover_skill_files(path)
            .with_context(|| format!("Failed to scan {}", path.display()))?
    } else if path.exists() {
        vec![path.to_path_buf()]
    } else {
        bail!("No such file or directory: {}", path.display());
    };

    let source = if system {
        SkillSource::System
    } else {
        SkillSource::User
    };

    let mut imported = Vec::new();
    let mut failures = Vec::new();
    for file in &files {
        let skill = match load_skill_file(file) {
            Ok(skill) => skill,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "skipping invalid skill file");
                failures.push((file.clone(), e.to_string()));
                continue;
            }
        };

        let existing = state
            .catalog()
            .get_by_name(&skill.name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to look up skill: {e}"))?;
        let updated = existing.is_some();
        let skill = merge_with_existing(skill, existing.as_ref(), source);

        state
            .catalog()
            .save(&skill)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to save skill '{}': {e}", skill.name))?;
        imported.push((skill, updated));
    }

    if json {
        let out = serde_json::json!({
            "imported": imported.iter().map(|(s, updated)| serde_json::json!({
                "id": s.id.to_string(),
                "name": s.name,
                "steps": s.steps.len(),
                "updated": updated,
            })).collect::<Vec<_>>(),
            "failed": failures.iter().map(|(p, e)| serde_json::json!({
                "path": p.display().to_string(),
                "error": e,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        if files.is_empty() {
            println!("  No skill files found in {}", style(path.display()).dim());
        }
        for (skill, updated) in &imported {
            println!(
                "  {} {} skill '{}' ({} step{})",
                style("*").green().bold(),
                if *updated { "Updated" } else { "Imported" },
                style(&skill.name).cyan(),
                skill.steps.len(),
                if skill.steps.len() == 1 { "" } else { "s" }
            );
        }
        for (file, error) in &failures {
            println!(
                "  {} {}: {}",
                style("x").red().bold(),
                file.display(),
                style(error).red()
            );
        }
        println!();
    }

    if !failures.is_empty() && imported.is_empty() {
        bail!("No skills imported ({} invalid file(s))", failures.len());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// List / show
// ---------------------------------------------------------------------------

async fn handle_list(filter: &SkillFilter, state: &AppState, json: bool) -> Result<()> {
    let skills = state
        .catalog()
        .list(filter)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list skills: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(());
    }

    if skills.is_empty() {
        println!();
        println!(
            "  {} No skills found. Import one with: {}",
            style("i").blue().bold(),
            style("skillflow skill import <file.yaml>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").fg(Color::White),
            Cell::new("Category").fg(Color::White),
            Cell::new("Source").fg(Color::White),
            Cell::new("Steps").fg(Color::White),
            Cell::new("Status").fg(Color::White),
            Cell::new("ID").fg(Color::White),
        ]);

    for skill in &skills {
        let status_cell = if skill.enabled {
            Cell::new("● enabled").fg(Color::Green)
        } else {
            Cell::new("○ disabled").fg(Color::Yellow)
        };
        let name = if skill.requires_approval {
            format!("{} (approval)", skill.name)
        } else {
            skill.name.clone()
        };

        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(&skill.category),
            Cell::new(skill.source),
            Cell::new(skill.steps.len()),
            status_cell,
            Cell::new(skill.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} skill{}",
        style(skills.len()).bold(),
        if skills.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

async fn handle_show(key: &str, yaml: bool, state: &AppState, json: bool) -> Result<()> {
    let skill = require_skill(state, key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skill)?);
        return Ok(());
    }
    if yaml {
        print!("{}", serialize_skill_yaml(&skill)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Skill").bold(), style(&skill.name).cyan().bold());
    if !skill.description.is_empty() {
        println!("  {}", style(&skill.description).dim());
    }
    println!();
    println!("  ID:        {}", skill.id);
    println!("  Category:  {}", skill.category);
    println!("  Source:    {}", skill.source);
    println!(
        "  Status:    {}",
        if skill.enabled {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        }
    );
    if skill.requires_approval {
        println!("  Approval:  {}", style("required").yellow());
    }
    if let Some(secs) = skill.estimated_duration_secs {
        println!("  Estimate:  ~{secs}s");
    }
    if !skill.tags.is_empty() {
        println!("  Tags:      {}", skill.tags.join(", "));
    }

    if !skill.inputs.is_empty() {
        println!();
        println!("  {}", style("Inputs").bold());
        for input in &skill.inputs {
            let mut line = format!("    {} ({})", style(&input.name).cyan(), input.input_type);
            if input.required {
                line.push_str(" required");
            }
            if let Some(default) = &input.default {
                line.push_str(&format!(" default={default}"));
            }
            if let Some(desc) = &input.description {
                line.push_str(&format!(" - {desc}"));
            }
            println!("{line}");
        }
    }

    println!();
    println!("  {}", style("Steps").bold());
    for (i, step) in skill.steps.iter().enumerate() {
        let mut flags = Vec::new();
        if step.condition.is_some() {
            flags.push("conditional".to_string());
        }
        if let Some(retry) = &step.retry {
            flags.push(format!("retry x{}", retry.max_attempts));
        }
        if step.continue_on_error {
            flags.push("continue on error".to_string());
        }
        if let Some(save_as) = step.result_handling.as_ref().and_then(|h| h.save_as.as_ref()) {
            flags.push(format!("-> {save_as}"));
        }
        println!(
            "    {}. {} {} {}",
            i + 1,
            style(step.label()).cyan(),
            style(format!("[{}]", step.tool)).dim(),
            style(flags.join(", ")).dim()
        );
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Delete / enable / disable
// ---------------------------------------------------------------------------

async fn handle_delete(key: &str, state: &AppState, json: bool) -> Result<()> {
    let skill = require_skill(state, key).await?;
    let deleted = state
        .catalog()
        .delete(&skill.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete skill: {e}"))?;

    if json {
        let out = serde_json::json!({"deleted": deleted, "id": skill.id.to_string()});
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Deleted skill '{}'",
            style("*").green().bold(),
            style(&skill.name).cyan()
        );
        println!();
    }
    Ok(())
}

async fn handle_set_enabled(key: &str, enabled: bool, state: &AppState, json: bool) -> Result<()> {
    let mut skill = require_skill(state, key).await?;
    skill.enabled = enabled;
    skill.updated_at = Utc::now();
    state
        .catalog()
        .save(&skill)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update skill: {e}"))?;

    if json {
        let out = serde_json::json!({"id": skill.id.to_string(), "enabled": enabled});
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Skill '{}' {}",
            style("*").green().bold(),
            style(&skill.name).cyan(),
            if enabled { "enabled" } else { "disabled" }
        );
        println!();
    }
    Ok(())
}

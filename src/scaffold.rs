//! Target project scaffolding
//!
//! Creates the target folder, its project file and the assembly metadata file
//! from embedded templates. Every item is only created when missing, so
//! running against an existing target leaves it untouched.

use chrono::Datelike;
use colored::Colorize;
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::context::SyncContext;
use crate::templating;

/// Folder holding the assembly metadata file
pub const PROPERTIES_DIR: &str = "Properties";

/// Assembly metadata file referenced by every generated project
pub const ASSEMBLY_INFO_FILE: &str = "AssemblyInfo.cs";

const ASSEMBLY_INFO_TEMPLATE: &str = include_str!("../templates/AssemblyInfoTemplate.txt");

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("No project template bundled for profile {key} (expected {template})")]
    MissingTemplate { key: String, template: String },
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of a scaffold operation
#[derive(Debug, Default)]
pub struct ScaffoldResult {
    /// Items created by this run (or that would be, in dry-run mode)
    pub created: Vec<PathBuf>,
    /// Items that already existed
    pub existing: Vec<PathBuf>,
}

/// Make sure the target folder, project file and metadata file exist.
pub fn ensure_target_project(
    ctx: &SyncContext,
    dry_run: bool,
) -> Result<ScaffoldResult, ScaffoldError> {
    let mut result = ScaffoldResult::default();

    ensure_dir(&ctx.target_dir, dry_run, &mut result)?;
    ensure_file(
        &ctx.manifest_path,
        || render_project(ctx),
        dry_run,
        &mut result,
    )?;

    let properties_dir = ctx.target_dir.join(PROPERTIES_DIR);
    ensure_dir(&properties_dir, dry_run, &mut result)?;
    ensure_file(
        &properties_dir.join(ASSEMBLY_INFO_FILE),
        || Ok(render_assembly_info(ctx)),
        dry_run,
        &mut result,
    )?;

    Ok(result)
}

/// Render the profile's project template for this run.
///
/// Each call generates a fresh project GUID. Names are inserted as XML
/// character data, escaped.
pub fn render_project(ctx: &SyncContext) -> Result<String, ScaffoldError> {
    let template =
        ctx.profile
            .project_template()
            .ok_or_else(|| ScaffoldError::MissingTemplate {
                key: ctx.profile.key.to_string(),
                template: ctx.profile.template_name(),
            })?;

    let vars = HashMap::from([
        ("project_guid", format!("{{{}}}", Uuid::new_v4())),
        ("root_namespace", escape(ctx.source_name()).into_owned()),
        ("assembly_name", escape(ctx.target_name.as_str()).into_owned()),
    ]);

    Ok(templating::substitute(template, &vars))
}

/// Render the assembly metadata file for this run.
pub fn render_assembly_info(ctx: &SyncContext) -> String {
    let vars = HashMap::from([
        ("title", ctx.source_name().to_string()),
        ("product", ctx.source_name().to_string()),
        ("year", chrono::Local::now().year().to_string()),
    ]);

    templating::substitute(ASSEMBLY_INFO_TEMPLATE, &vars)
}

fn ensure_dir(path: &Path, dry_run: bool, result: &mut ScaffoldResult) -> Result<(), ScaffoldError> {
    if path.is_dir() {
        result.existing.push(path.to_path_buf());
        return Ok(());
    }

    if dry_run {
        println!("  {} Would create directory: {}", "→".cyan(), path.display());
    } else {
        fs::create_dir_all(path).map_err(|source| ScaffoldError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
        println!("  {} Created directory: {}", "✔".green(), path.display());
    }

    result.created.push(path.to_path_buf());
    Ok(())
}

fn ensure_file(
    path: &Path,
    render: impl FnOnce() -> Result<String, ScaffoldError>,
    dry_run: bool,
    result: &mut ScaffoldResult,
) -> Result<(), ScaffoldError> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "Already present, not regenerating");
        result.existing.push(path.to_path_buf());
        return Ok(());
    }

    let content = render()?;

    if dry_run {
        println!("  {} Would create: {}", "→".cyan(), path.display());
    } else {
        fs::write(path, content).map_err(|source| ScaffoldError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
        println!("  {} Created: {}", "✔".green(), path.display());
    }

    result.created.push(path.to_path_buf());
    Ok(())
}

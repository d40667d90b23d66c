//! Per-run locations and naming
//!
//! Everything derived from the command line is resolved once here and passed
//! explicitly to the scaffolder, the mirror and the patcher.

use std::path::{Path, PathBuf};

use crate::paths;
use crate::profile::TemplateDescriptor;
use crate::source::{self, SourceError, SourceProject};

/// Locations and names for one alignment run
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Directory the tool was invoked from; the target folder is created here
    pub working_dir: PathBuf,
    /// Absolute source project folder
    pub source_dir: PathBuf,
    /// The validated source project
    pub source: SourceProject,
    /// `<source name>_<profile suffix>`
    pub target_name: String,
    pub target_dir: PathBuf,
    /// `<target_dir>/<target_name>.csproj`
    pub manifest_path: PathBuf,
    pub profile: &'static TemplateDescriptor,
}

impl SyncContext {
    /// Resolve `source` against `working_dir`, validate it and derive the
    /// target naming for `profile`.
    pub fn new(
        working_dir: &Path,
        source: &Path,
        profile: &'static TemplateDescriptor,
    ) -> Result<Self, SourceError> {
        let working_dir = paths::normalize(working_dir);
        let source_dir = paths::normalize(&working_dir.join(source));
        let project = source::validate_source(&source_dir)?;

        let target_name = format!("{}_{}", project.name, profile.folder_suffix);
        let target_dir = working_dir.join(&target_name);
        let manifest_path = target_dir.join(format!("{target_name}.csproj"));

        Ok(Self {
            working_dir,
            source_dir,
            source: project,
            target_name,
            target_dir,
            manifest_path,
            profile,
        })
    }

    /// Name of the source project
    pub fn source_name(&self) -> &str {
        &self.source.name
    }
}

//! Source project validation

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension of the project file that marks a source folder
pub const PROJECT_MARKER_EXTENSION: &str = "xproj";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("The source path does not exist: {0}")]
    NotFound(PathBuf),
    #[error("Could not find any suitable .Net Core project (*.xproj) in {0}")]
    NoProject(PathBuf),
    #[error("Found {count} projects in {path}: must specify the exact source")]
    MultipleProjects { path: PathBuf, count: usize },
    #[error("Failed to scan source folder {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// The project found in a source folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProject {
    /// Project name (marker file name without extension)
    pub name: String,
    /// Path to the marker file
    pub marker: PathBuf,
}

/// Check that `source_dir` exists and holds exactly one project marker file
/// at its top level.
pub fn validate_source(source_dir: &Path) -> Result<SourceProject, SourceError> {
    if !source_dir.is_dir() {
        return Err(SourceError::NotFound(source_dir.to_path_buf()));
    }

    let mut markers = Vec::new();
    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| SourceError::Scan {
            path: source_dir.to_path_buf(),
            source,
        })?;
        let is_marker = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_MARKER_EXTENSION));
        if is_marker {
            markers.push(entry.into_path());
        }
    }

    match markers.len() {
        0 => Err(SourceError::NoProject(source_dir.to_path_buf())),
        1 => {
            let marker = markers.remove(0);
            let name = marker
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(SourceProject { name, marker })
        }
        count => Err(SourceError::MultipleProjects {
            path: source_dir.to_path_buf(),
            count,
        }),
    }
}

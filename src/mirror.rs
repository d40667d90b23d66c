//! Source tree mirroring
//!
//! Walks the source project folder, reproduces its directory structure under
//! the target folder and collects one [`LinkDescriptor`] per tracked file.
//! File contents are never copied: the target project references them through
//! linked `Compile` items instead.

use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::paths::{self, PathError};

/// Directory names skipped by default (compared case-insensitively)
pub const DEFAULT_IGNORE_DIRS: &[&str] = &["properties", "bin", "obj"];

/// File extensions collected by default
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cs"];

/// Which directories the ignore list applies to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IgnoreScope {
    /// Only immediate children of the source root are matched
    #[default]
    TopLevel,
    /// Matching directories are skipped at any depth
    Recursive,
}

/// Options for the mirror operation
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Directory names to skip
    pub ignore_dirs: Vec<String>,
    /// File extensions to collect, with or without the leading dot
    pub extensions: Vec<String>,
    /// Depth at which `ignore_dirs` is honored
    pub ignore_scope: IgnoreScope,
    /// Visit entries in file name order instead of filesystem order
    pub sort_entries: bool,
    /// Show what would be done without making changes
    pub dry_run: bool,
    /// Show detailed output
    pub verbose: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_scope: IgnoreScope::default(),
            sort_entries: true,
            dry_run: false,
            verbose: false,
        }
    }
}

/// A source file to be referenced by the target project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Path from the target root to the physical file
    pub include: String,
    /// Path under which the file appears in the target's logical tree
    pub alias: String,
}

/// Result of a mirror operation
#[derive(Debug, Default)]
pub struct MirrorResult {
    pub links: Vec<LinkDescriptor>,
    pub dirs_created: usize,
    pub dirs_ignored: usize,
    pub files_skipped: usize,
}

impl MirrorResult {
    fn merge(&mut self, other: MirrorResult) {
        self.links.extend(other.links);
        self.dirs_created += other.dirs_created;
        self.dirs_ignored += other.dirs_ignored;
        self.files_skipped += other.files_skipped;
    }
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("File system entry not supported: {0}")]
    UnsupportedEntry(PathBuf),
    #[error("Path is not valid UTF-8 and cannot be referenced from a project file: {0}")]
    NonUtf8Path(PathBuf),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Mirror `source_root` into `target_root` and collect link descriptors.
///
/// Descriptors come out depth-first: everything below a directory precedes
/// that directory's later siblings. When `target_root` lies inside
/// `source_root` it is left out of the walk.
pub fn align_tree(
    source_root: &Path,
    target_root: &Path,
    options: &MirrorOptions,
) -> Result<MirrorResult, MirrorError> {
    let walker = TreeWalker::new(target_root, options)?;
    let ignore: Vec<String> = options
        .ignore_dirs
        .iter()
        .map(|d| d.to_lowercase())
        .collect();

    walker.align_dir(source_root, target_root, Path::new(""), &ignore)
}

struct TreeWalker<'a> {
    options: &'a MirrorOptions,
    target_root: PathBuf,
    /// Target root rendered as a directory location
    include_base: String,
    extensions: Vec<String>,
}

impl<'a> TreeWalker<'a> {
    fn new(target_root: &Path, options: &'a MirrorOptions) -> Result<Self, MirrorError> {
        let target_root = paths::normalize(target_root);
        let mut include_base = utf8(&target_root)?.to_string();
        if !include_base.ends_with(MAIN_SEPARATOR) {
            include_base.push(MAIN_SEPARATOR);
        }

        let extensions = options
            .extensions
            .iter()
            .map(|e| {
                let e = e.to_lowercase();
                if e.starts_with('.') { e } else { format!(".{e}") }
            })
            .collect();

        Ok(Self {
            options,
            target_root,
            include_base,
            extensions,
        })
    }

    fn align_dir(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        alias_prefix: &Path,
        ignore: &[String],
    ) -> Result<MirrorResult, MirrorError> {
        let mut result = MirrorResult::default();

        let mut walker = WalkDir::new(source_dir).min_depth(1).max_depth(1);
        if self.options.sort_entries {
            walker = walker.sort_by_file_name();
        }

        for entry in walker {
            let entry = entry.map_err(|source| MirrorError::ReadDir {
                path: source_dir.to_path_buf(),
                source,
            })?;
            let file_type = entry.file_type();
            let name = entry.file_name();

            if file_type.is_dir() {
                let lowered = name.to_string_lossy().to_lowercase();
                if ignore.contains(&lowered) {
                    tracing::debug!(dir = %entry.path().display(), "Ignoring directory");
                    result.dirs_ignored += 1;
                    continue;
                }
                if paths::normalize(entry.path()) == self.target_root {
                    tracing::debug!(dir = %entry.path().display(), "Skipping target folder");
                    result.dirs_ignored += 1;
                    continue;
                }

                let target_child = target_dir.join(name);
                if self.ensure_dir(&target_child)? {
                    result.dirs_created += 1;
                }

                let child_ignore: &[String] = match self.options.ignore_scope {
                    IgnoreScope::TopLevel => &[],
                    IgnoreScope::Recursive => ignore,
                };
                let child = self.align_dir(
                    entry.path(),
                    &target_child,
                    &alias_prefix.join(name),
                    child_ignore,
                )?;
                result.merge(child);
            } else if file_type.is_file() {
                if !self.is_tracked(entry.path()) {
                    result.files_skipped += 1;
                    continue;
                }

                let include = paths::relative_path(&self.include_base, utf8(entry.path())?)?;
                let alias = utf8(&alias_prefix.join(name))?.to_string();
                tracing::debug!(%include, %alias, "Collected link");
                result.links.push(LinkDescriptor { include, alias });
            } else {
                return Err(MirrorError::UnsupportedEntry(entry.path().to_path_buf()));
            }
        }

        Ok(result)
    }

    fn is_tracked(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Returns whether the directory had to be created.
    fn ensure_dir(&self, dir: &Path) -> Result<bool, MirrorError> {
        if dir.is_dir() {
            return Ok(false);
        }

        if self.options.dry_run {
            if self.options.verbose {
                println!("  {} Would create directory: {}", "→".cyan(), dir.display());
            }
        } else {
            fs::create_dir_all(dir).map_err(|source| MirrorError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            if self.options.verbose {
                println!("  {} Created directory: {}", "✔".green(), dir.display());
            }
        }

        Ok(true)
    }
}

fn utf8(path: &Path) -> Result<&str, MirrorError> {
    path.to_str()
        .ok_or_else(|| MirrorError::NonUtf8Path(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// test").unwrap();
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Lib");
        let target = temp_dir.path().join("Lib_PORTABLE");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        (temp_dir, source, target)
    }

    fn aliases(result: &MirrorResult) -> Vec<String> {
        result.links.iter().map(|l| l.alias.clone()).collect()
    }

    fn alias(parts: &[&str]) -> String {
        parts
            .iter()
            .collect::<PathBuf>()
            .to_string_lossy()
            .into_owned()
    }

    // ==========================================================================
    // COLLECTION TESTS
    // ==========================================================================

    #[test]
    fn test_collects_tracked_files_only() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Program.cs");
        write(&source, "Lib.xproj");
        write(&source, "project.json");
        write(&source, "Models/User.cs");
        write(&source, "Models/readme.md");

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(
            aliases(&result),
            vec![alias(&["Models", "User.cs"]), alias(&["Program.cs"])]
        );
        assert_eq!(result.files_skipped, 3);
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Upper.CS");
        write(&source, "lower.cs");

        let options = MirrorOptions {
            extensions: vec!["CS".to_string()],
            ..Default::default()
        };
        let result = align_tree(&source, &target, &options).unwrap();

        assert_eq!(result.links.len(), 2);
    }

    #[test]
    #[cfg(unix)]
    fn test_include_is_relative_to_target_root() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Models/User.cs");

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(
            result.links,
            vec![LinkDescriptor {
                include: "../Lib/Models/User.cs".to_string(),
                alias: "Models/User.cs".to_string(),
            }]
        );
    }

    #[test]
    fn test_depth_first_order() {
        let (_temp_dir, source, target) = setup();
        write(&source, "a/inner/deep.cs");
        write(&source, "a/one.cs");
        write(&source, "b.cs");
        write(&source, "c/two.cs");

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(
            aliases(&result),
            vec![
                alias(&["a", "inner", "deep.cs"]),
                alias(&["a", "one.cs"]),
                alias(&["b.cs"]),
                alias(&["c", "two.cs"]),
            ]
        );
    }

    #[test]
    fn test_every_tracked_file_appears_once() {
        let (_temp_dir, source, target) = setup();
        let files = [
            "A.cs",
            "x/B.cs",
            "x/y/C.cs",
            "x/y/z/D.cs",
            "w/E.cs",
            "w/F.txt",
        ];
        for file in files {
            write(&source, file);
        }

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();
        let collected = aliases(&result);

        for file in files.iter().filter(|f| f.ends_with(".cs")) {
            let expected = alias(&file.split('/').collect::<Vec<_>>());
            assert_eq!(collected.iter().filter(|a| **a == expected).count(), 1);
        }
        assert_eq!(collected.len(), 5);
    }

    // ==========================================================================
    // DIRECTORY MIRRORING TESTS
    // ==========================================================================

    #[test]
    fn test_mirrors_directory_structure() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Models/Dto/Item.cs");
        fs::create_dir_all(source.join("Empty")).unwrap();

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert!(target.join("Models").is_dir());
        assert!(target.join("Models").join("Dto").is_dir());
        assert!(target.join("Empty").is_dir());
        assert_eq!(result.dirs_created, 3);
        // No file content is copied
        assert!(!target.join("Models").join("Dto").join("Item.cs").exists());
    }

    #[test]
    fn test_existing_directories_are_left_alone() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Models/User.cs");
        fs::create_dir_all(target.join("Models")).unwrap();
        fs::write(target.join("Models").join("keep.txt"), "mine").unwrap();

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(result.dirs_created, 0);
        assert_eq!(
            fs::read_to_string(target.join("Models").join("keep.txt")).unwrap(),
            "mine"
        );
    }

    #[test]
    fn test_dry_run_does_not_create_directories() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Models/User.cs");

        let options = MirrorOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = align_tree(&source, &target, &options).unwrap();

        assert!(!target.join("Models").exists());
        assert_eq!(result.dirs_created, 1);
        assert_eq!(result.links.len(), 1);
    }

    // ==========================================================================
    // IGNORE SCOPE TESTS
    // ==========================================================================

    #[test]
    fn test_ignore_applies_to_top_level_only_by_default() {
        let (_temp_dir, source, target) = setup();
        write(&source, "bin/Generated.cs");
        write(&source, "sub/bin/Nested.cs");
        write(&source, "OBJ/Temp.cs");

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(aliases(&result), vec![alias(&["sub", "bin", "Nested.cs"])]);
        assert_eq!(result.dirs_ignored, 2);
        assert!(!target.join("bin").exists());
        assert!(target.join("sub").join("bin").is_dir());
    }

    #[test]
    fn test_recursive_ignore_scope() {
        let (_temp_dir, source, target) = setup();
        write(&source, "bin/Generated.cs");
        write(&source, "sub/bin/Nested.cs");
        write(&source, "sub/Kept.cs");

        let options = MirrorOptions {
            ignore_scope: IgnoreScope::Recursive,
            ..Default::default()
        };
        let result = align_tree(&source, &target, &options).unwrap();

        assert_eq!(aliases(&result), vec![alias(&["sub", "Kept.cs"])]);
        assert!(!target.join("sub").join("bin").exists());
    }

    #[test]
    fn test_target_inside_source_is_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Lib");
        let target = source.join("Lib_PORTABLE");
        write(&source, "Program.cs");
        write(&target, "Properties/AssemblyInfo.cs");
        write(&target, "Generated.cs");

        let result = align_tree(&source, &target, &MirrorOptions::default()).unwrap();

        assert_eq!(aliases(&result), vec![alias(&["Program.cs"])]);
        assert_eq!(result.dirs_created, 0);
        assert!(!target.join("Lib_PORTABLE").exists());
    }

    // ==========================================================================
    // ENTRY KIND TESTS
    // ==========================================================================

    #[test]
    #[cfg(unix)]
    fn test_symlink_entries_are_rejected() {
        let (_temp_dir, source, target) = setup();
        write(&source, "Real.cs");
        std::os::unix::fs::symlink(source.join("Real.cs"), source.join("Alias.cs")).unwrap();

        let err = align_tree(&source, &target, &MirrorOptions::default()).unwrap_err();

        assert!(matches!(err, MirrorError::UnsupportedEntry(p) if p.ends_with("Alias.cs")));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_non_utf8_file_name_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp_dir, source, target) = setup();
        let name = OsStr::from_bytes(b"Bad\xff.cs");
        fs::write(source.join(name), "// test").unwrap();

        let err = align_tree(&source, &target, &MirrorOptions::default()).unwrap_err();

        assert!(matches!(err, MirrorError::NonUtf8Path(p) if p.ends_with(name)));
    }

    #[test]
    fn test_missing_source_fails() {
        let (temp_dir, _source, target) = setup();

        let err = align_tree(
            &temp_dir.path().join("missing"),
            &target,
            &MirrorOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, MirrorError::ReadDir { .. }));
    }
}

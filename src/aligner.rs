//! Target project alignment
//!
//! Runs the three steps of a sync: scaffold the target project, mirror the
//! source tree, then patch the target's managed `ItemGroup`.

use std::path::Path;

use crate::context::SyncContext;
use crate::error::Error;
use crate::manifest::{self, PatchResult};
use crate::mirror::{self, LinkDescriptor, MirrorOptions, MirrorResult};
use crate::scaffold::{self, ScaffoldResult};

/// Result of a full alignment run
#[derive(Debug)]
pub struct AlignResult {
    pub scaffold: ScaffoldResult,
    pub mirror: MirrorResult,
    /// `None` when a dry run had no project file to patch yet
    pub patch: Option<PatchResult>,
}

/// Aligns one target project with its source
pub struct Aligner {
    context: SyncContext,
    options: MirrorOptions,
}

impl Aligner {
    pub fn new(context: SyncContext, options: MirrorOptions) -> Self {
        Self { context, options }
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Path of the target project file
    pub fn manifest_path(&self) -> &Path {
        &self.context.manifest_path
    }

    /// Create whatever part of the target project is missing
    pub fn scaffold(&self) -> Result<ScaffoldResult, Error> {
        Ok(scaffold::ensure_target_project(
            &self.context,
            self.options.dry_run,
        )?)
    }

    /// Mirror the source directory structure and collect links
    pub fn mirror(&self) -> Result<MirrorResult, Error> {
        Ok(mirror::align_tree(
            &self.context.source_dir,
            &self.context.target_dir,
            &self.options,
        )?)
    }

    /// Rewrite the target project's managed group with `links`
    pub fn patch(&self, links: &[LinkDescriptor]) -> Result<Option<PatchResult>, Error> {
        if self.options.dry_run && !self.context.manifest_path.exists() {
            tracing::debug!(
                path = %self.context.manifest_path.display(),
                "Project file not scaffolded yet; nothing to patch in dry-run mode"
            );
            return Ok(None);
        }

        let result =
            manifest::patch_manifest(&self.context.manifest_path, links, self.options.dry_run)?;
        Ok(Some(result))
    }

    /// Perform all three steps
    pub fn run(&self) -> Result<AlignResult, Error> {
        let scaffold = self.scaffold()?;
        let mirror = self.mirror()?;
        let patch = self.patch(&mirror.links)?;

        Ok(AlignResult {
            scaffold,
            mirror,
            patch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{InsertionPoint, ManifestError};
    use crate::mirror::IgnoreScope;
    use crate::profile;
    use crate::scaffold::{ASSEMBLY_INFO_FILE, PROPERTIES_DIR};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// source").unwrap();
    }

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Lib");
        write(&source, "Lib.xproj");
        write(&source, "Program.cs");
        write(&source, "Models/User.cs");
        write(&source, "Properties/AssemblyInfo.cs");
        write(&source, "bin/Debug/Generated.cs");
        write(&source, "Models/bin/Kept.cs");
        write(&source, "project.json");
        temp_dir
    }

    fn make_aligner(temp_dir: &TempDir, options: MirrorOptions) -> Aligner {
        let ctx = SyncContext::new(
            temp_dir.path(),
            Path::new("Lib"),
            profile::default_profile(),
        )
        .unwrap();
        Aligner::new(ctx, options)
    }

    fn compile_count(path: &Path) -> usize {
        fs::read_to_string(path)
            .unwrap()
            .matches("<Compile ")
            .count()
    }

    #[test]
    fn test_run_aligns_new_target() {
        let temp_dir = setup();
        let aligner = make_aligner(&temp_dir, MirrorOptions::default());

        let result = aligner.run().unwrap();

        assert_eq!(result.scaffold.created.len(), 4);
        assert_eq!(result.mirror.links.len(), 3);
        let patch = result.patch.unwrap();
        assert_eq!(patch.insertion, InsertionPoint::Tracked(0));
        // Template's own AssemblyInfo item is replaced by the fixed entry
        assert_eq!(patch.removed, 1);
        assert_eq!(compile_count(aligner.manifest_path()), 4);

        let target = temp_dir.path().join("Lib_PORTABLE");
        assert!(target.join("Models").join("bin").is_dir());
        assert!(!target.join("bin").exists());
        assert!(target.join(PROPERTIES_DIR).join(ASSEMBLY_INFO_FILE).is_file());
    }

    #[test]
    fn test_rerun_keeps_scaffold_and_repopulates() {
        let temp_dir = setup();
        let aligner = make_aligner(&temp_dir, MirrorOptions::default());
        aligner.run().unwrap();
        let first = fs::read_to_string(aligner.manifest_path()).unwrap();

        let result = aligner.run().unwrap();
        let second = fs::read_to_string(aligner.manifest_path()).unwrap();

        assert!(result.scaffold.created.is_empty());
        assert_eq!(result.mirror.dirs_created, 0);
        assert_eq!(result.patch.unwrap().removed, 4);
        // Same project GUID: the project file was patched, not regenerated
        assert_eq!(first, second);
    }

    #[test]
    fn test_rerun_picks_up_new_files() {
        let temp_dir = setup();
        let aligner = make_aligner(&temp_dir, MirrorOptions::default());
        aligner.run().unwrap();

        write(&temp_dir.path().join("Lib"), "Services/Mailer.cs");
        fs::remove_file(temp_dir.path().join("Lib").join("Program.cs")).unwrap();
        aligner.run().unwrap();

        let content = fs::read_to_string(aligner.manifest_path()).unwrap();
        assert!(content.contains("Mailer.cs"));
        assert!(!content.contains("Program.cs"));
        assert_eq!(compile_count(aligner.manifest_path()), 4);
    }

    #[test]
    fn test_source_as_working_directory() {
        let temp_dir = setup();
        let source = temp_dir.path().join("Lib");
        let ctx =
            SyncContext::new(&source, Path::new("."), profile::default_profile()).unwrap();
        let aligner = Aligner::new(ctx, MirrorOptions::default());

        let result = aligner.run().unwrap();

        let target = source.join("Lib_PORTABLE");
        assert_eq!(aligner.context().target_dir, target);
        assert!(target.join("Lib_PORTABLE.csproj").is_file());
        assert!(!target.join("Lib_PORTABLE").exists());
        assert_eq!(result.mirror.links.len(), 3);
        assert!(
            result
                .mirror
                .links
                .iter()
                .all(|l| !l.alias.starts_with("Lib_PORTABLE"))
        );
        assert_eq!(compile_count(aligner.manifest_path()), 4);
    }

    #[test]
    fn test_recursive_ignore_scope_option() {
        let temp_dir = setup();
        let options = MirrorOptions {
            ignore_scope: IgnoreScope::Recursive,
            ..Default::default()
        };
        let aligner = make_aligner(&temp_dir, options);

        let result = aligner.run().unwrap();

        assert_eq!(result.mirror.links.len(), 2);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = setup();
        let options = MirrorOptions {
            dry_run: true,
            ..Default::default()
        };
        let aligner = make_aligner(&temp_dir, options);

        let result = aligner.run().unwrap();

        assert!(result.patch.is_none());
        assert_eq!(result.mirror.links.len(), 3);
        assert!(!temp_dir.path().join("Lib_PORTABLE").exists());
    }

    #[test]
    fn test_unusable_project_file_is_a_structural_error() {
        let temp_dir = setup();
        let aligner = make_aligner(&temp_dir, MirrorOptions::default());
        fs::create_dir_all(&aligner.context().target_dir).unwrap();
        fs::write(
            aligner.manifest_path(),
            r#"<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003"><PropertyGroup /></Project>"#,
        )
        .unwrap();

        let err = aligner.run().unwrap_err();

        assert!(matches!(
            err,
            Error::Manifest(ManifestError::NoInsertionPoint)
        ));
    }
}

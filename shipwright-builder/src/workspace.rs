//! Workspace materializer
//!
//! Every app gets its own working directory under the working root, cloned
//! from the shared project template the first time the app is built. Later
//! builds reuse the directory as-is so local changes outside the content
//! packs survive.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};
use crate::packager::PACKS_DIR;

const MAX_APP_ID_LEN: usize = 128;

/// A materialized per-app working directory
#[derive(Debug, Clone)]
pub struct Workspace {
    pub app_id: String,
    pub dir: PathBuf,
    /// True only for the call that created the directory
    pub is_new: bool,
    /// Per-entry outcomes of the template copy (empty for existing workspaces)
    pub outcomes: Vec<CopyOutcome>,
}

impl Workspace {
    /// Entries of the template copy that could not be duplicated
    pub fn failures(&self) -> impl Iterator<Item = &CopyOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Result of copying one template entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    DirCreated(PathBuf),
    Copied(PathBuf),
    /// Destination file already existed and was left untouched
    AlreadyPresent(PathBuf),
    Failed { path: PathBuf, error: String },
}

impl CopyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CopyOutcome::Failed { .. })
    }
}

/// Checks that an app id can be used as a single directory name
pub fn validate_app_id(app_id: &str) -> Result<()> {
    if app_id.is_empty() {
        return Err(BuildError::InvalidAppId("app id cannot be empty".to_string()));
    }

    if app_id.len() > MAX_APP_ID_LEN {
        return Err(BuildError::InvalidAppId(format!(
            "app id is too long (max {} characters)",
            MAX_APP_ID_LEN
        )));
    }

    if app_id == "." || app_id == ".." {
        return Err(BuildError::InvalidAppId(format!("'{}' is reserved", app_id)));
    }

    if let Some(c) = app_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(BuildError::InvalidAppId(format!(
            "'{}' contains unsupported character {:?}",
            app_id, c
        )));
    }

    Ok(())
}

/// Ensures the workspace for `app_id` exists, cloning the template on first use
///
/// # Arguments
/// * `app_id` - The app identifier, used as the directory name
/// * `template_dir` - Read-only project template
/// * `working_root` - Directory holding all app workspaces
///
/// # Returns
/// The workspace directory and whether this call created it
pub fn ensure_workspace(app_id: &str, template_dir: &Path, working_root: &Path) -> Result<Workspace> {
    validate_app_id(app_id)?;

    if !template_dir.is_dir() {
        return Err(BuildError::Configuration(format!(
            "template directory {} does not exist",
            template_dir.display()
        )));
    }

    let dir = working_root.join(app_id);

    fs::create_dir_all(working_root).map_err(|e| BuildError::io(working_root, e))?;

    match fs::create_dir(&dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!("Reusing workspace {} for app {}", dir.display(), app_id);
            return Ok(Workspace {
                app_id: app_id.to_string(),
                dir,
                is_new: false,
                outcomes: Vec::new(),
            });
        }
        Err(e) => return Err(BuildError::io(&dir, e)),
    }

    info!(
        "Creating workspace {} for app {} from template {}",
        dir.display(),
        app_id,
        template_dir.display()
    );

    let outcomes = copy_tree(template_dir, &dir, &[Path::new(PACKS_DIR)]);

    let mut copied = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match outcome {
            CopyOutcome::Copied(_) => copied += 1,
            CopyOutcome::Failed { path, error } => {
                failed += 1;
                warn!("Failed to copy template entry {}: {}", path.display(), error);
            }
            _ => {}
        }
    }

    info!(
        "Workspace for app {} ready: {} file(s) copied, {} failure(s)",
        app_id, copied, failed
    );

    Ok(Workspace {
        app_id: app_id.to_string(),
        dir,
        is_new: true,
        outcomes,
    })
}

/// Recursively copies `src` into `dst`
///
/// Directories are always created, even when empty. Files that already
/// exist at the destination are left untouched. Entries whose path relative
/// to `src` starts with one of `exclude` are skipped along with their
/// children. A failure on one entry does not stop the walk; it is reported
/// in the returned outcomes and the caller decides what to do with it.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&Path]) -> Vec<CopyOutcome> {
    let is_excluded = |path: &Path| {
        path.strip_prefix(src)
            .map(|rel| exclude.iter().any(|ex| rel.starts_with(ex)))
            .unwrap_or(false)
    };

    let mut outcomes = Vec::new();

    for entry in WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                outcomes.push(CopyOutcome::Failed {
                    path: e.path().unwrap_or(src).to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(e) => {
                outcomes.push(CopyOutcome::Failed {
                    path: entry.path().to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let target = dst.join(rel);

        let outcome = if entry.file_type().is_dir() {
            match fs::create_dir_all(&target) {
                Ok(()) => CopyOutcome::DirCreated(target),
                Err(e) => CopyOutcome::Failed {
                    path: target,
                    error: e.to_string(),
                },
            }
        } else if target.exists() {
            CopyOutcome::AlreadyPresent(target)
        } else {
            match fs::copy(entry.path(), &target) {
                Ok(_) => CopyOutcome::Copied(target),
                Err(e) => CopyOutcome::Failed {
                    path: target,
                    error: e.to_string(),
                },
            }
        };

        outcomes.push(outcome);
    }

    outcomes
}

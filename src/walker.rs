//! Recursive traversal of the source directory.
//!
//! [`DirectoryWalker`] visits every regular file below the source directory in
//! file-name order and hands each one to [`FileOrganizer`]. Files are handled
//! one at a time; a failure is reported and recorded, then the walk moves on.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::config::CompiledFilters;
use crate::file_category::{Category, classify};
use crate::file_organizer::{ConflictPolicy, FileOrganizer, MoveRecord, OrganizeResult};
use crate::output::OutputFormatter;
use crate::report::RunSummary;

/// The source directory itself could not be walked.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to read {}: {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// How files are moved during a walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub conflict_policy: ConflictPolicy,
    /// Plan and print moves without touching the filesystem.
    pub dry_run: bool,
}

/// Walks a source tree and organizes every regular file in it.
#[derive(Debug, Clone, Default)]
pub struct DirectoryWalker {
    filters: CompiledFilters,
    options: WalkOptions,
}

impl DirectoryWalker {
    pub fn new(filters: CompiledFilters, options: WalkOptions) -> Self {
        Self { filters, options }
    }

    /// Moves every regular file under `source_dir` into
    /// `target_root/<category>/`.
    ///
    /// Symlinks are neither followed nor moved. Category directories under
    /// `target_root` are never descended into, so the target may be the source
    /// itself or lie inside it.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError`] only when `source_dir` itself cannot be read.
    /// Everything below the root is reported per entry in the summary.
    pub fn organize(
        &self,
        source_dir: &Path,
        target_root: &Path,
    ) -> Result<RunSummary, WalkError> {
        info!(
            "organizing {} into {}{}",
            source_dir.display(),
            target_root.display(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        let category_dirs = resolved_category_dirs(target_root);
        let mut summary = RunSummary::default();
        let mut planned = HashSet::new();

        let entries = WalkDir::new(source_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_category_dir(entry, &category_dirs));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(WalkError::Traversal {
                        path: source_dir.to_path_buf(),
                        source: err,
                    });
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| source_dir.to_path_buf(), Path::to_path_buf);
                    warn!("skipping unreadable entry {}", path.display());
                    OutputFormatter::error(&err.to_string());
                    summary.record_failure(path, err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .unwrap_or_else(|_| entry.path());
            if !self.filters.should_include(relative) {
                debug!("filtered out {}", entry.path().display());
                summary.skipped += 1;
                continue;
            }

            self.organize_file(entry.path(), target_root, &mut planned, &mut summary);
        }

        info!(
            "walk finished: {} moved, {} failed, {} skipped",
            summary.moved(),
            summary.failed(),
            summary.skipped
        );
        Ok(summary)
    }

    fn organize_file(
        &self,
        file: &Path,
        target_root: &Path,
        planned: &mut HashSet<PathBuf>,
        summary: &mut RunSummary,
    ) {
        let category = classify(file);

        match self.move_or_plan(file, target_root, category, planned) {
            Ok(record) => summary.record_move(record),
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                summary.record_failure(file.to_path_buf(), e.to_string());
            }
        }
    }

    fn move_or_plan(
        &self,
        file: &Path,
        target_root: &Path,
        category: Category,
        planned: &mut HashSet<PathBuf>,
    ) -> OrganizeResult<MoveRecord> {
        let policy = self.options.conflict_policy;
        if !self.options.dry_run {
            return FileOrganizer::move_to_category(file, target_root, category, policy);
        }

        // Nothing moves in a dry run, so earlier plans must count as taken.
        let destination =
            FileOrganizer::plan_destination_with(file, target_root, category, policy, |path| {
                planned.contains(path) || fs::symlink_metadata(path).is_ok()
            })?;
        planned.insert(destination.clone());
        OutputFormatter::would_move(file, &destination);
        Ok(MoveRecord {
            source: file.to_path_buf(),
            destination,
            category,
        })
    }
}

/// Canonical paths of every `<target>/<Category>` directory, whether or not it
/// exists yet.
fn resolved_category_dirs(target_root: &Path) -> HashSet<PathBuf> {
    let target = resolve_path(target_root);
    Category::ALL
        .iter()
        .map(|category| target.join(category.dir_name()))
        .collect()
}

fn is_category_dir(entry: &DirEntry, category_dirs: &HashSet<PathBuf>) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name();
    if !Category::ALL.iter().any(|c| name == c.dir_name()) {
        return false;
    }

    fs::canonicalize(entry.path())
        .map(|canonical| category_dirs.contains(&canonical))
        .unwrap_or(false)
}

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// rest, so paths that do not exist yet still compare against canonical ones.
fn resolve_path(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

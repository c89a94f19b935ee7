//! Moving single files into their category directory.
//!
//! [`FileOrganizer`] creates `<target>/<category>` on demand and renames the
//! file into it. It never copies and never rolls back: a failed rename leaves
//! the file where it was and reports why.

use clap::ValueEnum;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_category::Category;
use crate::output::OutputFormatter;

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the file in place and report the conflict.
    #[default]
    Error,
    /// Replace the existing destination file.
    Overwrite,
    /// Pick the first free `name (N).ext` in the category directory.
    Rename,
}

/// One file moved (or, in a dry run, planned to move) into a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// Where the file was found.
    pub source: PathBuf,
    /// Where the file ended up.
    pub destination: PathBuf,
    /// The category the file was sorted into.
    pub category: Category,
}

/// Errors that can occur while moving one file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The rename itself failed.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The destination exists and the policy forbids replacing it.
    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },
    /// The path has no final component to reuse as the destination name.
    #[error("Path has no file name: {}", .path.display())]
    MissingFileName { path: PathBuf },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves files into category subdirectories of a target root.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `file_path` into `target_root/<category>/` and records the move.
    ///
    /// The category directory (and any missing parent, including the target
    /// root itself) is created first. The progress line is printed before the
    /// rename is attempted.
    ///
    /// # Errors
    ///
    /// Returns an [`OrganizeError`] if the directory cannot be created, the
    /// destination conflicts under [`ConflictPolicy::Error`], or the rename
    /// fails. The file is left untouched in every error case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use smart_organizer::file_category::Category;
    /// use smart_organizer::file_organizer::{ConflictPolicy, FileOrganizer};
    /// use std::path::Path;
    ///
    /// let result = FileOrganizer::move_to_category(
    ///     Path::new("/downloads/photo.png"),
    ///     Path::new("/sorted"),
    ///     Category::Images,
    ///     ConflictPolicy::Error,
    /// );
    ///
    /// match result {
    ///     Ok(record) => println!("Moved to {}", record.destination.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_to_category(
        file_path: &Path,
        target_root: &Path,
        category: Category,
        policy: ConflictPolicy,
    ) -> OrganizeResult<MoveRecord> {
        let category_path = target_root.join(category.dir_name());

        fs::create_dir_all(&category_path).map_err(|source| {
            OrganizeError::DirectoryCreationFailed {
                path: category_path.clone(),
                source,
            }
        })?;

        let destination = Self::plan_destination(file_path, target_root, category, policy)?;

        OutputFormatter::moving(file_path, &destination);

        fs::rename(file_path, &destination).map_err(|source| OrganizeError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: destination.clone(),
            source,
        })?;

        debug!("moved {} into {}", file_path.display(), category);

        Ok(MoveRecord {
            source: file_path.to_path_buf(),
            destination,
            category,
        })
    }

    /// Computes where `file_path` would be moved, without touching anything.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::MissingFileName`] for paths such as `..`, and
    /// [`OrganizeError::DestinationExists`] when the destination is taken and
    /// the policy is [`ConflictPolicy::Error`].
    pub fn plan_destination(
        file_path: &Path,
        target_root: &Path,
        category: Category,
        policy: ConflictPolicy,
    ) -> OrganizeResult<PathBuf> {
        Self::plan_destination_with(file_path, target_root, category, policy, exists_on_disk)
    }

    /// Like [`FileOrganizer::plan_destination`], but asks `is_taken` whether a
    /// candidate destination is already occupied.
    ///
    /// A dry run uses this to treat destinations it has already planned as
    /// taken, so it reports the same outcome a real run would.
    pub fn plan_destination_with<F>(
        file_path: &Path,
        target_root: &Path,
        category: Category,
        policy: ConflictPolicy,
        is_taken: F,
    ) -> OrganizeResult<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::MissingFileName {
                path: file_path.to_path_buf(),
            })?;

        let destination = target_root.join(category.dir_name()).join(file_name);

        if !is_taken(&destination) {
            return Ok(destination);
        }

        match policy {
            ConflictPolicy::Error => Err(OrganizeError::DestinationExists { path: destination }),
            ConflictPolicy::Overwrite => {
                trace!("overwriting {}", destination.display());
                Ok(destination)
            }
            ConflictPolicy::Rename => Ok(Self::free_sibling(&destination, is_taken)),
        }
    }

    /// Returns the first `stem (N).ext` next to `taken` that is not taken.
    fn free_sibling<F>(taken: &Path, is_taken: F) -> PathBuf
    where
        F: Fn(&Path) -> bool,
    {
        let stem = taken.file_stem().unwrap_or_default();
        let extension = taken.extension();

        (1u64..)
            .map(|n| {
                let mut name = OsString::from(stem);
                name.push(format!(" ({n})"));
                if let Some(extension) = extension {
                    name.push(".");
                    name.push(extension);
                }
                taken.with_file_name(name)
            })
            .find(|candidate| !is_taken(candidate))
            .unwrap_or_else(|| taken.to_path_buf())
    }
}

/// `symlink_metadata` so a dangling symlink still counts as taken.
fn exists_on_disk(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

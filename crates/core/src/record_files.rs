//! Multi-file record writes with rollback.
//!
//! Every change to the data directory goes through this module. A record directory is changed
//! by a single call that either applies every file in the batch or restores the directory to
//! its previous contents:
//!
//! - files that previously existed are restored to their old content
//! - files created by the batch are removed
//! - directories created by the batch are removed (deepest first)
//!
//! Files without previous content are created with exclusive-create semantics. If such a file
//! already exists the batch fails with [`ClinicError::RecordFileExists`], which is how the
//! one-record-per-booking rule is enforced on disk.

use crate::error::{ClinicError, ClinicResult};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{LazyLock, Mutex};

/// Represents a file to be written as part of a batch.
#[derive(Debug, Clone)]
pub(crate) struct FileToWrite<'a> {
    /// The path of the file relative to the record directory.
    pub relative_path: &'a Path,
    /// The new content to write to the file.
    pub content: &'a str,
    /// The previous file content for rollback. `None` if this is a new file.
    pub old_content: Option<&'a str>,
}

/// File operations on a single record directory.
pub(crate) struct RecordFiles;

impl RecordFiles {
    /// Write all `files` under `record_dir`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first failure:
    /// - [`ClinicError::RecordFileExists`] when a new file is already present
    /// - [`ClinicError::FileWrite`] for any other I/O failure
    ///
    /// Before returning the error, previously written files and created directories are rolled
    /// back on a best-effort basis.
    pub(crate) fn write_files(record_dir: &Path, files: &[FileToWrite]) -> ClinicResult<()> {
        let mut created_dirs: Vec<PathBuf> = Vec::new();
        let mut written_files: Vec<(PathBuf, Option<String>)> = Vec::new();

        let result: ClinicResult<()> = (|| {
            let mut dirs_needed = HashSet::new();
            for file in files {
                let full_path = record_dir.join(file.relative_path);
                if let Some(parent) = full_path.parent() {
                    let mut current = parent;
                    while current != record_dir && !current.exists() {
                        dirs_needed.insert(current.to_path_buf());
                        match current.parent() {
                            Some(next) => current = next,
                            None => break,
                        }
                    }
                }
            }

            let mut dirs_to_create: Vec<PathBuf> = dirs_needed.into_iter().collect();
            dirs_to_create.sort_by_key(|p| p.components().count());

            for dir in &dirs_to_create {
                fs::create_dir(dir).map_err(ClinicError::FileWrite)?;
                created_dirs.push(dir.clone());
            }

            for file in files {
                let full_path = record_dir.join(file.relative_path);
                write_one(&full_path, file)?;
                written_files.push((full_path, file.old_content.map(str::to_string)));
            }

            Ok(())
        })();

        if let Err(write_error) = result {
            for (full_path, old_content) in written_files.iter().rev() {
                let restored = match old_content {
                    Some(contents) => fs::write(full_path, contents),
                    None => fs::remove_file(full_path),
                };
                if let Err(e) = restored {
                    tracing::error!(path = %full_path.display(), error = %e, "rollback of record file failed");
                }
            }

            for dir in created_dirs.iter().rev() {
                let _ = fs::remove_dir(dir);
            }

            return Err(write_error);
        }

        Ok(())
    }

    /// Populate a freshly created record directory, removing the whole directory on failure.
    ///
    /// # Errors
    ///
    /// Returns the write error. If removing the directory also fails, returns
    /// [`ClinicError::CleanupAfterCreateFailed`] carrying both errors.
    pub(crate) fn populate_new_dir(record_dir: &Path, files: &[FileToWrite]) -> ClinicResult<()> {
        match Self::write_files(record_dir, files) {
            Ok(()) => Ok(()),
            Err(create_error) => {
                if let Err(cleanup_err) = remove_record_dir(record_dir) {
                    return Err(ClinicError::CleanupAfterCreateFailed {
                        path: record_dir.to_path_buf(),
                        create_error: Box::new(create_error),
                        cleanup_error: cleanup_err,
                    });
                }
                Err(create_error)
            }
        }
    }

    /// Delete a record directory and everything in it.
    pub(crate) fn remove_dir(record_dir: &Path) -> ClinicResult<()> {
        remove_record_dir(record_dir).map_err(ClinicError::FileRemove)
    }

    /// Read a file that may legitimately be absent.
    pub(crate) fn read_optional(path: &Path) -> ClinicResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClinicError::FileRead(e)),
        }
    }
}

fn write_one(full_path: &Path, file: &FileToWrite) -> ClinicResult<()> {
    #[cfg(test)]
    take_forced_write_failure(full_path)?;

    if file.old_content.is_some() {
        return fs::write(full_path, file.content).map_err(ClinicError::FileWrite);
    }

    let mut handle = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(full_path)
    {
        Ok(handle) => handle,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(ClinicError::RecordFileExists {
                path: full_path.to_path_buf(),
            })
        }
        Err(e) => return Err(ClinicError::FileWrite(e)),
    };

    if let Err(e) = handle.write_all(file.content.as_bytes()) {
        drop(handle);
        let _ = fs::remove_file(full_path);
        return Err(ClinicError::FileWrite(e));
    }

    Ok(())
}

#[cfg(test)]
static FORCE_WRITE_ERROR_FOR_THREADS: LazyLock<Mutex<HashMap<std::thread::ThreadId, String>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

#[cfg(test)]
static FORCE_CLEANUP_ERROR_FOR_THREADS: LazyLock<Mutex<HashSet<std::thread::ThreadId>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Make the next write of a file named `file_name` on this thread fail.
#[cfg(test)]
pub(crate) fn force_write_failure_once(file_name: &str) {
    FORCE_WRITE_ERROR_FOR_THREADS
        .lock()
        .expect("FORCE_WRITE_ERROR_FOR_THREADS mutex poisoned")
        .insert(std::thread::current().id(), file_name.to_string());
}

/// Make the next record directory removal on this thread fail.
#[cfg(test)]
pub(crate) fn force_cleanup_failure_once() {
    FORCE_CLEANUP_ERROR_FOR_THREADS
        .lock()
        .expect("FORCE_CLEANUP_ERROR_FOR_THREADS mutex poisoned")
        .insert(std::thread::current().id());
}

#[cfg(test)]
fn take_forced_write_failure(full_path: &Path) -> ClinicResult<()> {
    let current_id = std::thread::current().id();
    let mut guard = FORCE_WRITE_ERROR_FOR_THREADS
        .lock()
        .expect("FORCE_WRITE_ERROR_FOR_THREADS mutex poisoned");

    let matches = guard.get(&current_id).is_some_and(|name| {
        full_path
            .file_name()
            .is_some_and(|actual| actual == std::ffi::OsStr::new(name))
    });
    if matches {
        guard.remove(&current_id);
        return Err(ClinicError::FileWrite(std::io::Error::other(
            "forced write failure (test hook)",
        )));
    }
    Ok(())
}

fn remove_record_dir(record_dir: &Path) -> std::io::Result<()> {
    #[cfg(test)]
    {
        let current_id = std::thread::current().id();
        let mut guard = FORCE_CLEANUP_ERROR_FOR_THREADS
            .lock()
            .expect("FORCE_CLEANUP_ERROR_FOR_THREADS mutex poisoned");

        if guard.remove(&current_id) {
            return Err(std::io::Error::other("forced cleanup failure (test hook)"));
        }
    }

    fs::remove_dir_all(record_dir)
}

//! Shared repository utilities.
//!
//! - [`StoredRecord`] ties a domain carrier to its file name, record tree and YAML codec.
//! - [`create_unique_sharded_dir`] allocates a new id together with its directory.
//! - [`record_dirs`] walks a sharded tree and yields every record directory in it.

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult, RecordKind};
use clinic_uuid::RecordId;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// A record kind stored as one YAML file per sharded directory.
pub(crate) trait StoredRecord: Sized {
    const KIND: RecordKind;
    const FILE_NAME: &'static str;

    fn base_dir(cfg: &CoreConfig) -> PathBuf;
    fn id(&self) -> RecordId;
    fn parse(yaml_text: &str) -> ClinicResult<Self>;
    fn render(&self) -> ClinicResult<String>;
}

/// Creates a unique sharded directory within `base_dir`.
///
/// Generates ids using `id_source` and attempts to create the corresponding sharded directory,
/// retrying up to 5 times if a directory for that id already exists.
///
/// # Errors
///
/// Returns [`ClinicError::RecordDirCreation`] if parent creation fails, or if no unique
/// directory could be allocated after 5 attempts.
pub(crate) fn create_unique_sharded_dir(
    base_dir: &Path,
    mut id_source: impl FnMut() -> RecordId,
) -> ClinicResult<(RecordId, PathBuf)> {
    for _attempt in 0..5 {
        let id = id_source();
        let candidate = id.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(ClinicError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ClinicError::RecordDirCreation(e)),
        }
    }

    Err(ClinicError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Lists every `<s1>/<s2>/<id>` directory under `base_dir`.
///
/// Entries that are not directories, or whose names are not canonical ids, are ignored. A
/// missing `base_dir` yields an empty list.
pub(crate) fn record_dirs(base_dir: &Path) -> ClinicResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(dirs),
        Err(e) => return Err(ClinicError::FileRead(e)),
    };

    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let Ok(s2_iter) = fs::read_dir(&s1_path) else {
            continue;
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let Ok(id_iter) = fs::read_dir(&s2_path) else {
                continue;
            };

            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                let canonical = id_ent
                    .file_name()
                    .to_str()
                    .is_some_and(RecordId::is_canonical);
                if id_path.is_dir() && canonical {
                    dirs.push(id_path);
                }
            }
        }
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_unique_sharded_dir_retries_on_collision() {
        let temp_dir = TempDir::new().unwrap();
        let taken = RecordId::parse("7c9e6679742540de944be07fc1f90ae7").unwrap();
        let fresh = RecordId::parse("0f8fad5bd9cb469fa16570867728950e").unwrap();
        fs::create_dir_all(taken.sharded_dir(temp_dir.path())).unwrap();

        let mut ids = vec![fresh, taken].into_iter().rev();
        let (id, dir) =
            create_unique_sharded_dir(temp_dir.path(), || ids.next().unwrap()).unwrap();

        assert_eq!(id, fresh);
        assert_eq!(dir, temp_dir.path().join("0f").join("8f").join(fresh.to_string()));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_create_unique_sharded_dir_gives_up_after_five_attempts() {
        let temp_dir = TempDir::new().unwrap();
        let taken = RecordId::new();
        fs::create_dir_all(taken.sharded_dir(temp_dir.path())).unwrap();

        let err = create_unique_sharded_dir(temp_dir.path(), || taken).unwrap_err();
        assert!(matches!(err, ClinicError::RecordDirCreation(_)));
    }

    #[test]
    fn test_record_dirs_skips_stray_entries() {
        let temp_dir = TempDir::new().unwrap();
        let a = RecordId::new();
        let b = RecordId::new();
        fs::create_dir_all(a.sharded_dir(temp_dir.path())).unwrap();
        fs::create_dir_all(b.sharded_dir(temp_dir.path())).unwrap();
        fs::write(temp_dir.path().join("README.txt"), "not a shard").unwrap();
        fs::create_dir_all(temp_dir.path().join("zz").join("yy").join("not-an-id")).unwrap();

        let mut found = record_dirs(temp_dir.path()).unwrap();
        found.sort();
        let mut expected = vec![a.sharded_dir(temp_dir.path()), b.sharded_dir(temp_dir.path())];
        expected.sort();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_record_dirs_of_missing_tree_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(record_dirs(&temp_dir.path().join("nope")).unwrap().is_empty());
    }
}

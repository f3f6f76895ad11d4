//! Record storage.
//!
//! Every record kind lives in its own sharded tree under the data directory:
//!
//! ```text
//! <data_dir>/
//!   patients/<s1>/<s2>/<id>/patient.yaml
//!   users/<s1>/<s2>/<id>/user.yaml
//!   bookings/<s1>/<s2>/<id>/booking.yaml
//!   bookings/<s1>/<s2>/<id>/medical_record.yaml
//! ```
//!
//! A medical record sits inside its booking's directory, so removing a booking removes its
//! record and a booking can never hold more than one.
//!
//! [`RecordStore`] is the single handle services share. It owns the write lock that turns every
//! read-check-write sequence in the services into a compare-and-set.

pub(crate) mod bookings;
pub(crate) mod patients;
pub(crate) mod shared;
pub(crate) mod users;

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult};
use crate::record_files::{FileToWrite, RecordFiles};
use clinic_uuid::RecordId;
use shared::StoredRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle on the data directory shared by the directory and lifecycle services.
///
/// Cloning is cheap and clones share the same write lock; open the store once per process and
/// hand clones to each service.
#[derive(Clone, Debug)]
pub struct RecordStore {
    cfg: Arc<CoreConfig>,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    /// Open the store, creating the record trees if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::StorageDirCreation`] if a record tree cannot be created.
    pub fn open(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        for dir in [cfg.patients_dir(), cfg.users_dir(), cfg.bookings_dir()] {
            fs::create_dir_all(&dir).map_err(ClinicError::StorageDirCreation)?;
        }

        Ok(Self {
            cfg,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn cfg(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Serialise writers. Hold the guard across the read that a write depends on.
    pub(crate) fn write_guard(&self) -> ClinicResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| ClinicError::LockPoisoned)
    }

    pub(crate) fn record_dir<R: StoredRecord>(&self, id: RecordId) -> PathBuf {
        id.sharded_dir(&R::base_dir(&self.cfg))
    }

    /// Load a record and the raw text it was parsed from.
    ///
    /// The raw text is what a later write restores if its batch fails.
    pub(crate) fn load_with_raw<R: StoredRecord>(&self, id: RecordId) -> ClinicResult<(R, String)> {
        let path = self.record_dir::<R>(id).join(R::FILE_NAME);
        let raw = RecordFiles::read_optional(&path)?
            .ok_or(ClinicError::NotFound { kind: R::KIND, id })?;
        let record = R::parse(&raw)?;
        Ok((record, raw))
    }

    pub(crate) fn load<R: StoredRecord>(&self, id: RecordId) -> ClinicResult<R> {
        self.load_with_raw(id).map(|(record, _)| record)
    }

    /// Whether a record of kind `R` with this id exists.
    pub(crate) fn exists<R: StoredRecord>(&self, id: RecordId) -> bool {
        self.record_dir::<R>(id).join(R::FILE_NAME).is_file()
    }

    /// Load every readable record of kind `R`, skipping (and logging) files that fail to parse.
    pub(crate) fn load_all<R: StoredRecord>(&self) -> ClinicResult<Vec<R>> {
        let mut records = Vec::new();
        for dir in shared::record_dirs(&R::base_dir(&self.cfg))? {
            let path = dir.join(R::FILE_NAME);
            let Some(contents) = RecordFiles::read_optional(&path)? else {
                continue;
            };
            match R::parse(&contents) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        "failed to parse {}: {} - {}",
                        R::FILE_NAME,
                        path.display(),
                        e
                    );
                }
            }
        }
        Ok(records)
    }

    /// Allocate a fresh id and directory, then write the record built for that id.
    ///
    /// Inputs must already be validated; `build` only assembles the record.
    pub(crate) fn insert<R: StoredRecord>(
        &self,
        build: impl FnOnce(RecordId) -> R,
    ) -> ClinicResult<R> {
        let (id, record_dir) =
            shared::create_unique_sharded_dir(&R::base_dir(&self.cfg), RecordId::new)?;

        let record = build(id);
        let rendered = match record.render() {
            Ok(rendered) => rendered,
            Err(e) => {
                let _ = fs::remove_dir(&record_dir);
                return Err(e);
            }
        };

        RecordFiles::populate_new_dir(
            &record_dir,
            &[FileToWrite {
                relative_path: Path::new(R::FILE_NAME),
                content: &rendered,
                old_content: None,
            }],
        )?;

        Ok(record)
    }

    /// Overwrite an existing record, restoring `old_raw` if the write fails.
    pub(crate) fn replace<R: StoredRecord>(&self, record: &R, old_raw: &str) -> ClinicResult<()> {
        let rendered = record.render()?;
        RecordFiles::write_files(
            &self.record_dir::<R>(record.id()),
            &[FileToWrite {
                relative_path: Path::new(R::FILE_NAME),
                content: &rendered,
                old_content: Some(old_raw),
            }],
        )
    }

    /// Remove a record directory and everything inside it.
    pub(crate) fn remove<R: StoredRecord>(&self, id: RecordId) -> ClinicResult<()> {
        if !self.exists::<R>(id) {
            return Err(ClinicError::NotFound { kind: R::KIND, id });
        }
        RecordFiles::remove_dir(&self.record_dir::<R>(id))
    }
}

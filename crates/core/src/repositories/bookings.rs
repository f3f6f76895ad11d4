//! Booking and medical record storage.
//!
//! A booking's medical record is a second file in the booking's own directory. Finishing a
//! booking writes both files as one batch. The record file goes first and is created
//! exclusively, so an existing record fails the batch before the booking file is touched.

use super::shared::StoredRecord;
use super::RecordStore;
use crate::config::CoreConfig;
use crate::error::{ClinicResult, RecordKind};
use crate::record_files::{FileToWrite, RecordFiles};
use clinic_records::{Booking, BookingData, MedicalRecord, MedicalRecordData};
use clinic_uuid::RecordId;
use std::path::{Path, PathBuf};

impl StoredRecord for BookingData {
    const KIND: RecordKind = RecordKind::Booking;
    const FILE_NAME: &'static str = Booking::FILE_NAME;

    fn base_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.bookings_dir()
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn parse(yaml_text: &str) -> ClinicResult<Self> {
        Ok(Booking::parse(yaml_text)?)
    }

    fn render(&self) -> ClinicResult<String> {
        Ok(Booking::render(self)?)
    }
}

impl RecordStore {
    /// The medical record written when `booking_id` was finished, if any.
    pub(crate) fn load_medical_record(
        &self,
        booking_id: RecordId,
    ) -> ClinicResult<Option<MedicalRecordData>> {
        let path = self
            .record_dir::<BookingData>(booking_id)
            .join(MedicalRecord::FILE_NAME);
        RecordFiles::read_optional(&path)?
            .map(|raw| MedicalRecord::parse(&raw).map_err(Into::into))
            .transpose()
    }

    /// Write the finished booking and its new medical record as one batch.
    ///
    /// The record is created before the booking is overwritten. A writer that lost the race
    /// for the record leaves the winner's booking alone; if the booking write fails, the new
    /// record is removed and `old_booking_raw` is the content the booking falls back to.
    pub(crate) fn write_finished(
        &self,
        booking: &BookingData,
        old_booking_raw: &str,
        record: &MedicalRecordData,
    ) -> ClinicResult<()> {
        let booking_yaml = Booking::render(booking)?;
        let record_yaml = MedicalRecord::render(record)?;

        RecordFiles::write_files(
            &self.record_dir::<BookingData>(booking.id),
            &[
                FileToWrite {
                    relative_path: Path::new(MedicalRecord::FILE_NAME),
                    content: &record_yaml,
                    old_content: None,
                },
                FileToWrite {
                    relative_path: Path::new(Booking::FILE_NAME),
                    content: &booking_yaml,
                    old_content: Some(old_booking_raw),
                },
            ],
        )
    }

    /// Remove every booking matching `predicate`, together with its medical record.
    ///
    /// Returns the ids of the removed bookings. Callers hold the write guard.
    pub(crate) fn remove_bookings_where(
        &self,
        predicate: impl Fn(&BookingData) -> bool,
    ) -> ClinicResult<Vec<RecordId>> {
        let mut removed = Vec::new();
        for booking in self.load_all::<BookingData>()? {
            if predicate(&booking) {
                RecordFiles::remove_dir(&self.record_dir::<BookingData>(booking.id))?;
                removed.push(booking.id);
            }
        }
        Ok(removed)
    }
}

//! Booking lifecycle.
//!
//! [`BookingLifecycleService`] owns every booking status change. All of them run under the
//! store's write lock: the booking is read, checked against the [`Transition`] table and
//! written back before the lock is released, so two requests racing on one booking cannot both
//! succeed.
//!
//! Finishing a booking also writes its medical record. The booking file and the record file go
//! out as one batch; if the record cannot be written the booking file is restored and the
//! booking stays open.

use crate::access::{Capability, Session};
use crate::clock::Clock;
use crate::constants::{EXAMINATION_FINISHED_MESSAGE, PLACEHOLDER};
use crate::directory::{insert_patient, require_doctor, NewPatient, PatientFields};
use crate::repositories::shared::StoredRecord;
use crate::repositories::RecordStore;
use crate::transition::Transition;
use crate::{ClinicError, ClinicResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clinic_records::{
    BookingData, BookingStatus, Gender, MedicalRecordData, PatientData, UserData,
};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use std::collections::HashMap;
use std::sync::Arc;

/// Combine a `YYYY-MM-DD` date and an `HH:MM` (or `HH:MM:SS`) time into a wall-clock
/// appointment time. Seconds are dropped.
pub fn appointment_time_from_parts(date: &str, time: &str) -> ClinicResult<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        ClinicError::InvalidInput(format!("appointment date must be YYYY-MM-DD: {e}"))
    })?;

    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|e| ClinicError::InvalidInput(format!("appointment time must be HH:MM: {e}")))?;

    let time = time.with_second(0).unwrap_or(time);
    Ok(date.and_time(time))
}

/// What a booking's examination looks like to a reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExaminationDetail {
    Recorded(MedicalRecordData),
    NotRecorded,
}

impl ExaminationDetail {
    pub fn record(&self) -> Option<&MedicalRecordData> {
        match self {
            ExaminationDetail::Recorded(record) => Some(record),
            ExaminationDetail::NotRecorded => None,
        }
    }

    /// The diagnosis, or `-` when nothing was recorded.
    pub fn diagnosis(&self) -> &str {
        self.record()
            .map_or(PLACEHOLDER, |record| record.diagnosis.as_str())
    }

    /// The notes, or `-` when nothing was recorded or the doctor left none.
    pub fn notes(&self) -> &str {
        self.record()
            .and_then(|record| record.notes.as_ref())
            .map_or(PLACEHOLDER, NonEmptyText::as_str)
    }
}

/// Result of finishing an examination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedExamination {
    pub booking: BookingData,
    pub record: MedicalRecordData,
    /// Confirmation to show the doctor.
    pub notification: &'static str,
}

/// A booking together with the names a listing shows beside it.
///
/// Lookups that fail (a patient removed concurrently, say) leave the field `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingOverview {
    pub booking: BookingData,
    pub patient_name: Option<NonEmptyText>,
    pub patient_gender: Option<Gender>,
    pub doctor_name: Option<NonEmptyText>,
    /// Only for finished bookings.
    pub diagnosis: Option<NonEmptyText>,
}

/// Creates bookings and moves them through their statuses.
#[derive(Clone, Debug)]
pub struct BookingLifecycleService {
    store: RecordStore,
    clock: Arc<dyn Clock>,
}

impl BookingLifecycleService {
    pub fn new(store: RecordStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The current calendar day in the clinic's timezone.
    pub fn today(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&self.store.cfg().utc_offset())
            .date_naive()
    }

    /// Book `patient_id` with `doctor_id` at `appointment_time`.
    ///
    /// Past times are accepted and overlapping bookings are not checked.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::Forbidden`] unless the session may create bookings
    /// - [`ClinicError::NotFound`] for an unknown patient or doctor
    /// - [`ClinicError::NotADoctor`] when `doctor_id` is not a doctor
    pub fn create(
        &self,
        session: &Session,
        patient_id: RecordId,
        doctor_id: RecordId,
        appointment_time: NaiveDateTime,
    ) -> ClinicResult<BookingData> {
        session.require(Capability::CreateBooking)?;

        let _guard = self.store.write_guard()?;
        self.store.load::<PatientData>(patient_id)?;
        require_doctor(&self.store, doctor_id)?;

        self.insert_booking(patient_id, doctor_id, appointment_time)
    }

    /// Register a new patient and book them in one step.
    ///
    /// The doctor is checked before anything is written. If the booking cannot be written the
    /// new patient is removed again.
    pub fn create_with_new_patient(
        &self,
        session: &Session,
        patient: NewPatient,
        doctor_id: RecordId,
        appointment_time: NaiveDateTime,
    ) -> ClinicResult<(PatientData, BookingData)> {
        session.require(Capability::ManagePatients)?;
        session.require(Capability::CreateBooking)?;
        let fields = PatientFields::validate(patient)?;

        let _guard = self.store.write_guard()?;
        require_doctor(&self.store, doctor_id)?;

        let patient = insert_patient(&self.store, fields, self.clock.now())?;
        match self.insert_booking(patient.id, doctor_id, appointment_time) {
            Ok(booking) => Ok((patient, booking)),
            Err(e) => {
                if let Err(cleanup) = self.store.remove::<PatientData>(patient.id) {
                    tracing::error!(
                        patient_id = %patient.id,
                        error = %cleanup,
                        "failed to remove patient after booking failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// A single booking. Doctors only see their own.
    pub fn get(&self, session: &Session, id: RecordId) -> ClinicResult<BookingData> {
        session.require(Capability::ViewExamination)?;
        let booking: BookingData = self.store.load(id)?;
        ensure_assigned(session, &booking)?;
        Ok(booking)
    }

    /// Doctor calls the patient in: Waiting → InProgress.
    pub fn start(&self, session: &Session, id: RecordId) -> ClinicResult<BookingData> {
        session.require(Capability::RunExamination)?;
        self.transition(session, id, Transition::Start)
    }

    /// Desk cancels an open booking.
    pub fn cancel(&self, session: &Session, id: RecordId) -> ClinicResult<BookingData> {
        session.require(Capability::CancelBooking)?;
        self.transition(session, id, Transition::Cancel)
    }

    /// Finish the examination and write its medical record.
    ///
    /// The booking becomes Finished and exactly one medical record is created for it, or
    /// nothing changes at all.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::InvalidField`] for a blank diagnosis (checked before anything is read)
    /// - [`ClinicError::Forbidden`] / [`ClinicError::NotAssignedDoctor`] for the wrong actor
    /// - [`ClinicError::AlreadyFinished`] when the booking was finished before
    /// - [`ClinicError::InvalidTransition`] when it was cancelled
    /// - [`ClinicError::RecordFileExists`] if a record is somehow already on disk
    pub fn finish(
        &self,
        session: &Session,
        id: RecordId,
        diagnosis: &str,
        notes: Option<&str>,
    ) -> ClinicResult<FinishedExamination> {
        session.require(Capability::RunExamination)?;
        let diagnosis = NonEmptyText::new(diagnosis).map_err(ClinicError::field("diagnosis"))?;
        let notes = NonEmptyText::optional(notes);

        let _guard = self.store.write_guard()?;
        let (mut booking, raw) = self.store.load_with_raw::<BookingData>(id)?;
        ensure_assigned(session, &booking)?;

        let now = self.clock.now();
        Transition::Finish.apply(&mut booking, now)?;

        let record = MedicalRecordData {
            id: RecordId::new(),
            appointment_id: booking.id,
            patient_id: booking.patient_id,
            doctor_id: session.user_id(),
            diagnosis,
            notes,
            created_at: now,
            updated_at: now,
        };
        self.store.write_finished(&booking, &raw, &record)?;

        tracing::info!(
            booking_id = %booking.id,
            record_id = %record.id,
            "examination finished"
        );
        Ok(FinishedExamination {
            booking,
            record,
            notification: EXAMINATION_FINISHED_MESSAGE,
        })
    }

    /// The examination outcome of a booking, with placeholders when none was recorded.
    pub fn view_detail(&self, session: &Session, id: RecordId) -> ClinicResult<ExaminationDetail> {
        session.require(Capability::ViewExamination)?;
        let booking: BookingData = self.store.load(id)?;
        ensure_assigned(session, &booking)?;

        Ok(match self.store.load_medical_record(id)? {
            Some(record) => ExaminationDetail::Recorded(record),
            None => ExaminationDetail::NotRecorded,
        })
    }

    /// Every booking, newest appointment first, optionally narrowed by status and doctor.
    pub fn list(
        &self,
        session: &Session,
        status: Option<BookingStatus>,
        doctor_id: Option<RecordId>,
    ) -> ClinicResult<Vec<BookingData>> {
        session.require(Capability::ViewAllBookings)?;

        let mut bookings: Vec<BookingData> = self.store.load_all()?;
        bookings.retain(|b| {
            status.map_or(true, |s| b.status == s) && doctor_id.map_or(true, |d| b.doctor_id == d)
        });
        bookings.sort_by(|a, b| {
            b.appointment_time
                .cmp(&a.appointment_time)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(bookings)
    }

    /// Today's bookings for the session's doctor, earliest first.
    pub fn doctor_queue(
        &self,
        session: &Session,
        status: Option<BookingStatus>,
    ) -> ClinicResult<Vec<BookingData>> {
        session.require(Capability::RunExamination)?;
        let today = self.today();
        let doctor_id = session.user_id();

        let mut bookings: Vec<BookingData> = self.store.load_all()?;
        bookings.retain(|b| {
            b.doctor_id == doctor_id
                && b.appointment_time.date() == today
                && status.map_or(true, |s| b.status == s)
        });
        bookings.sort_by(|a, b| {
            a.appointment_time
                .cmp(&b.appointment_time)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(bookings)
    }

    /// Attach patient, doctor and diagnosis details to bookings the session already holds.
    pub fn overview(
        &self,
        session: &Session,
        bookings: Vec<BookingData>,
    ) -> ClinicResult<Vec<BookingOverview>> {
        session.require(Capability::ViewExamination)?;

        let mut patients: HashMap<RecordId, Option<PatientData>> = HashMap::new();
        let mut doctors: HashMap<RecordId, Option<UserData>> = HashMap::new();
        let mut overviews = Vec::with_capacity(bookings.len());

        for booking in bookings {
            ensure_assigned(session, &booking)?;

            let patient = patients
                .entry(booking.patient_id)
                .or_insert_with(|| self.lookup(booking.patient_id));
            let (patient_name, patient_gender) = match patient {
                Some(p) => (Some(p.name.clone()), Some(p.gender)),
                None => (None, None),
            };
            let doctor_name = doctors
                .entry(booking.doctor_id)
                .or_insert_with(|| self.lookup(booking.doctor_id))
                .as_ref()
                .map(|d: &UserData| d.name.clone());

            let diagnosis = if booking.status == BookingStatus::Finished {
                match self.store.load_medical_record(booking.id) {
                    Ok(record) => record.map(|record| record.diagnosis),
                    Err(e) => {
                        tracing::warn!(
                            booking_id = %booking.id,
                            error = %e,
                            "medical record unreadable"
                        );
                        None
                    }
                }
            } else {
                None
            };

            overviews.push(BookingOverview {
                booking,
                patient_name,
                patient_gender,
                doctor_name,
                diagnosis,
            });
        }

        Ok(overviews)
    }

    fn lookup<R: StoredRecord>(&self, id: RecordId) -> Option<R> {
        match self.store.load::<R>(id) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "listing lookup failed");
                None
            }
        }
    }

    fn insert_booking(
        &self,
        patient_id: RecordId,
        doctor_id: RecordId,
        appointment_time: NaiveDateTime,
    ) -> ClinicResult<BookingData> {
        let now = self.clock.now();
        let booking = self.store.insert(|id| BookingData {
            id,
            patient_id,
            doctor_id,
            appointment_time,
            status: BookingStatus::Waiting,
            started_at: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(
            booking_id = %booking.id,
            patient_id = %patient_id,
            doctor_id = %doctor_id,
            "booking created"
        );
        Ok(booking)
    }

    fn transition(
        &self,
        session: &Session,
        id: RecordId,
        transition: Transition,
    ) -> ClinicResult<BookingData> {
        let _guard = self.store.write_guard()?;
        let (mut booking, raw) = self.store.load_with_raw::<BookingData>(id)?;
        ensure_assigned(session, &booking)?;

        transition.apply(&mut booking, self.clock.now())?;
        self.store.replace(&booking, &raw)?;

        tracing::info!(booking_id = %id, status = %booking.status, "booking {transition}");
        Ok(booking)
    }
}

/// Doctors may only act on bookings assigned to them. Other roles are unrestricted here.
fn ensure_assigned(session: &Session, booking: &BookingData) -> ClinicResult<()> {
    if session.is_doctor() && booking.doctor_id != session.user_id() {
        return Err(ClinicError::NotAssignedDoctor {
            booking: booking.id,
        });
    }
    Ok(())
}

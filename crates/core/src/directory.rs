//! Patient and staff directory.
//!
//! The directory owns patients and users and is the only place sessions are minted. Bookings
//! reference both; deleting a patient or a doctor removes their bookings (and the medical
//! records inside them) before the entry itself.

use crate::access::{Capability, Session};
use crate::clock::Clock;
use crate::constants::{MAX_ADDRESS_LEN, MAX_PATIENT_NAME_LEN};
use crate::repositories::RecordStore;
use crate::validation::{validate_email, validate_phone_number};
use crate::{ClinicError, ClinicResult, RecordKind};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_records::{BookingData, Gender, PatientData, Role, UserData};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use std::sync::Arc;

/// Patient details as entered by desk staff.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub phone_number: String,
    pub address: String,
}

/// Staff member details as entered by an admin.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Patient details that passed validation.
#[derive(Clone, Debug)]
pub(crate) struct PatientFields {
    name: NonEmptyText,
    gender: Gender,
    date_of_birth: NaiveDate,
    phone_number: NonEmptyText,
    address: NonEmptyText,
}

impl PatientFields {
    pub(crate) fn validate(input: NewPatient) -> ClinicResult<Self> {
        Ok(Self {
            name: NonEmptyText::bounded(&input.name, MAX_PATIENT_NAME_LEN)
                .map_err(ClinicError::field("name"))?,
            gender: input.gender,
            date_of_birth: input.date_of_birth,
            phone_number: validate_phone_number(&input.phone_number)?,
            address: NonEmptyText::bounded(&input.address, MAX_ADDRESS_LEN)
                .map_err(ClinicError::field("address"))?,
        })
    }

    fn into_patient(self, id: RecordId, created_at: DateTime<Utc>, now: DateTime<Utc>) -> PatientData {
        PatientData {
            id,
            name: self.name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            phone_number: self.phone_number,
            address: self.address,
            created_at,
            updated_at: now,
        }
    }
}

/// Write a new patient. Callers check capabilities first.
pub(crate) fn insert_patient(
    store: &RecordStore,
    fields: PatientFields,
    now: DateTime<Utc>,
) -> ClinicResult<PatientData> {
    let patient = store.insert(|id| fields.into_patient(id, now, now))?;
    tracing::info!(patient_id = %patient.id, "patient created");
    Ok(patient)
}

/// Load `id` and confirm it is a doctor.
pub(crate) fn require_doctor(store: &RecordStore, id: RecordId) -> ClinicResult<UserData> {
    let user: UserData = store.load(id)?;
    if user.role != Role::Doctor {
        return Err(ClinicError::NotADoctor(id));
    }
    Ok(user)
}

/// Patients, staff and sessions.
#[derive(Clone, Debug)]
pub struct DirectoryService {
    store: RecordStore,
    clock: Arc<dyn Clock>,
}

impl DirectoryService {
    pub fn new(store: RecordStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resolve a session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Unauthenticated`] if the id is malformed or no such user exists.
    pub fn authenticate(&self, user_id: &str) -> ClinicResult<Session> {
        let id = RecordId::parse(user_id.trim())
            .map_err(|_| ClinicError::Unauthenticated(user_id.to_string()))?;

        match self.store.load::<UserData>(id) {
            Ok(user) => Ok(Session::new(user.id, user.role)),
            Err(ClinicError::NotFound { .. }) => {
                Err(ClinicError::Unauthenticated(user_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Create the first admin account.
    ///
    /// Runs without a session; only the local CLI calls it.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::AdminAlreadyExists`] once any admin exists.
    pub fn bootstrap_admin(&self, name: &str, email: &str) -> ClinicResult<UserData> {
        let _guard = self.store.write_guard()?;

        let users: Vec<UserData> = self.store.load_all()?;
        if users.iter().any(|u| u.role == Role::Admin) {
            return Err(ClinicError::AdminAlreadyExists);
        }

        self.insert_user(
            &users,
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Admin,
            },
        )
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(&self, session: &Session, input: NewUser) -> ClinicResult<UserData> {
        session.require(Capability::ManageUsers)?;
        let _guard = self.store.write_guard()?;

        let users: Vec<UserData> = self.store.load_all()?;
        self.insert_user(&users, input)
    }

    /// A user's own entry is always visible to them.
    pub fn get_user(&self, session: &Session, id: RecordId) -> ClinicResult<UserData> {
        if session.user_id() != id {
            session.require(Capability::ManageUsers)?;
        }
        self.store.load(id)
    }

    /// All users, optionally of one role, ordered by name.
    pub fn list_users(&self, session: &Session, role: Option<Role>) -> ClinicResult<Vec<UserData>> {
        session.require(Capability::ManageUsers)?;
        self.users_with_role(role)
    }

    /// Doctors available for booking, ordered by name.
    pub fn list_doctors(&self, session: &Session) -> ClinicResult<Vec<UserData>> {
        session.require(Capability::CreateBooking)?;
        self.users_with_role(Some(Role::Doctor))
    }

    /// Delete a user and every booking assigned to them.
    ///
    /// Returns the ids of the removed bookings.
    pub fn delete_user(&self, session: &Session, id: RecordId) -> ClinicResult<Vec<RecordId>> {
        session.require(Capability::ManageUsers)?;
        if session.user_id() == id {
            return Err(ClinicError::SelfDeletion);
        }

        let _guard = self.store.write_guard()?;
        if !self.store.exists::<UserData>(id) {
            return Err(ClinicError::NotFound {
                kind: RecordKind::User,
                id,
            });
        }

        let removed = self
            .store
            .remove_bookings_where(|b: &BookingData| b.doctor_id == id)?;
        self.store.remove::<UserData>(id)?;

        tracing::info!(user_id = %id, bookings_removed = removed.len(), "user deleted");
        Ok(removed)
    }

    fn insert_user(&self, existing: &[UserData], input: NewUser) -> ClinicResult<UserData> {
        let name = NonEmptyText::new(&input.name).map_err(ClinicError::field("name"))?;
        let email = validate_email(&input.email)?;

        if existing
            .iter()
            .any(|u| u.email.as_str().eq_ignore_ascii_case(email.as_str()))
        {
            return Err(ClinicError::DuplicateEmail(email.into_inner()));
        }

        let now = self.clock.now();
        let user = self.store.insert(|id| UserData {
            id,
            name,
            email,
            role: input.role,
            created_at: now,
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    fn users_with_role(&self, role: Option<Role>) -> ClinicResult<Vec<UserData>> {
        let mut users: Vec<UserData> = self.store.load_all()?;
        users.retain(|u| role.map_or(true, |r| u.role == r));
        users.sort_by(|a, b| {
            a.name
                .as_str()
                .to_lowercase()
                .cmp(&b.name.as_str().to_lowercase())
        });
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------

    pub fn create_patient(&self, session: &Session, input: NewPatient) -> ClinicResult<PatientData> {
        session.require(Capability::ManagePatients)?;
        let fields = PatientFields::validate(input)?;
        insert_patient(&self.store, fields, self.clock.now())
    }

    pub fn get_patient(&self, session: &Session, id: RecordId) -> ClinicResult<PatientData> {
        session.require(Capability::ViewPatients)?;
        self.store.load(id)
    }

    /// Patients ordered by name; `name_filter` keeps names containing it, ignoring case.
    pub fn list_patients(
        &self,
        session: &Session,
        name_filter: Option<&str>,
    ) -> ClinicResult<Vec<PatientData>> {
        session.require(Capability::ViewPatients)?;

        let needle = name_filter
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());

        let mut patients: Vec<PatientData> = self.store.load_all()?;
        if let Some(needle) = needle {
            patients.retain(|p| p.name.as_str().to_lowercase().contains(&needle));
        }
        patients.sort_by(|a, b| {
            a.name
                .as_str()
                .to_lowercase()
                .cmp(&b.name.as_str().to_lowercase())
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(patients)
    }

    /// Replace a patient's details. The id and `created_at` are kept.
    pub fn update_patient(
        &self,
        session: &Session,
        id: RecordId,
        input: NewPatient,
    ) -> ClinicResult<PatientData> {
        session.require(Capability::ManagePatients)?;
        let fields = PatientFields::validate(input)?;

        let _guard = self.store.write_guard()?;
        let (existing, raw) = self.store.load_with_raw::<PatientData>(id)?;
        let updated = fields.into_patient(id, existing.created_at, self.clock.now());
        self.store.replace(&updated, &raw)?;

        tracing::info!(patient_id = %id, "patient updated");
        Ok(updated)
    }

    /// Delete a patient together with their bookings and medical records.
    ///
    /// Returns the ids of the removed bookings.
    pub fn delete_patient(&self, session: &Session, id: RecordId) -> ClinicResult<Vec<RecordId>> {
        session.require(Capability::ManagePatients)?;

        let _guard = self.store.write_guard()?;
        if !self.store.exists::<PatientData>(id) {
            return Err(ClinicError::NotFound {
                kind: RecordKind::Patient,
                id,
            });
        }

        let removed = self
            .store
            .remove_bookings_where(|b: &BookingData| b.patient_id == id)?;
        self.store.remove::<PatientData>(id)?;

        tracing::info!(patient_id = %id, bookings_removed = removed.len(), "patient deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{patient_input, TestClinic};

    #[test]
    fn test_authenticate_known_and_unknown_users() {
        let clinic = TestClinic::new();

        let session = clinic
            .directory
            .authenticate(&clinic.doctor.user_id().to_string())
            .unwrap();
        assert_eq!(session.role(), Role::Doctor);

        assert!(matches!(
            clinic.directory.authenticate(&RecordId::new().to_string()),
            Err(ClinicError::Unauthenticated(_))
        ));
        assert!(matches!(
            clinic.directory.authenticate("not-an-id"),
            Err(ClinicError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_bootstrap_admin_only_once() {
        let clinic = TestClinic::new();
        assert!(matches!(
            clinic.directory.bootstrap_admin("Second", "second@g.c"),
            Err(ClinicError::AdminAlreadyExists)
        ));
    }

    #[test]
    fn test_create_user_rejects_duplicate_email_and_non_admins() {
        let clinic = TestClinic::new();

        let err = clinic
            .directory
            .create_user(
                &clinic.admin,
                NewUser {
                    name: "Another".into(),
                    email: "DOCTOR@g.c".into(),
                    role: Role::Doctor,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ClinicError::DuplicateEmail(_)));

        let err = clinic
            .directory
            .create_user(
                &clinic.cs,
                NewUser {
                    name: "Sneaky".into(),
                    email: "sneaky@g.c".into(),
                    role: Role::Admin,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ClinicError::Forbidden { .. }));
    }

    #[test]
    fn test_list_doctors_filters_by_role() {
        let clinic = TestClinic::new();
        let doctors = clinic.directory.list_doctors(&clinic.cs).unwrap();

        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].name.as_str(), "Dr. Amin");
        assert!(clinic.directory.list_doctors(&clinic.doctor).is_err());
    }

    #[test]
    fn test_create_patient_validates_fields() {
        let clinic = TestClinic::new();

        let mut input = patient_input("Siti");
        input.name = "x".repeat(MAX_PATIENT_NAME_LEN + 1);
        assert!(matches!(
            clinic.directory.create_patient(&clinic.cs, input),
            Err(ClinicError::InvalidField { field: "name", .. })
        ));

        let mut input = patient_input("Siti");
        input.address = "   ".into();
        assert!(matches!(
            clinic.directory.create_patient(&clinic.cs, input),
            Err(ClinicError::InvalidField { field: "address", .. })
        ));

        let mut input = patient_input("Siti");
        input.phone_number = "phone".into();
        assert!(clinic.directory.create_patient(&clinic.cs, input).is_err());

        assert!(clinic
            .directory
            .list_patients(&clinic.cs, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_list_patients_by_name() {
        let clinic = TestClinic::new();
        for name in ["Siti", "Budi", "Siti Aminah"] {
            clinic
                .directory
                .create_patient(&clinic.cs, patient_input(name))
                .unwrap();
        }

        let all = clinic.directory.list_patients(&clinic.cs, None).unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Budi", "Siti", "Siti Aminah"]);

        let sitis = clinic
            .directory
            .list_patients(&clinic.doctor, Some("siti"))
            .unwrap();
        assert_eq!(sitis.len(), 2);
    }

    #[test]
    fn test_update_patient_keeps_created_at() {
        let clinic = TestClinic::new();
        let patient = clinic
            .directory
            .create_patient(&clinic.cs, patient_input("Siti"))
            .unwrap();

        let mut input = patient_input("Siti");
        input.address = "Jl. Sudirman 5".into();
        let updated = clinic
            .directory
            .update_patient(&clinic.cs, patient.id, input)
            .unwrap();

        assert_eq!(updated.created_at, patient.created_at);
        assert_eq!(updated.address.as_str(), "Jl. Sudirman 5");
        assert_eq!(
            clinic
                .directory
                .get_patient(&clinic.cs, patient.id)
                .unwrap(),
            updated
        );
    }

    #[test]
    fn test_delete_patient_cascades_to_bookings_and_records() {
        let clinic = TestClinic::new();
        let siti = clinic
            .directory
            .create_patient(&clinic.cs, patient_input("Siti"))
            .unwrap();
        let budi = clinic
            .directory
            .create_patient(&clinic.cs, patient_input("Budi"))
            .unwrap();

        let finished = clinic.book(siti.id, "2026-02-24", "09:00");
        clinic
            .lifecycle
            .finish(&clinic.doctor, finished.id, "flu", None)
            .unwrap();
        let waiting = clinic.book(siti.id, "2026-02-25", "10:00");
        let other = clinic.book(budi.id, "2026-02-24", "11:00");

        let mut removed = clinic
            .directory
            .delete_patient(&clinic.cs, siti.id)
            .unwrap();
        removed.sort();
        let mut expected = vec![finished.id, waiting.id];
        expected.sort();
        assert_eq!(removed, expected);

        assert!(clinic.directory.get_patient(&clinic.cs, siti.id).is_err());
        assert!(!finished
            .id
            .sharded_dir(&clinic.store.cfg().bookings_dir())
            .exists());

        let remaining = clinic.lifecycle.list(&clinic.cs, None, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, other.id);
    }

    #[test]
    fn test_delete_doctor_cascades_and_blocks_self_deletion() {
        let clinic = TestClinic::new();
        let siti = clinic
            .directory
            .create_patient(&clinic.cs, patient_input("Siti"))
            .unwrap();
        let booking = clinic.book(siti.id, "2026-02-24", "09:00");

        assert!(matches!(
            clinic
                .directory
                .delete_user(&clinic.admin, clinic.admin.user_id()),
            Err(ClinicError::SelfDeletion)
        ));

        let removed = clinic
            .directory
            .delete_user(&clinic.admin, clinic.doctor.user_id())
            .unwrap();
        assert_eq!(removed, vec![booking.id]);
        assert!(clinic
            .directory
            .authenticate(&clinic.doctor.user_id().to_string())
            .is_err());
    }
}

//! Constants used throughout the clinic core crate.
//!
//! Path names and field limits live here so storage layout and validation stay consistent.

/// Default data directory when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Directory name for patient records.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for staff directory records.
pub const USERS_DIR_NAME: &str = "users";

/// Directory name for bookings; each booking directory also holds its medical record.
pub const BOOKINGS_DIR_NAME: &str = "bookings";

/// Maximum length of a patient name, in characters.
pub const MAX_PATIENT_NAME_LEN: usize = 255;

/// Maximum length of a patient address, in characters.
pub const MAX_ADDRESS_LEN: usize = 500;

/// Maximum length of a phone number, in characters.
pub const MAX_PHONE_LEN: usize = 32;

/// Shown in place of a diagnosis or notes that have not been recorded.
pub const PLACEHOLDER: &str = "-";

/// Message returned to the caller after an examination is finished.
pub const EXAMINATION_FINISHED_MESSAGE: &str = "Examination finished: data saved";

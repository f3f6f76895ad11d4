use crate::access::Capability;
use clinic_records::{BookingStatus, Role};
use clinic_uuid::RecordId;
use std::fmt;

/// Kinds of persisted record, used to name what was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Patient,
    User,
    Booking,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Patient => "patient",
            RecordKind::User => "user",
            RecordKind::Booking => "booking",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid {field}: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: clinic_types::TextError,
    },
    #[error("invalid identifier: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),
    #[error("record format error: {0}")]
    Records(#[from] clinic_records::RecordsError),

    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: RecordId },
    #[error("user {0} is not a doctor")]
    NotADoctor(RecordId),

    #[error("unknown session user: {0}")]
    Unauthenticated(String),
    #[error("role '{role}' is not permitted to {capability}")]
    Forbidden { role: Role, capability: Capability },
    #[error("booking {booking} is assigned to another doctor")]
    NotAssignedDoctor { booking: RecordId },
    #[error("an admin user already exists")]
    AdminAlreadyExists,
    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("users cannot delete their own account")]
    SelfDeletion,

    #[error("booking {0} is already finished")]
    AlreadyFinished(RecordId),
    #[error("booking {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: RecordId,
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("record file already exists: {path}", path = path.display())]
    RecordFileExists { path: std::path::PathBuf },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error(
        "create failed and cleanup also failed (path: {path}): create={create_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterCreateFailed {
        path: std::path::PathBuf,
        #[source]
        create_error: Box<ClinicError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove record: {0}")]
    FileRemove(std::io::Error),
    #[error("record store lock poisoned")]
    LockPoisoned,
}

impl ClinicError {
    /// Wrap a text validation failure with the name of the offending field.
    pub(crate) fn field(field: &'static str) -> impl FnOnce(clinic_types::TextError) -> Self {
        move |source| ClinicError::InvalidField { field, source }
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

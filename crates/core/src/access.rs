//! Role-based access control.
//!
//! Roles are a closed set ([`Role`]) and so are the capabilities they grant. Services check a
//! [`Session`] against a [`Capability`] at their boundary before touching storage. Ownership
//! rules (a doctor may only act on bookings assigned to them) are enforced by the services on
//! top of this table.

use crate::{ClinicError, ClinicResult};
use clinic_records::Role;
use clinic_uuid::RecordId;
use std::fmt;

/// Something a session may be permitted to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    ManagePatients,
    ViewPatients,
    CreateBooking,
    ViewAllBookings,
    CancelBooking,
    RunExamination,
    ViewExamination,
    ManageUsers,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ManagePatients => "manage patients",
            Capability::ViewPatients => "view patients",
            Capability::CreateBooking => "create bookings",
            Capability::ViewAllBookings => "view all bookings",
            Capability::CancelBooking => "cancel bookings",
            Capability::RunExamination => "run examinations",
            Capability::ViewExamination => "view examinations",
            Capability::ManageUsers => "manage users",
        }
    }

    /// Whether `role` holds this capability.
    pub fn granted_to(self, role: Role) -> bool {
        use Capability::*;
        match self {
            ManagePatients | CreateBooking | ViewAllBookings | CancelBooking => {
                matches!(role, Role::Admin | Role::Cs)
            }
            ViewPatients | ViewExamination => true,
            RunExamination => role == Role::Doctor,
            ManageUsers => role == Role::Admin,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor.
///
/// Only the directory can mint sessions, from a user that exists on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    user_id: RecordId,
    role: Role,
}

impl Session {
    pub(crate) fn new(user_id: RecordId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> RecordId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fail with [`ClinicError::Forbidden`] unless this session holds `capability`.
    pub fn require(&self, capability: Capability) -> ClinicResult<()> {
        if capability.granted_to(self.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = %self.role,
                capability = %capability,
                "access denied"
            );
            Err(ClinicError::Forbidden {
                role: self.role,
                capability,
            })
        }
    }

    /// True when the session belongs to a doctor, whose views are limited to their own bookings.
    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}

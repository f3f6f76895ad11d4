//! Staff directory wire model.
//!
//! Users are clinic staff. The role is a closed set; the capabilities each role grants are
//! decided by `clinic-core`, not here.

use crate::{expect_record_type, parse_id, parse_text, parse_wire, RecordsError};
use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Clinic administrator.
    Admin,
    /// Customer-service desk staff.
    Cs,
    /// Examining doctor.
    Doctor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Cs, Role::Doctor];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cs => "cs",
            Role::Doctor => "doctor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cs" => Ok(Role::Cs),
            "doctor" => Ok(Role::Doctor),
            other => Err(RecordsError::InvalidInput(format!(
                "role must be one of admin, cs, doctor; got '{other}'"
            ))),
        }
    }
}

/// Domain-level carrier for a directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserData {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub email: NonEmptyText,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User record operations.
pub struct User;

impl User {
    /// File name of a user record inside its sharded directory.
    pub const FILE_NAME: &'static str = "user.yaml";

    const RECORD_TYPE: &'static str = "User";

    /// Parse a user record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] on schema mismatch, wrong `recordType`, non-canonical id, an
    /// unknown role, or blank text fields.
    pub fn parse(yaml_text: &str) -> Result<UserData, RecordsError> {
        let wire: UserWire = parse_wire(yaml_text, Self::RECORD_TYPE)?;
        expect_record_type(&wire.record_type, Self::RECORD_TYPE)?;

        Ok(UserData {
            id: parse_id(&wire.id, "user id")?,
            name: parse_text(wire.name, "name")?,
            email: parse_text(wire.email, "email")?,
            role: wire.role,
            created_at: wire.created_at,
        })
    }

    /// Render a user record as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] if serialisation fails.
    pub fn render(data: &UserData) -> Result<String, RecordsError> {
        let wire = UserWire {
            record_type: Self::RECORD_TYPE.to_string(),
            id: data.id.to_string(),
            name: data.name.to_string(),
            email: data.email.to_string(),
            role: data.role,
            created_at: data.created_at,
        };
        serde_yaml::to_string(&wire)
            .map_err(|e| RecordsError::Translation(format!("Failed to serialise user: {e}")))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct UserWire {
    #[serde(rename = "recordType")]
    pub record_type: String,
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"recordType: User
id: 0f8fad5bd9cb469fa16570867728950e
name: Dr. Amin
email: doctor@g.c
role: doctor
createdAt: 2026-02-23T08:00:00Z
"#;

    #[test]
    fn parses_sample_yaml() {
        let user = User::parse(SAMPLE).expect("parse yaml");
        assert_eq!(user.name.as_str(), "Dr. Amin");
        assert_eq!(user.role, Role::Doctor);
    }

    #[test]
    fn render_then_parse_preserves_data() {
        let user = User::parse(SAMPLE).expect("parse yaml");
        let output = User::render(&user).expect("render");
        assert_eq!(User::parse(&output).expect("reparse"), user);
    }

    #[test]
    fn rejects_unknown_role() {
        let input = SAMPLE.replace("role: doctor", "role: nurse");
        assert!(User::parse(&input).is_err());
    }

    #[test]
    fn role_from_str_accepts_known_roles_only() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("DOCTOR".parse::<Role>().unwrap(), Role::Doctor);
        assert!("superuser".parse::<Role>().is_err());
    }
}

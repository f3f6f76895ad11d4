//! Staff directory storage.

use super::shared::StoredRecord;
use crate::config::CoreConfig;
use crate::error::{ClinicResult, RecordKind};
use clinic_records::{User, UserData};
use clinic_uuid::RecordId;
use std::path::PathBuf;

impl StoredRecord for UserData {
    const KIND: RecordKind = RecordKind::User;
    const FILE_NAME: &'static str = User::FILE_NAME;

    fn base_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.users_dir()
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn parse(yaml_text: &str) -> ClinicResult<Self> {
        Ok(User::parse(yaml_text)?)
    }

    fn render(&self) -> ClinicResult<String> {
        Ok(User::render(self)?)
    }
}

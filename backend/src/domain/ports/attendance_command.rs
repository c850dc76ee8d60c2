//! Driving port for the check-in desk and the staff registration report.

use async_trait::async_trait;

use crate::domain::{AttendanceRecord, Error, Identity, RegistrationId, RegistrationReportEntry};

/// Staff-only attendance operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceCommand: Send + Sync {
    /// Look up a registration for check-in.
    async fn lookup(
        &self,
        actor: &Identity,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, Error>;

    /// Mark a paid registration present.
    async fn mark_present(
        &self,
        actor: &Identity,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, Error>;

    /// Every registration, newest first.
    async fn registration_report(
        &self,
        actor: &Identity,
    ) -> Result<Vec<RegistrationReportEntry>, Error>;
}

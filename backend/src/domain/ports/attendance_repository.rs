//! Port for check-in storage.

use async_trait::async_trait;

use crate::domain::{
    AttendanceRecord, RegistrationId, RegistrationRejection, RegistrationReportEntry,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attendance repository adapters.
    pub enum AttendanceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "attendance repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "attendance repository query failed: {message}",
        /// A business rule rejected the request.
        Rejected { rejection: RegistrationRejection } => "{rejection}",
    }
}

/// Read and update check-in state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Load the check-in view of a registration.
    async fn find(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, AttendanceRepositoryError>;

    /// Mark a paid registration present and return the updated view.
    ///
    /// Rejects with `RegistrationNotFound` or `NotPaid`.
    async fn mark_present(
        &self,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, AttendanceRepositoryError>;

    /// Every registration with its registrant, event, and team, ordered by
    /// registration time, newest first.
    async fn registration_report(
        &self,
    ) -> Result<Vec<RegistrationReportEntry>, AttendanceRepositoryError>;
}

/// Fixture repository with no registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAttendanceRepository;

#[async_trait]
impl AttendanceRepository for FixtureAttendanceRepository {
    async fn find(
        &self,
        _registration_id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, AttendanceRepositoryError> {
        Ok(None)
    }

    async fn mark_present(
        &self,
        _registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, AttendanceRepositoryError> {
        Err(AttendanceRepositoryError::rejected(
            RegistrationRejection::RegistrationNotFound,
        ))
    }

    async fn registration_report(
        &self,
    ) -> Result<Vec<RegistrationReportEntry>, AttendanceRepositoryError> {
        Ok(Vec::new())
    }
}

//! Check-in desk operations and the registration report, restricted to staff.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{AttendanceCommand, AttendanceRepository, AttendanceRepositoryError};
use crate::domain::{
    AttendanceRecord, Error, Identity, RegistrationId, RegistrationRejection,
    RegistrationReportEntry,
};

fn map_attendance_error(error: AttendanceRepositoryError) -> Error {
    match error {
        AttendanceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("attendance repository unavailable: {message}"))
        }
        AttendanceRepositoryError::Query { message } => {
            Error::internal(format!("attendance repository error: {message}"))
        }
        AttendanceRepositoryError::Rejected { rejection } => rejection.into_error(),
    }
}

fn ensure_staff(actor: &Identity) -> Result<(), Error> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(Error::forbidden("Admin access required"))
    }
}

/// Attendance service implementing [`AttendanceCommand`].
#[derive(Clone)]
pub struct AttendanceService<R> {
    repo: Arc<R>,
}

impl<R> AttendanceService<R> {
    /// Create a new service.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> AttendanceCommand for AttendanceService<R>
where
    R: AttendanceRepository,
{
    async fn lookup(
        &self,
        actor: &Identity,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, Error> {
        ensure_staff(actor)?;
        self.repo
            .find(registration_id)
            .await
            .map_err(map_attendance_error)?
            .ok_or_else(|| RegistrationRejection::RegistrationNotFound.into_error())
    }

    async fn mark_present(
        &self,
        actor: &Identity,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, Error> {
        ensure_staff(actor)?;
        let record = self
            .repo
            .mark_present(registration_id)
            .await
            .map_err(map_attendance_error)?;
        info!(
            registration_id = %record.registration_id,
            marked_by = %actor.user_id,
            "attendance marked"
        );
        Ok(record)
    }

    async fn registration_report(
        &self,
        actor: &Identity,
    ) -> Result<Vec<RegistrationReportEntry>, Error> {
        ensure_staff(actor)?;
        let entries = self
            .repo
            .registration_report()
            .await
            .map_err(map_attendance_error)?;
        debug!(rows = entries.len(), requested_by = %actor.user_id, "registration report");
        Ok(entries)
    }
}

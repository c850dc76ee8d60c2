//! Driving port for reading payment state.

use async_trait::async_trait;

use crate::domain::{Error, PaymentOverview, RegistrationId, UserId};

/// Read-only payment queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentQuery: Send + Sync {
    /// Payment view of a registration owned by `user_id`.
    async fn status(
        &self,
        user_id: UserId,
        registration_id: RegistrationId,
    ) -> Result<PaymentOverview, Error>;
}

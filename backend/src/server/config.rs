//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use portal_backend::domain::ports::{IdentityResolver, NotificationSink, PaymentGateway};
use portal_backend::outbound::persistence::DbPool;
use zeroize::Zeroizing;

/// Database-backed adapters and the integrations they depend on.
#[derive(Clone)]
pub struct Persistence {
    pub(crate) pool: DbPool,
    pub(crate) gateway: Arc<dyn PaymentGateway>,
    pub(crate) identity: Arc<dyn IdentityResolver>,
}

impl Persistence {
    /// Bundle a pool with the gateway and identity adapters.
    #[must_use]
    pub fn new(
        pool: DbPool,
        gateway: Arc<dyn PaymentGateway>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            pool,
            gateway,
            identity,
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) notifications: Arc<dyn NotificationSink>,
    pub(crate) persistence: Option<Persistence>,
    pub(crate) razorpay_key_id: String,
    pub(crate) signature_secret: Zeroizing<String>,
}

impl ServerConfig {
    /// Construct a configuration that serves in-memory fixtures.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            bind_addr,
            notifications,
            persistence: None,
            razorpay_key_id: String::new(),
            signature_secret: Zeroizing::new(String::new()),
        }
    }

    /// Serve from PostgreSQL instead of fixtures.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Attach the gateway key pair used for checkout and signature checks.
    #[must_use]
    pub fn with_razorpay_keys(
        mut self,
        key_id: impl Into<String>,
        secret: Zeroizing<String>,
    ) -> Self {
        self.razorpay_key_id = key_id.into();
        self.signature_secret = secret;
        self
    }
}

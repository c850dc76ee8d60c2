//! Correlation identifier carried by each request.
//!
//! The HTTP middleware opens a scope per request; domain errors stamp the
//! active id into their payload and notification dispatch carries it into
//! spawned delivery tasks. Tokio task-locals do not cross `tokio::spawn`, so
//! background work must go through [`TraceId::propagate`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// UUID identifying one request across log lines and error bodies.
///
/// # Examples
/// ```
/// use portal_backend::TraceId;
///
/// let id: TraceId = "6f1c2d4e-8a1b-4c3d-9e5f-0a1b2c3d4e5f".parse().expect("uuid");
/// assert_eq!(id.to_string(), "6f1c2d4e-8a1b-4c3d-9e5f-0a1b2c3d4e5f");
/// assert!("registration-7".parse::<TraceId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier for a request that arrived without one.
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of the request currently being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current identifier.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
    /// let id: TraceId = "00000000-0000-0000-0000-000000000000".parse().expect("uuid");
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    /// Capture the current identifier so `fut` keeps it after being spawned.
    pub fn propagate<Fut>(fut: Fut) -> impl Future<Output = Fut::Output> + Send
    where
        Fut: Future + Send,
    {
        let captured = Self::current();
        async move {
            match captured {
                Some(trace_id) => Self::scope(trace_id, fut).await,
                None => fut.await,
            }
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

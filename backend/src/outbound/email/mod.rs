//! Notification sinks for registration confirmations.
//!
//! `HttpEmailSink` posts rendered notifications to a transactional email API;
//! `LogNotificationSink` records them in the log when no provider is
//! configured.

mod http_sink;
mod log_sink;

pub use http_sink::{HttpEmailSink, HttpEmailSinkConfig};
pub use log_sink::LogNotificationSink;

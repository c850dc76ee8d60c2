//! Application settings loaded via OrthoConfig.
//!
//! Values are layered from CLI flags, `PORTAL_*` environment variables and
//! an optional configuration file. Every field is optional; accessors supply
//! defaults so a bare invocation starts against in-memory fixtures.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EMAIL_FROM: &str = "events@portal.local";

/// Errors raised when settings are present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A setting required by the selected mode is absent.
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    /// A setting could not be parsed.
    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Runtime configuration for the portal backend.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string; fixtures are used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// HMAC secret used to verify bearer tokens.
    pub jwt_secret: Option<String>,
    /// Razorpay key id returned to the checkout widget.
    pub razorpay_key_id: Option<String>,
    /// Razorpay key secret used for API calls and signature checks.
    pub razorpay_key_secret: Option<String>,
    /// Razorpay API base URL.
    pub razorpay_base_url: Option<String>,
    /// Timeout for gateway calls, in seconds.
    pub razorpay_timeout_secs: Option<u64>,
    /// Transactional email API endpoint; notifications are logged when absent.
    pub email_api_url: Option<String>,
    /// Bearer key for the email API.
    pub email_api_key: Option<String>,
    /// Sender address for notification emails.
    pub email_from: Option<String>,
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, SettingsError> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(SettingsError::Missing { name })
}

fn parse_url(raw: &str, name: &'static str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::Invalid {
        name,
        message: err.to_string(),
    })
}

impl AppSettings {
    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Configured database URL, if persistence is enabled.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Maximum pool size.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Token verification secret.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when no secret is configured.
    pub fn jwt_secret(&self) -> Result<Zeroizing<String>, SettingsError> {
        required(self.jwt_secret.as_deref(), "jwt_secret").map(|raw| Zeroizing::new(raw.to_owned()))
    }

    /// Razorpay key id.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when no key id is configured.
    pub fn razorpay_key_id(&self) -> Result<&str, SettingsError> {
        required(self.razorpay_key_id.as_deref(), "razorpay_key_id")
    }

    /// Razorpay key secret.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when no key secret is configured.
    pub fn razorpay_key_secret(&self) -> Result<Zeroizing<String>, SettingsError> {
        required(self.razorpay_key_secret.as_deref(), "razorpay_key_secret")
            .map(|raw| Zeroizing::new(raw.to_owned()))
    }

    /// Razorpay API base URL.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] when the override is not a URL.
    pub fn razorpay_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            self.razorpay_base_url
                .as_deref()
                .unwrap_or(DEFAULT_RAZORPAY_BASE_URL),
            "razorpay_base_url",
        )
    }

    /// Timeout applied to gateway requests.
    pub fn razorpay_timeout(&self) -> Duration {
        Duration::from_secs(
            self.razorpay_timeout_secs
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS),
        )
    }

    /// Email API endpoint, if one is configured.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] when the value is not a URL.
    pub fn email_api_url(&self) -> Result<Option<Url>, SettingsError> {
        self.email_api_url
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_url(raw, "email_api_url"))
            .transpose()
    }

    /// Email API key.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when no key is configured.
    pub fn email_api_key(&self) -> Result<Zeroizing<String>, SettingsError> {
        required(self.email_api_key.as_deref(), "email_api_key")
            .map(|raw| Zeroizing::new(raw.to_owned()))
    }

    /// Sender address for notifications.
    pub fn email_from(&self) -> &str {
        self.email_from.as_deref().unwrap_or(DEFAULT_EMAIL_FROM)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "PORTAL_BIND_ADDR",
        "PORTAL_DATABASE_URL",
        "PORTAL_DB_MAX_CONNECTIONS",
        "PORTAL_JWT_SECRET",
        "PORTAL_RAZORPAY_KEY_ID",
        "PORTAL_RAZORPAY_KEY_SECRET",
        "PORTAL_RAZORPAY_BASE_URL",
        "PORTAL_RAZORPAY_TIMEOUT_SECS",
        "PORTAL_EMAIL_API_URL",
        "PORTAL_EMAIL_API_KEY",
        "PORTAL_EMAIL_FROM",
    ];

    fn cleared_env() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("portal-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared_env());

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert!(settings.database_url().is_none());
        assert_eq!(settings.db_max_connections(), 10);
        assert_eq!(
            settings.razorpay_base_url().expect("default url").as_str(),
            "https://api.razorpay.com/v1"
        );
        assert_eq!(settings.razorpay_timeout(), Duration::from_secs(10));
        assert!(settings.email_api_url().expect("absent url").is_none());
        assert_eq!(settings.email_from(), DEFAULT_EMAIL_FROM);
        assert_eq!(
            settings.jwt_secret().map(|_| ()),
            Err(SettingsError::Missing { name: "jwt_secret" })
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut env = cleared_env();
        env.extend([
            ("PORTAL_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "PORTAL_DATABASE_URL",
                Some("postgres://portal@localhost/portal".to_owned()),
            ),
            ("PORTAL_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("PORTAL_JWT_SECRET", Some("signing-secret".to_owned())),
            ("PORTAL_RAZORPAY_KEY_ID", Some("rzp_test_key".to_owned())),
            ("PORTAL_RAZORPAY_TIMEOUT_SECS", Some("3".to_owned())),
            (
                "PORTAL_EMAIL_API_URL",
                Some("https://mail.example.test/send".to_owned()),
            ),
        ]);
        let _guard = lock_env(env);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().port(), 9000);
        assert_eq!(
            settings.database_url(),
            Some("postgres://portal@localhost/portal")
        );
        assert_eq!(settings.db_max_connections(), 4);
        assert_eq!(settings.jwt_secret().expect("secret").as_str(), "signing-secret");
        assert_eq!(settings.razorpay_key_id(), Ok("rzp_test_key"));
        assert_eq!(settings.razorpay_timeout(), Duration::from_secs(3));
        assert_eq!(
            settings
                .email_api_url()
                .expect("valid url")
                .map(|url| url.host_str().map(str::to_owned)),
            Some(Some("mail.example.test".to_owned()))
        );
    }

    #[rstest]
    #[case::blank(Some("   "))]
    #[case::absent(None)]
    fn blank_secrets_count_as_missing(#[case] raw: Option<&str>) {
        let settings = AppSettings {
            razorpay_key_secret: raw.map(str::to_owned),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.razorpay_key_secret(),
            Err(SettingsError::Missing {
                name: "razorpay_key_secret"
            })
        ));
    }

    #[test]
    fn malformed_email_url_is_rejected() {
        let settings = AppSettings {
            email_api_url: Some("not a url".to_owned()),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.email_api_url(),
            Err(SettingsError::Invalid { name: "email_api_url", .. })
        ));
    }
}

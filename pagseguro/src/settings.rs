//! Client configuration: credentials, endpoint, and call options.
//!
//! [`Settings`] is the full configuration a client holds. It starts from
//! provider defaults and can be adjusted at construction with `with_*`
//! builders or later through [`Settings::merged`] with a partial
//! [`Overrides`] value, the shape a host application hands over when it
//! reconfigures a live client.
//!
//! Credential fields are stored unchecked; [`Settings::credentials`] is the
//! validation gate that every client passes through before touching the
//! network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::Error;

/// Production webservice host.
pub const PRODUCTION_HOST: &str = "ws.pagseguro.uol.com.br";

/// Sandbox webservice host.
pub const SANDBOX_HOST: &str = "ws.sandbox.pagseguro.uol.com.br";

/// Default charset sent with form-encoded requests.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Default socket timeout for form-encoded requests, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

/// Credential mode selected by the `type` configuration key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Merchant account, authenticated with `email` + `token`.
    #[default]
    Seller,
    /// Third-party application, authenticated with `appId` + `appKey`.
    Application,
}

impl Mode {
    /// The mode's configuration value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Mode`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown credential mode `{0}`, expected `seller` or `application`")]
pub struct ModeFormatError(String);

impl FromStr for Mode {
    type Err = ModeFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(Self::Seller),
            "application" => Ok(Self::Application),
            other => Err(ModeFormatError(other.to_string())),
        }
    }
}

/// Webservice endpoint, assembled into a URL per call.
///
/// The operation layer supplies path and query per request; host overrides
/// are how a client is pointed at the sandbox or a test double.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoint {
    /// URL scheme; an empty string omits the `scheme://` prefix.
    pub scheme: String,
    /// Host name.
    pub host: String,
    /// Port, rendered explicitly when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Request path.
    pub path: String,
    /// Query string, without the leading `?`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Fragment, without the leading `#`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: PRODUCTION_HOST.to_string(),
            port: Some(443),
            path: String::new(),
            query: None,
            fragment: None,
        }
    }
}

impl Endpoint {
    /// The sandbox endpoint.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            host: SANDBOX_HOST.to_string(),
            ..Self::default()
        }
    }

    /// Composes the URL string, omitting absent components.
    #[must_use]
    pub fn assemble(&self) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() {
            url.push_str(&self.scheme);
            url.push_str("://");
        }
        url.push_str(&self.host);
        if let Some(port) = self.port {
            url.push(':');
            url.push_str(&port.to_string());
        }
        url.push_str(&self.path);
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

/// Full client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Seller account e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Seller API token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Application id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Application key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    /// Merchant authorization code used by application-mode consultation
    /// and checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
    /// Credential mode the client authenticates as.
    #[serde(rename = "type")]
    pub mode: Mode,
    /// When true, single-transaction reads are projected to the basic
    /// shape instead of returned verbatim.
    pub only_basic: bool,
    /// Charset advertised on form-encoded requests.
    pub charset: String,
    /// Socket timeout for form-encoded requests, in seconds.
    pub timeout_seconds: u64,
    /// Webservice endpoint.
    pub endpoint: Endpoint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email: None,
            token: None,
            app_id: None,
            app_key: None,
            authorization_code: None,
            mode: Mode::Seller,
            only_basic: false,
            charset: DEFAULT_CHARSET.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            endpoint: Endpoint::default(),
        }
    }
}

impl Settings {
    /// Seller-mode settings against the production endpoint.
    ///
    /// Fields are stored as given; [`Settings::credentials`] validates them.
    #[must_use]
    pub fn seller(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            token: Some(token.into()),
            mode: Mode::Seller,
            ..Self::default()
        }
    }

    /// Application-mode settings against the production endpoint.
    ///
    /// Fields are stored as given; [`Settings::credentials`] validates them.
    #[must_use]
    pub fn application(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_key: Some(app_key.into()),
            mode: Mode::Application,
            ..Self::default()
        }
    }

    /// Sets the merchant authorization code.
    #[must_use]
    pub fn with_authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    /// Sets the basic-shape flag for single-transaction reads.
    #[must_use]
    pub const fn with_only_basic(mut self, only_basic: bool) -> Self {
        self.only_basic = only_basic;
        self
    }

    /// Sets the charset advertised on form-encoded requests.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Sets the socket timeout for form-encoded requests.
    #[must_use]
    pub const fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the webservice endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Derives validated credentials for the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first required field that is
    /// missing or fails validation.
    pub fn credentials(&self) -> Result<Credentials, Error> {
        match self.mode {
            Mode::Seller => {
                let email = require(&self.email, "email")?;
                let token = require(&self.token, "token")?;
                Credentials::seller(email, token)
            }
            Mode::Application => {
                let app_id = require(&self.app_id, "appId")?;
                let app_key = require(&self.app_key, "appKey")?;
                let credentials = Credentials::application(app_id, app_key)?;
                Ok(match &self.authorization_code {
                    Some(code) => credentials.with_authorization_code(code.clone()),
                    None => credentials,
                })
            }
        }
    }

    /// Returns a copy with the given overrides applied.
    #[must_use]
    pub fn merged(&self, overrides: Overrides) -> Self {
        let mut merged = self.clone();
        let Overrides {
            email,
            token,
            app_id,
            app_key,
            authorization_code,
            mode,
            only_basic,
            charset,
            timeout_seconds,
            endpoint,
        } = overrides;
        if let Some(email) = email {
            merged.email = Some(email);
        }
        if let Some(token) = token {
            merged.token = Some(token);
        }
        if let Some(app_id) = app_id {
            merged.app_id = Some(app_id);
        }
        if let Some(app_key) = app_key {
            merged.app_key = Some(app_key);
        }
        if let Some(code) = authorization_code {
            merged.authorization_code = Some(code);
        }
        if let Some(mode) = mode {
            merged.mode = mode;
        }
        if let Some(only_basic) = only_basic {
            merged.only_basic = only_basic;
        }
        if let Some(charset) = charset {
            merged.charset = charset;
        }
        if let Some(seconds) = timeout_seconds {
            merged.timeout_seconds = seconds;
        }
        if let Some(endpoint) = endpoint {
            merged.endpoint = endpoint;
        }
        merged
    }
}

fn require<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, Error> {
    value.as_deref().ok_or_else(|| Error::Config {
        field,
        reason: "not set".to_string(),
    })
}

/// Partial settings override applied by [`Settings::merged`].
///
/// Absent fields keep their current value, so an empty override is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Overrides {
    /// Seller account e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Seller API token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Application id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Application key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    /// Merchant authorization code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
    /// Credential mode.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Basic-shape flag for single-transaction reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_basic: Option<bool>,
    /// Charset for form-encoded requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Socket timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Webservice endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

impl Overrides {
    /// An override that changes nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// True when no field is overridden.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.token.is_none()
            && self.app_id.is_none()
            && self.app_key.is_none()
            && self.authorization_code.is_none()
            && self.mode.is_none()
            && self.only_basic.is_none()
            && self.charset.is_none()
            && self.timeout_seconds.is_none()
            && self.endpoint.is_none()
    }

    /// Overrides the seller account e-mail.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Overrides the seller API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the application id.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Overrides the application key.
    #[must_use]
    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    /// Overrides the merchant authorization code.
    #[must_use]
    pub fn with_authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    /// Overrides the credential mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Overrides the basic-shape flag.
    #[must_use]
    pub const fn with_only_basic(mut self, only_basic: bool) -> Self {
        self.only_basic = Some(only_basic);
        self
    }

    /// Overrides the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Overrides the socket timeout.
    #[must_use]
    pub const fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Overrides the webservice endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

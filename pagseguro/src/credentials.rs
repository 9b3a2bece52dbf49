//! Credential modes and per-field validation.
//!
//! Every call authenticates either as the merchant directly (seller mode,
//! `email` + `token`) or as a third-party application acting on a merchant's
//! behalf (application mode, `appId` + `appKey`, optionally carrying the
//! `authorizationCode` granted by a finished authorization). Field formats
//! are checked here, before any payload is built or sent.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::settings::Mode;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("Invalid e-mail pattern")
});

/// Maximum length the provider accepts for an account e-mail.
pub const MAX_EMAIL_LEN: usize = 60;

/// Length of seller tokens and application keys.
pub const TOKEN_LEN: usize = 32;

/// Maximum length of an application id.
pub const MAX_APP_ID_LEN: usize = 60;

/// True when `value` is a plausible account e-mail within the provider's
/// length limit.
#[must_use]
pub fn validate_email(value: &str) -> bool {
    value.len() <= MAX_EMAIL_LEN && EMAIL.is_match(value)
}

/// True when `value` has the shape of a seller API token.
#[must_use]
pub fn validate_token(value: &str) -> bool {
    value.len() == TOKEN_LEN && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// True when `value` has the shape of an application id.
#[must_use]
pub fn validate_app_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_APP_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// True when `value` has the shape of an application key.
#[must_use]
pub fn validate_app_key(value: &str) -> bool {
    value.len() == TOKEN_LEN && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Validated credentials for one of the two supported modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Merchant account credentials.
    Seller {
        /// Account e-mail.
        email: String,
        /// Account API token.
        token: String,
    },
    /// Third-party application credentials.
    Application {
        /// Application id.
        app_id: String,
        /// Application key.
        app_key: String,
        /// Authorization granted by a merchant, required to act on that
        /// merchant's transactions.
        authorization_code: Option<String>,
    },
}

impl Credentials {
    /// Builds seller-mode credentials, validating both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first field that fails
    /// validation.
    pub fn seller(email: impl Into<String>, token: impl Into<String>) -> Result<Self, Error> {
        let email = email.into();
        if !validate_email(&email) {
            return Err(Error::Config {
                field: "email",
                reason: format!(
                    "must be a valid e-mail address of at most {MAX_EMAIL_LEN} characters"
                ),
            });
        }
        let token = token.into();
        if !validate_token(&token) {
            return Err(Error::Config {
                field: "token",
                reason: format!("must be {TOKEN_LEN} alphanumeric characters"),
            });
        }
        Ok(Self::Seller { email, token })
    }

    /// Builds application-mode credentials, validating both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first field that fails
    /// validation.
    pub fn application(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let app_id = app_id.into();
        if !validate_app_id(&app_id) {
            return Err(Error::Config {
                field: "appId",
                reason: format!(
                    "must be 1 to {MAX_APP_ID_LEN} characters of lowercase letters, digits, `-` or `_`"
                ),
            });
        }
        let app_key = app_key.into();
        if !validate_app_key(&app_key) {
            return Err(Error::Config {
                field: "appKey",
                reason: format!("must be {TOKEN_LEN} alphanumeric characters"),
            });
        }
        Ok(Self::Application {
            app_id,
            app_key,
            authorization_code: None,
        })
    }

    /// Attaches a merchant authorization code. No effect in seller mode.
    #[must_use]
    pub fn with_authorization_code(mut self, code: impl Into<String>) -> Self {
        if let Self::Application {
            authorization_code, ..
        } = &mut self
        {
            *authorization_code = Some(code.into());
        }
        self
    }

    /// The credential mode these credentials authenticate as.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Seller { .. } => Mode::Seller,
            Self::Application { .. } => Mode::Application,
        }
    }

    /// The attached authorization code, if any.
    #[must_use]
    pub fn authorization_code(&self) -> Option<&str> {
        match self {
            Self::Application {
                authorization_code, ..
            } => authorization_code.as_deref(),
            Self::Seller { .. } => None,
        }
    }

    /// Form or query parameters that authenticate a request.
    ///
    /// The authorization code is never included here; the consultation and
    /// checkout flows append it themselves when the operation needs it.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Seller { email, token } => {
                vec![("email", email.as_str()), ("token", token.as_str())]
            }
            Self::Application {
                app_id, app_key, ..
            } => vec![("appId", app_id.as_str()), ("appKey", app_key.as_str())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "A1B2C3D4E5F6A7B8C9D0E1F2A3B4C5D6";

    #[test]
    fn test_validate_email() {
        assert!(validate_email("loja@example.com.br"));
        assert!(!validate_email("loja@example"));
        assert!(!validate_email("not-an-email"));
        let long = format!("{}@example.com", "a".repeat(60));
        assert!(!validate_email(&long));
    }

    #[test]
    fn test_validate_token_and_app_key() {
        assert!(validate_token(TOKEN));
        assert!(!validate_token("short"));
        assert!(!validate_token(&TOKEN.replace('A', "!")));
        assert!(validate_app_key(TOKEN));
        assert!(!validate_app_key(""));
    }

    #[test]
    fn test_validate_app_id() {
        assert!(validate_app_id("app0155491563"));
        assert!(validate_app_id("minha-loja_2"));
        assert!(!validate_app_id(""));
        assert!(!validate_app_id("Maiusculas"));
        assert!(!validate_app_id(&"a".repeat(61)));
    }

    #[test]
    fn test_seller_constructor_names_failing_field() {
        let err = Credentials::seller("loja@example.com", "bad").unwrap_err();
        assert!(matches!(err, Error::Config { field: "token", .. }));

        let err = Credentials::seller("bad", TOKEN).unwrap_err();
        assert!(matches!(err, Error::Config { field: "email", .. }));

        assert!(Credentials::seller("loja@example.com", TOKEN).is_ok());
    }

    #[test]
    fn test_application_constructor_names_failing_field() {
        let err = Credentials::application("", TOKEN).unwrap_err();
        assert!(matches!(err, Error::Config { field: "appId", .. }));

        let err = Credentials::application("app0155491563", "nope").unwrap_err();
        assert!(matches!(err, Error::Config { field: "appKey", .. }));
    }

    #[test]
    fn test_form_fields_by_mode() {
        let seller = Credentials::seller("loja@example.com", TOKEN).unwrap();
        assert_eq!(seller.mode(), Mode::Seller);
        assert_eq!(
            seller.form_fields(),
            vec![("email", "loja@example.com"), ("token", TOKEN)]
        );

        let app = Credentials::application("app0155491563", TOKEN)
            .unwrap()
            .with_authorization_code("FEDC654399887733");
        assert_eq!(app.mode(), Mode::Application);
        assert_eq!(
            app.form_fields(),
            vec![("appId", "app0155491563"), ("appKey", TOKEN)]
        );
        assert_eq!(app.authorization_code(), Some("FEDC654399887733"));
    }

    #[test]
    fn test_authorization_code_ignored_in_seller_mode() {
        let seller = Credentials::seller("loja@example.com", TOKEN)
            .unwrap()
            .with_authorization_code("FEDC654399887733");
        assert_eq!(seller.authorization_code(), None);
    }
}

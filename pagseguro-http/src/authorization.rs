//! Client for requesting authorization over a seller account.
//!
//! Provides [`AuthorizationClient`], which submits an
//! [`AuthorizationRequest`] as an XML document and returns the code the
//! seller must visit to approve the application.

use pagseguro::authorization::{self, AuthorizationRequest, AuthorizationResponse};
use pagseguro::error::{Error, LastError};
use pagseguro::settings::{Mode, Overrides, Settings};
use reqwest::header::HeaderMap;

#[cfg(feature = "telemetry")]
use crate::transport::with_span;
use crate::transport::{Transport, owned_params};

/// Client for the `POST /v2/authorizations/request` operation.
///
/// Only application credentials may request authorizations; seller
/// credentials are refused before any request is made.
#[derive(Debug, Clone)]
pub struct AuthorizationClient {
    /// Shared provider session.
    transport: Transport,
}

impl AuthorizationClient {
    /// Creates a client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a credential field required by the
    /// configured mode is missing or malformed.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        Ok(Self {
            transport: Transport::new(settings)?,
        })
    }

    /// Attaches custom headers to every request this client makes.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.transport = self.transport.with_headers(headers);
        self
    }

    /// The settings currently in effect.
    pub const fn settings(&self) -> &Settings {
        self.transport.settings()
    }

    /// The complaint recorded by the most recent failed call, if any.
    pub const fn last_error(&self) -> Option<&LastError> {
        self.transport.last_error()
    }

    /// Applies a settings override set, revalidating the credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the merged settings fail validation;
    /// the previous settings stay in effect.
    pub fn configure(&mut self, overrides: Overrides) -> Result<&Settings, Error> {
        self.transport.configure(overrides)
    }

    /// Submits the authorization request and returns the approval redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMode`] under seller credentials,
    /// [`Error::ProviderValidation`] when the provider rejects a field, and
    /// the usual transport and decoding errors otherwise. Every failure is
    /// also recorded as [`Self::last_error`].
    #[cfg(feature = "telemetry")]
    pub async fn finalize(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse, Error> {
        let span = tracing::info_span!(
            "pagseguro.authorization.finalize",
            permissions = request.permissions().len()
        );
        with_span(self.finalize_recorded(request), span).await
    }

    /// Submits the authorization request and returns the approval redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMode`] under seller credentials,
    /// [`Error::ProviderValidation`] when the provider rejects a field, and
    /// the usual transport and decoding errors otherwise. Every failure is
    /// also recorded as [`Self::last_error`].
    #[cfg(not(feature = "telemetry"))]
    pub async fn finalize(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse, Error> {
        self.finalize_recorded(request).await
    }

    async fn finalize_recorded(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse, Error> {
        let result = self.finalize_inner(request).await;
        if let Err(error) = &result {
            self.transport.record(error);
        }
        result
    }

    async fn finalize_inner(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse, Error> {
        let mode = self.transport.credentials().mode();
        if mode != Mode::Application {
            return Err(Error::UnsupportedMode {
                operation: "authorization",
                mode,
            });
        }
        let query = owned_params(self.transport.credentials().form_fields());
        let raw = self
            .transport
            .post_xml(
                authorization::REQUEST_PATH,
                &query,
                request.to_xml(),
                "POST /v2/authorizations/request",
            )
            .await?;
        authorization::normalize_response(&raw)
    }
}

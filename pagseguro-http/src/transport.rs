//! One network exchange against the provider.
//!
//! [`Transport`] owns the validated settings, the HTTP client, and the
//! last-error slot shared by every operation client. It sends one of the
//! provider's three request shapes and hands back the decoded body:
//!
//! - [`Transport::post_xml`] — raw XML body, credentials in the query
//!   string. The provider reports failures for this shape inside the body,
//!   so no HTTP status classification happens here.
//! - [`Transport::get_form`] — parameters in the query string, with the
//!   status classification the provider documents for form requests.
//! - [`Transport::post_form`] — parameters in a form-encoded body, same
//!   status classification.
//!
//! Whatever the shape, a body that decodes to an `errors` element fails
//! with [`Error::ProviderValidation`] and fills the last-error slot; any
//! other decoded body clears it.

use std::time::Duration;

use pagseguro::credentials::Credentials;
use pagseguro::error::{Error, LastError};
use pagseguro::settings::{Overrides, Settings};
use pagseguro::xml::{self, Map};
use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Content type of XML POST requests. The provider's XML endpoints answer
/// in Latin-1 and expect it announced this way.
const XML_CONTENT_TYPE: &str = "application/xml; charset=ISO-8859-1";

/// Synchronous-feeling single-exchange transport.
///
/// Holds mutable per-call state, so one instance serves one request at a
/// time; use one instance per in-flight request for concurrency.
#[derive(Debug, Clone)]
pub struct Transport {
    settings: Settings,
    credentials: Credentials,
    client: reqwest::Client,
    headers: HeaderMap,
    last_error: Option<LastError>,
}

impl Transport {
    /// Validates the settings and builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the credential fields required by
    /// the configured mode are missing or invalid.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let credentials = settings.credentials()?;
        Ok(Self {
            settings,
            credentials,
            client: reqwest::Client::new(),
            headers: HeaderMap::new(),
            last_error: None,
        })
    }

    /// Attaches custom headers to every future request. A `Content-Type`
    /// entry here replaces the one the transport would set on its own.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validated credentials for the configured mode.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Most recent failure, for inspection after a call returned an error.
    #[must_use]
    pub const fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Merges overrides into the current settings and re-validates the
    /// credentials. An empty override returns the current settings without
    /// re-validating; a failed validation leaves the settings untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the field that failed validation.
    pub fn configure(&mut self, overrides: Overrides) -> Result<&Settings, Error> {
        if overrides.is_empty() {
            return Ok(&self.settings);
        }
        let merged = self.settings.merged(overrides);
        let credentials = merged.credentials()?;
        self.settings = merged;
        self.credentials = credentials;
        Ok(&self.settings)
    }

    /// Records a failure in the last-error slot.
    pub fn record(&mut self, error: &Error) {
        self.last_error = Some(LastError::from(error));
    }

    /// POSTs a raw XML document, carrying `query` in the URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the exchange itself fails or the
    /// body comes back empty, [`Error::MalformedResponse`] when the body is
    /// not XML, and [`Error::ProviderValidation`] when it decodes to an
    /// `errors` element. The HTTP status is not classified for this shape.
    pub async fn post_xml(
        &mut self,
        path: &str,
        query: &[(String, String)],
        body: String,
        context: &'static str,
    ) -> Result<Map, Error> {
        let url = self.request_url(path, Some(encode_params(query)));
        let request = self.apply_headers(self.client.post(&url).body(body), XML_CONTENT_TYPE);
        let result = self.exchange_unclassified(request, context).await;
        record_result_on_span(&result);
        result
    }

    /// GETs with `params` in the query string.
    ///
    /// # Errors
    ///
    /// Returns the status-mapped errors ([`Error::RejectedRequest`],
    /// [`Error::Authentication`], [`Error::NotFound`],
    /// [`Error::UnknownProvider`]) before decoding, then the same decoding
    /// errors as [`Transport::post_xml`].
    pub async fn get_form(
        &mut self,
        path: &str,
        params: &[(String, String)],
        context: &'static str,
    ) -> Result<Map, Error> {
        let url = self.request_url(path, Some(encode_params(params)));
        let request = self.apply_headers(self.client.get(&url), &self.form_content_type());
        let result = self.exchange_classified(request, context).await;
        record_result_on_span(&result);
        result
    }

    /// POSTs `params` as a form-encoded body.
    ///
    /// # Errors
    ///
    /// Same error mapping as [`Transport::get_form`].
    pub async fn post_form(
        &mut self,
        path: &str,
        params: &[(String, String)],
        context: &'static str,
    ) -> Result<Map, Error> {
        let url = self.request_url(path, None);
        let request = self.apply_headers(
            self.client.post(&url).body(encode_params(params)),
            &self.form_content_type(),
        );
        let result = self.exchange_classified(request, context).await;
        record_result_on_span(&result);
        result
    }

    fn request_url(&self, path: &str, query: Option<String>) -> String {
        let mut endpoint = self.settings.endpoint.clone();
        endpoint.path = path.to_string();
        endpoint.query = query;
        endpoint.assemble()
    }

    /// Sets `content_type` unless the custom headers already carry one,
    /// then adds the custom headers.
    fn apply_headers(
        &self,
        mut request: reqwest::RequestBuilder,
        content_type: &str,
    ) -> reqwest::RequestBuilder {
        if !self.headers.contains_key(CONTENT_TYPE) {
            request = request.header(CONTENT_TYPE, content_type);
        }
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        request
    }

    async fn exchange_unclassified(
        &mut self,
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<Map, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(context, &e))?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(context, &e))?;
        if body.is_empty() {
            return Err(Error::Transport {
                message: format!("{context}: empty response body"),
            });
        }
        self.decode(&body)
    }

    async fn exchange_classified(
        &mut self,
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<Map, Error> {
        let response = request
            .timeout(Duration::from_secs(self.settings.timeout_seconds))
            .send()
            .await
            .map_err(|e| transport_error(context, &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(context, &e))?;
        classify_status(status, &body)?;
        self.decode(&body)
    }

    fn form_content_type(&self) -> String {
        format!(
            "application/x-www-form-urlencoded; charset={}",
            self.settings.charset
        )
    }

    /// Decodes a response body and applies the `errors`-element contract.
    fn decode(&mut self, body: &str) -> Result<Map, Error> {
        let decoded = xml::parse(body)?;
        if let Some(errors) = decoded.get("errors") {
            let error = Error::ProviderValidation {
                errors: errors.clone(),
            };
            self.last_error = Some(LastError::from(&error));
            return Err(error);
        }
        self.last_error = None;
        Ok(decoded)
    }
}

fn classify_status(status: u16, body: &str) -> Result<(), Error> {
    match status {
        200 => Ok(()),
        400 => Err(Error::RejectedRequest {
            body: body.to_string(),
        }),
        401 => Err(Error::Authentication),
        404 => Err(Error::NotFound),
        other => Err(Error::UnknownProvider { status: other }),
    }
}

fn transport_error(context: &'static str, source: &reqwest::Error) -> Error {
    Error::Transport {
        message: format!("{context}: {source}"),
    }
}

/// Owned copies of credential fields, in the shape the request helpers take.
pub(crate) fn owned_params(fields: Vec<(&'static str, &str)>) -> Vec<(String, String)> {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn encode_params(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(
            params
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
        .finish()
}

/// Records the outcome of a request on the current tracing span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R>(result: &Result<R, Error>) {
    let span = tracing::Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to provider failed");
        }
    }
}

/// Records the outcome of a request on the current tracing span.
/// Noop if the telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R>(_result: &Result<R, Error>) {}

/// Instruments a future with a given tracing span.
#[cfg(feature = "telemetry")]
pub(crate) fn with_span<F: Future>(fut: F, span: tracing::Span) -> impl Future<Output = F::Output> {
    use tracing::Instrument;
    fut.instrument(span)
}

//! Client for transaction and notification consultation.
//!
//! Provides [`ConsultClient`], which reads a single transaction or
//! authorization notification by code and searches transactions over a
//! date window.

use pagseguro::consult::{self, ConsultMode, ConsultResponse, ReadKind, SearchOptions, SearchQuery};
use pagseguro::error::{Error, LastError};
use pagseguro::settings::{Overrides, Settings};
use reqwest::header::HeaderMap;

#[cfg(feature = "telemetry")]
use crate::transport::with_span;
use crate::transport::{Transport, owned_params};

/// Client for the `GET /v2/transactions/*` and
/// `GET /v2/authorizations/notifications/*` operations.
#[derive(Debug, Clone)]
pub struct ConsultClient {
    /// Shared provider session.
    transport: Transport,
    /// Which transaction listing searches run against.
    mode: ConsultMode,
}

impl ConsultClient {
    /// Creates a client from validated settings.
    ///
    /// Searches run against completed transactions until
    /// [`Self::with_mode`] says otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a credential field required by the
    /// configured mode is missing or malformed.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        Ok(Self {
            transport: Transport::new(settings)?,
            mode: ConsultMode::default(),
        })
    }

    /// Switches between the completed and abandoned transaction listings.
    #[must_use]
    pub const fn with_mode(mut self, mode: ConsultMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attaches custom headers to every request this client makes.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.transport = self.transport.with_headers(headers);
        self
    }

    /// The listing searches currently run against.
    pub const fn mode(&self) -> ConsultMode {
        self.mode
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

    /// Fetches one transaction or authorization notification by code.
    ///
    /// Under `onlyBasic` settings a transaction document is flattened to a
    /// [`consult::TransactionSummary`] before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown codes,
    /// [`Error::Authentication`] for refused credentials, and the usual
    /// transport and decoding errors otherwise. Every failure is also
    /// recorded as [`Self::last_error`].
    #[cfg(feature = "telemetry")]
    pub async fn read(&mut self, code: &str, kind: ReadKind) -> Result<ConsultResponse, Error> {
        let span = tracing::info_span!("pagseguro.consult.read", code);
        with_span(self.read_recorded(code, kind), span).await
    }

    /// Fetches one transaction or authorization notification by code.
    ///
    /// Under `onlyBasic` settings a transaction document is flattened to a
    /// [`consult::TransactionSummary`] before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown codes,
    /// [`Error::Authentication`] for refused credentials, and the usual
    /// transport and decoding errors otherwise. Every failure is also
    /// recorded as [`Self::last_error`].
    #[cfg(not(feature = "telemetry"))]
    pub async fn read(&mut self, code: &str, kind: ReadKind) -> Result<ConsultResponse, Error> {
        self.read_recorded(code, kind).await
    }

    /// Searches the configured listing over a date window.
    ///
    /// Dates accept RFC 3339, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M:%S`, or
    /// a bare `%Y-%m-%d` taken at midnight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateParse`] before any request when a bound does
    /// not parse, and the usual transport and decoding errors otherwise.
    /// Every failure is also recorded as [`Self::last_error`].
    #[cfg(feature = "telemetry")]
    pub async fn find(
        &mut self,
        begin: &str,
        end: &str,
        options: SearchOptions,
    ) -> Result<ConsultResponse, Error> {
        let span = tracing::info_span!("pagseguro.consult.find", begin, end);
        with_span(self.find_recorded(begin, end, options), span).await
    }

    /// Searches the configured listing over a date window.
    ///
    /// Dates accept RFC 3339, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M:%S`, or
    /// a bare `%Y-%m-%d` taken at midnight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateParse`] before any request when a bound does
    /// not parse, and the usual transport and decoding errors otherwise.
    /// Every failure is also recorded as [`Self::last_error`].
    #[cfg(not(feature = "telemetry"))]
    pub async fn find(
        &mut self,
        begin: &str,
        end: &str,
        options: SearchOptions,
    ) -> Result<ConsultResponse, Error> {
        self.find_recorded(begin, end, options).await
    }

    async fn read_recorded(&mut self, code: &str, kind: ReadKind) -> Result<ConsultResponse, Error> {
        let result = self.read_inner(code, kind).await;
        if let Err(error) = &result {
            self.transport.record(error);
        }
        result
    }

    async fn read_inner(&mut self, code: &str, kind: ReadKind) -> Result<ConsultResponse, Error> {
        let path = format!("{}{}", kind.base_path(), code);
        let params = self.credential_params();
        let context = match kind {
            ReadKind::Transaction => "GET /v2/transactions/",
            ReadKind::Authorization => "GET /v2/authorizations/notifications/",
        };
        let raw = self.transport.get_form(&path, &params, context).await?;
        consult::normalize_response(&raw, self.transport.settings().only_basic, self.mode)
    }

    async fn find_recorded(
        &mut self,
        begin: &str,
        end: &str,
        options: SearchOptions,
    ) -> Result<ConsultResponse, Error> {
        let result = self.find_inner(begin, end, options).await;
        if let Err(error) = &result {
            self.transport.record(error);
        }
        result
    }

    async fn find_inner(
        &mut self,
        begin: &str,
        end: &str,
        options: SearchOptions,
    ) -> Result<ConsultResponse, Error> {
        let query = SearchQuery::new(begin, end, options)?;
        let mut params = self.credential_params();
        for (name, value) in query.params() {
            params.push((name.to_string(), value));
        }
        let context = match self.mode {
            ConsultMode::Transactions => "GET /v2/transactions/",
            ConsultMode::Abandoned => "GET /v2/transactions/abandoned/",
        };
        let raw = self
            .transport
            .get_form(self.mode.search_path(), &params, context)
            .await?;
        consult::normalize_response(&raw, self.transport.settings().only_basic, self.mode)
    }

    /// Credential query fields, with the authorization code appended when
    /// the application acts on behalf of a seller.
    fn credential_params(&self) -> Vec<(String, String)> {
        let credentials = self.transport.credentials();
        let mut params = owned_params(credentials.form_fields());
        if let Some(code) = credentials.authorization_code() {
            params.push(("authorizationCode".to_string(), code.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use pagseguro::settings::Endpoint;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const EMAIL: &str = "seller@example.com";
    const TOKEN: &str = "A1B2C3D4E5F6A7B8C9D0E1F2A3B4C5D6";

    const TRANSACTION_BODY: &str = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
        <transaction>\
        <date>2020-01-02T03:04:05.000-03:00</date>\
        <lastEventDate>2020-01-03T10:11:12.000-03:00</lastEventDate>\
        <code>9E884542-81B3-4419-9A75-BCC6FB495EF1</code>\
        <reference>REF1234</reference>\
        <status>3</status>\
        <paymentMethod><type>1</type><code>101</code></paymentMethod>\
        <grossAmount>49900.00</grossAmount>\
        </transaction>";

    const SEARCH_BODY: &str = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
        <transactionSearchResult>\
        <date>2020-02-01T00:00:00.000-03:00</date>\
        <currentPage>1</currentPage>\
        <resultsInThisPage>2</resultsInThisPage>\
        <totalPages>1</totalPages>\
        <transactions>\
        <transaction><date>2020-01-02T03:04:05.000-03:00</date>\
        <lastEventDate>2020-01-03T10:11:12.000-03:00</lastEventDate>\
        <code>TX-1</code><status>3</status>\
        <paymentMethod><type>1</type><code>101</code></paymentMethod>\
        <grossAmount>49900.00</grossAmount></transaction>\
        <transaction><date>2020-01-05T08:09:10.000-03:00</date>\
        <lastEventDate>2020-01-06T11:12:13.000-03:00</lastEventDate>\
        <code>TX-2</code><status>7</status>\
        <paymentMethod><type>2</type><code>202</code></paymentMethod>\
        <grossAmount>150.00</grossAmount></transaction>\
        </transactions>\
        </transactionSearchResult>";

    fn local_endpoint(server: &MockServer) -> Endpoint {
        let url = url::Url::parse(&server.uri()).unwrap();
        Endpoint {
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap().to_string(),
            port: url.port(),
            ..Endpoint::default()
        }
    }

    fn seller_client(server: &MockServer) -> ConsultClient {
        let settings = Settings::seller(EMAIL, TOKEN).with_endpoint(local_endpoint(server));
        ConsultClient::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_read_returns_the_full_transaction_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/9E884542-81B3-4419-9A75-BCC6FB495EF1"))
            .and(query_param("email", EMAIL))
            .and(query_param("token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_string(TRANSACTION_BODY))
            .expect(1)
            .mount(&server)
            .await;
        let mut client = seller_client(&server);

        let response = client
            .read("9E884542-81B3-4419-9A75-BCC6FB495EF1", ReadKind::Transaction)
            .await
            .unwrap();

        let ConsultResponse::Transaction(transaction) = response else {
            panic!("expected the full document");
        };
        assert_eq!(transaction.get_text("reference"), Some("REF1234"));
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn test_read_flattens_to_a_summary_under_only_basic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TRANSACTION_BODY))
            .mount(&server)
            .await;
        let settings = Settings::seller(EMAIL, TOKEN)
            .with_only_basic(true)
            .with_endpoint(local_endpoint(&server));
        let mut client = ConsultClient::new(settings).unwrap();

        let response = client
            .read("9E884542-81B3-4419-9A75-BCC6FB495EF1", ReadKind::Transaction)
            .await
            .unwrap();

        let ConsultResponse::Summary(summary) = response else {
            panic!("expected the flattened entry");
        };
        assert_eq!(summary.date, "2020-01-02 03:04:05");
        assert_eq!(summary.modified, "2020-01-03T10:11:12.000-03:00");
        assert_eq!(summary.value, "49900.00");
        assert_eq!(summary.status, 3);
        assert_eq!(summary.payment_type, Some(1));
        assert_eq!(summary.payment_code, Some(101));
    }

    #[tokio::test]
    async fn test_read_reaches_the_notification_listing() {
        let server = MockServer::start().await;
        let body = "<?xml version=\"1.0\"?><authorization>\
            <code>AUTH-77</code><reference>REF1234</reference>\
            </authorization>";
        Mock::given(method("GET"))
            .and(path("/v2/authorizations/notifications/NC-1D8E"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
        let mut client = seller_client(&server);

        let response = client.read("NC-1D8E", ReadKind::Authorization).await.unwrap();

        let ConsultResponse::Authorization(authorization) = response else {
            panic!("expected the authorization document");
        };
        assert_eq!(authorization.get_text("code"), Some("AUTH-77"));
    }

    #[tokio::test]
    async fn test_find_rejects_bad_dates_before_any_request() {
        let server = MockServer::start().await;
        let mut client = seller_client(&server);

        let result = client
            .find("01-31-2020", "2020-02-01", SearchOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(Error::DateParse { ref input }) if input == "01-31-2020"
        ));
        assert!(matches!(client.last_error(), Some(LastError::Message(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_sends_the_window_and_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/"))
            .and(query_param("email", EMAIL))
            .and(query_param("initialDate", "2020-01-01T00:00:00"))
            .and(query_param("finalDate", "2020-02-01T23:59:59"))
            .and(query_param("page", "2"))
            .and(query_param("maxPageResults", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_BODY))
            .expect(1)
            .mount(&server)
            .await;
        let mut client = seller_client(&server);
        let options = SearchOptions::default().with_page(2).with_max_page_results(10);

        let response = client
            .find("2020-01-01", "2020-02-01T23:59:59", options)
            .await
            .unwrap();

        let ConsultResponse::Search(page) = response else {
            panic!("expected the search page");
        };
        assert_eq!(page.pages, 1);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.current, 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].code, "TX-2");
        assert_eq!(page.items[1].payment_code, Some(202));
    }

    #[tokio::test]
    async fn test_abandoned_searches_use_their_own_listing() {
        let server = MockServer::start().await;
        let body = "<?xml version=\"1.0\"?><transactionSearchResult>\
            <currentPage>1</currentPage><resultsInThisPage>1</resultsInThisPage>\
            <totalPages>1</totalPages>\
            <transactions><transaction>\
            <date>2020-01-02T03:04:05.000-03:00</date>\
            <lastEventDate>2020-01-03T10:11:12.000-03:00</lastEventDate>\
            <code>AB-1</code><status>1</status><grossAmount>10.00</grossAmount>\
            </transaction></transactions>\
            </transactionSearchResult>";
        Mock::given(method("GET"))
            .and(path("/v2/transactions/abandoned/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
        let mut client = seller_client(&server).with_mode(ConsultMode::Abandoned);

        let response = client
            .find("2020-01-01", "2020-02-01", SearchOptions::default())
            .await
            .unwrap();

        let ConsultResponse::Search(page) = response else {
            panic!("expected the search page");
        };
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].code, "AB-1");
        assert_eq!(page.items[0].payment_type, None);
        assert_eq!(page.items[0].payment_code, None);
    }

    #[tokio::test]
    async fn test_application_reads_carry_the_authorization_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("appId", "app0155491563"))
            .and(query_param("appKey", TOKEN))
            .and(query_param("authorizationCode", "FEDC654399887733"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TRANSACTION_BODY))
            .expect(1)
            .mount(&server)
            .await;
        let settings = Settings::application("app0155491563", TOKEN)
            .with_authorization_code("FEDC654399887733")
            .with_endpoint(local_endpoint(&server));
        let mut client = ConsultClient::new(settings).unwrap();

        let response = client.read("TX-1", ReadKind::Transaction).await.unwrap();

        assert!(matches!(response, ConsultResponse::Transaction(_)));
    }
}

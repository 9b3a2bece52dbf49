//! Client for checkout submission.
//!
//! Provides [`CheckoutClient`], which posts a [`CheckoutRequest`] as a
//! form and returns the code and payment page the buyer is sent to.

use pagseguro::checkout::{self, CheckoutRequest, CheckoutResponse};
use pagseguro::error::{Error, LastError};
use pagseguro::settings::{Overrides, Settings};
use reqwest::header::HeaderMap;

#[cfg(feature = "telemetry")]
use crate::transport::with_span;
use crate::transport::{Transport, owned_params};

/// Client for the `POST /v2/checkout` operation.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    /// Shared provider session.
    transport: Transport,
}

impl CheckoutClient {
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

    /// Submits the checkout and returns the payment page redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderValidation`] when the provider rejects a
    /// field, [`Error::Authentication`] for refused credentials, and the
    /// usual transport and decoding errors otherwise. Every failure is
    /// also recorded as [`Self::last_error`].
    #[cfg(feature = "telemetry")]
    pub async fn finalize(&mut self, request: &CheckoutRequest) -> Result<CheckoutResponse, Error> {
        let span =
            tracing::info_span!("pagseguro.checkout.finalize", items = request.items().len());
        with_span(self.finalize_recorded(request), span).await
    }

    /// Submits the checkout and returns the payment page redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderValidation`] when the provider rejects a
    /// field, [`Error::Authentication`] for refused credentials, and the
    /// usual transport and decoding errors otherwise. Every failure is
    /// also recorded as [`Self::last_error`].
    #[cfg(not(feature = "telemetry"))]
    pub async fn finalize(&mut self, request: &CheckoutRequest) -> Result<CheckoutResponse, Error> {
        self.finalize_recorded(request).await
    }

    async fn finalize_recorded(
        &mut self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, Error> {
        let result = self.finalize_inner(request).await;
        if let Err(error) = &result {
            self.transport.record(error);
        }
        result
    }

    async fn finalize_inner(
        &mut self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, Error> {
        let credentials = self.transport.credentials();
        let mut params = owned_params(credentials.form_fields());
        if let Some(code) = credentials.authorization_code() {
            params.push(("authorizationCode".to_string(), code.to_string()));
        }
        params.extend(request.form_params());
        let raw = self
            .transport
            .post_form(checkout::CHECKOUT_PATH, &params, "POST /v2/checkout")
            .await?;
        checkout::normalize_response(&raw)
    }
}

#[cfg(test)]
mod tests {
    use pagseguro::checkout::{CheckoutItem, Customer, ShippingType};
    use pagseguro::settings::Endpoint;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const EMAIL: &str = "seller@example.com";
    const TOKEN: &str = "A1B2C3D4E5F6A7B8C9D0E1F2A3B4C5D6";

    fn local_endpoint(server: &MockServer) -> Endpoint {
        let url = url::Url::parse(&server.uri()).unwrap();
        Endpoint {
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap().to_string(),
            port: url.port(),
            ..Endpoint::default()
        }
    }

    fn seller_client(server: &MockServer) -> CheckoutClient {
        let settings = Settings::seller(EMAIL, TOKEN).with_endpoint(local_endpoint(server));
        CheckoutClient::new(settings).unwrap()
    }

    fn sample_request() -> CheckoutRequest {
        CheckoutRequest::new()
            .with_reference("REF1234")
            .with_item(CheckoutItem::new("P1", "Blue mug", "10.00").with_quantity(2))
            .with_customer(Customer::new("buyer@example.com", "Maria Souza"))
            .with_shipping_type(ShippingType::Sedex)
            .with_redirect_url("https://store.example/done")
    }

    #[tokio::test]
    async fn test_finalize_posts_the_cart_and_builds_the_redirect() {
        let server = MockServer::start().await;
        let body = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <checkout><code>8CF4BE7DCECEF0F004A6DFA0A8243412</code>\
            <date>2020-01-02T03:04:05.000-03:00</date></checkout>";
        Mock::given(method("POST"))
            .and(path("/v2/checkout"))
            .and(header(
                "content-type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            ))
            .and(body_string_contains("email=seller%40example.com"))
            .and(body_string_contains("currency=BRL"))
            .and(body_string_contains("itemId1=P1"))
            .and(body_string_contains("itemQuantity1=2"))
            .and(body_string_contains("shippingType=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
        let mut client = seller_client(&server);

        let response = client.finalize(&sample_request()).await.unwrap();

        assert_eq!(response.code, "8CF4BE7DCECEF0F004A6DFA0A8243412");
        assert!(
            response
                .redirect_to
                .ends_with("payment.html?code=8CF4BE7DCECEF0F004A6DFA0A8243412")
        );
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn test_provider_complaints_are_kept_for_inspection() {
        let server = MockServer::start().await;
        let body = "<?xml version=\"1.0\"?><errors><error>\
            <code>11013</code><message>senderAreaCode invalid value.</message>\
            </error></errors>";
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        let mut client = seller_client(&server);

        let result = client.finalize(&sample_request()).await;

        assert!(matches!(result, Err(Error::ProviderValidation { .. })));
        let Some(LastError::Provider(errors)) = client.last_error() else {
            panic!("expected the provider complaint to be kept");
        };
        assert!(errors.to_string().contains("11013"));
    }

    #[tokio::test]
    async fn test_refused_credentials_map_to_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;
        let mut client = seller_client(&server);

        let result = client.finalize(&sample_request()).await;

        assert!(matches!(result, Err(Error::Authentication)));
        assert!(matches!(client.last_error(), Some(LastError::Message(_))));
    }

    #[tokio::test]
    async fn test_application_checkouts_carry_the_authorization_code() {
        let server = MockServer::start().await;
        let body = "<?xml version=\"1.0\"?>\
            <checkout><code>8CF4BE7DCECEF0F004A6DFA0A8243412</code></checkout>";
        Mock::given(method("POST"))
            .and(body_string_contains("appId=app0155491563"))
            .and(body_string_contains("authorizationCode=FEDC654399887733"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
        let settings = Settings::application("app0155491563", TOKEN)
            .with_authorization_code("FEDC654399887733")
            .with_endpoint(local_endpoint(&server));
        let mut client = CheckoutClient::new(settings).unwrap();

        let response = client.finalize(&sample_request()).await.unwrap();

        assert_eq!(response.code, "8CF4BE7DCECEF0F004A6DFA0A8243412");
    }
}

//! Checkout payload and response shaping.
//!
//! A checkout is created with a form-encoded POST carrying the cart, the
//! buyer, and delivery data as flat numbered parameters. The provider
//! answers with a session code; the buyer finishes payment on the
//! provider's page, reached through [`CheckoutResponse::redirect_to`].

use crate::error::Error;
use crate::xml::{Map, Value};

/// Path of the checkout creation operation.
pub const CHECKOUT_PATH: &str = "/v2/checkout";

/// Payment page; the session code is appended to form the redirect URL.
const PAYMENT_PAGE: &str = "https://pagseguro.uol.com.br/v2/checkout/payment.html?code=";

/// Currency sent when none is chosen.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Shipping service for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShippingType {
    /// Standard postal service.
    Pac,
    /// Express postal service.
    Sedex,
    /// No shipping, or arranged outside the provider.
    NotSpecified,
}

impl ShippingType {
    /// The provider's numeric code for this service.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Pac => 1,
            Self::Sedex => 2,
            Self::NotSpecified => 3,
        }
    }
}

/// One cart item.
///
/// Amounts are decimal strings with two places and a dot separator, the
/// only number format the provider accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutItem {
    /// Identifier of the product in the caller's catalog.
    pub id: String,
    /// Display name of the product.
    pub description: String,
    /// Unit price.
    pub amount: String,
    /// Units of the product.
    pub quantity: u32,
    /// Unit weight in grams.
    pub weight_grams: u32,
    /// Per-item shipping cost, when charged individually.
    pub shipping_cost: Option<String>,
}

impl CheckoutItem {
    /// Creates an item with one unit and no weight.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount: amount.into(),
            quantity: 1,
            weight_grams: 0,
            shipping_cost: None,
        }
    }

    /// Sets the number of units.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the unit weight in grams.
    #[must_use]
    pub const fn with_weight_grams(mut self, grams: u32) -> Self {
        self.weight_grams = grams;
        self
    }

    /// Sets a per-item shipping cost.
    #[must_use]
    pub fn with_shipping_cost(mut self, cost: impl Into<String>) -> Self {
        self.shipping_cost = Some(cost.into());
        self
    }
}

/// Delivery address, sent as `shippingAddress*` parameters.
///
/// Empty fields are pruned from the payload, so a partial address sends
/// only what was filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddress {
    /// Postal code.
    pub postal_code: String,
    /// Street name.
    pub street: String,
    /// Street number.
    pub number: String,
    /// Address complement.
    pub complement: String,
    /// District or neighborhood.
    pub district: String,
    /// City.
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    /// Three-letter country code.
    pub country: String,
}

/// The buyer, sent as `sender*` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Buyer e-mail.
    pub email: String,
    /// Buyer full name.
    pub name: String,
    /// Phone area code.
    pub area_code: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl Customer {
    /// Creates a buyer without phone data.
    #[must_use]
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            area_code: None,
            phone: None,
        }
    }

    /// Sets the buyer's phone.
    #[must_use]
    pub fn with_phone(mut self, area_code: impl Into<String>, number: impl Into<String>) -> Self {
        self.area_code = Some(area_code.into());
        self.phone = Some(number.into());
        self
    }
}

/// Builder for the checkout form payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    currency: String,
    reference: Option<String>,
    items: Vec<CheckoutItem>,
    customer: Option<Customer>,
    shipping_type: Option<ShippingType>,
    shipping_address: Option<ShippingAddress>,
    redirect_url: Option<String>,
}

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            reference: None,
            items: Vec::new(),
            customer: None,
            shipping_type: None,
            shipping_address: None,
            redirect_url: None,
        }
    }
}

impl CheckoutRequest {
    /// Creates an empty cart in the default currency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caller's own reference for this checkout.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Appends a cart item.
    #[must_use]
    pub fn with_item(mut self, item: CheckoutItem) -> Self {
        self.items.push(item);
        self
    }

    /// Sets the buyer.
    #[must_use]
    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Sets the shipping service.
    #[must_use]
    pub const fn with_shipping_type(mut self, shipping_type: ShippingType) -> Self {
        self.shipping_type = Some(shipping_type);
        self
    }

    /// Sets the delivery address.
    #[must_use]
    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    /// Sets the URL the provider sends the buyer back to after payment.
    #[must_use]
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// The cart items added so far.
    #[must_use]
    pub fn items(&self) -> &[CheckoutItem] {
        &self.items
    }

    /// Form parameters in the provider's documented order, with items
    /// numbered from 1 and empty values pruned.
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        push(&mut params, "currency".to_string(), &self.currency);
        for (index, item) in self.items.iter().enumerate() {
            let n = index + 1;
            push(&mut params, format!("itemId{n}"), &item.id);
            push(&mut params, format!("itemDescription{n}"), &item.description);
            push(&mut params, format!("itemAmount{n}"), &item.amount);
            params.push((format!("itemQuantity{n}"), item.quantity.to_string()));
            params.push((format!("itemWeight{n}"), item.weight_grams.to_string()));
            if let Some(cost) = &item.shipping_cost {
                push(&mut params, format!("itemShippingCost{n}"), cost);
            }
        }
        if let Some(reference) = &self.reference {
            push(&mut params, "reference".to_string(), reference);
        }
        if let Some(customer) = &self.customer {
            push(&mut params, "senderEmail".to_string(), &customer.email);
            push(&mut params, "senderName".to_string(), &customer.name);
            if let Some(area_code) = &customer.area_code {
                push(&mut params, "senderAreaCode".to_string(), area_code);
            }
            if let Some(phone) = &customer.phone {
                push(&mut params, "senderPhone".to_string(), phone);
            }
        }
        if let Some(shipping_type) = self.shipping_type {
            params.push((
                "shippingType".to_string(),
                shipping_type.code().to_string(),
            ));
        }
        if let Some(address) = &self.shipping_address {
            push(&mut params, "shippingAddressPostalCode".to_string(), &address.postal_code);
            push(&mut params, "shippingAddressStreet".to_string(), &address.street);
            push(&mut params, "shippingAddressNumber".to_string(), &address.number);
            push(&mut params, "shippingAddressComplement".to_string(), &address.complement);
            push(&mut params, "shippingAddressDistrict".to_string(), &address.district);
            push(&mut params, "shippingAddressCity".to_string(), &address.city);
            push(&mut params, "shippingAddressState".to_string(), &address.state);
            push(&mut params, "shippingAddressCountry".to_string(), &address.country);
        }
        if let Some(url) = &self.redirect_url {
            push(&mut params, "redirectURL".to_string(), url);
        }
        params
    }
}

fn push(params: &mut Vec<(String, String)>, name: String, value: &str) {
    if !value.is_empty() {
        params.push((name, value.to_string()));
    }
}

/// Normalized outcome of a successful checkout creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResponse {
    /// Raw `checkout` subtree as the provider returned it.
    pub checkout: Map,
    /// Session code identifying the created checkout.
    pub code: String,
    /// Payment page the buyer must visit to pay.
    pub redirect_to: String,
}

/// Shapes a decoded response body into a [`CheckoutResponse`].
///
/// # Errors
///
/// Returns [`Error::InvalidResponseShape`] when the body lacks a `checkout`
/// element or that element carries no `code`.
pub fn normalize_response(raw: &Map) -> Result<CheckoutResponse, Error> {
    let shape_error = Error::InvalidResponseShape {
        operation: "checkout",
    };
    let Some(checkout) = raw.get("checkout").and_then(Value::as_map) else {
        return Err(shape_error);
    };
    let Some(code) = checkout.get_text("code") else {
        return Err(shape_error);
    };
    Ok(CheckoutResponse {
        checkout: checkout.clone(),
        code: code.to_string(),
        redirect_to: format!("{PAYMENT_PAGE}{code}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn test_items_number_from_one_in_order() {
        let request = CheckoutRequest::new()
            .with_item(CheckoutItem::new("P1", "Caneca", "10.00"))
            .with_item(
                CheckoutItem::new("P2", "Camiseta", "35.90")
                    .with_quantity(2)
                    .with_weight_grams(300),
            );

        let params = request.form_params();
        assert_eq!(params[0], ("currency".to_string(), "BRL".to_string()));
        assert_eq!(params[1], ("itemId1".to_string(), "P1".to_string()));
        assert_eq!(
            params[6],
            ("itemId2".to_string(), "P2".to_string())
        );
        assert!(params.contains(&("itemQuantity2".to_string(), "2".to_string())));
        assert!(params.contains(&("itemWeight1".to_string(), "0".to_string())));
        assert!(params.contains(&("itemWeight2".to_string(), "300".to_string())));
    }

    #[test]
    fn test_full_payload_order() {
        let request = CheckoutRequest::new()
            .with_item(CheckoutItem::new("P1", "Caneca", "10.00").with_shipping_cost("5.00"))
            .with_reference("PEDIDO-7")
            .with_customer(Customer::new("cliente@example.com", "Cliente Exemplo").with_phone("11", "999990000"))
            .with_shipping_type(ShippingType::Sedex)
            .with_shipping_address(ShippingAddress {
                postal_code: "01310100".to_string(),
                street: "Av. Paulista".to_string(),
                number: "1000".to_string(),
                complement: String::new(),
                district: "Bela Vista".to_string(),
                city: "Sao Paulo".to_string(),
                state: "SP".to_string(),
                country: "BRA".to_string(),
            })
            .with_redirect_url("http://www.example.com.br/retorno");

        let params = request.form_params();
        let names: Vec<&str> = params.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "currency",
                "itemId1",
                "itemDescription1",
                "itemAmount1",
                "itemQuantity1",
                "itemWeight1",
                "itemShippingCost1",
                "reference",
                "senderEmail",
                "senderName",
                "senderAreaCode",
                "senderPhone",
                "shippingType",
                "shippingAddressPostalCode",
                "shippingAddressStreet",
                "shippingAddressNumber",
                "shippingAddressDistrict",
                "shippingAddressCity",
                "shippingAddressState",
                "shippingAddressCountry",
                "redirectURL",
            ]
        );
    }

    #[test]
    fn test_empty_values_are_pruned() {
        let request = CheckoutRequest::new()
            .with_item(CheckoutItem::new("P1", "", "10.00"))
            .with_reference("");
        let params = request.form_params();
        assert!(!params.iter().any(|(name, _)| name == "itemDescription1"));
        assert!(!params.iter().any(|(name, _)| name == "reference"));
        assert!(params.contains(&("itemId1".to_string(), "P1".to_string())));
    }

    #[test]
    fn test_shipping_type_codes() {
        assert_eq!(ShippingType::Pac.code(), 1);
        assert_eq!(ShippingType::Sedex.code(), 2);
        assert_eq!(ShippingType::NotSpecified.code(), 3);
    }

    #[test]
    fn test_normalize_builds_redirect_from_code() {
        let raw = xml::parse(
            "<checkout><code>8CF4BE7DCECEF0F004A6DFA0A8243412</code>\
             <date>2020-01-02T03:04:05-03:00</date></checkout>",
        )
        .unwrap();
        let response = normalize_response(&raw).unwrap();
        assert_eq!(response.code, "8CF4BE7DCECEF0F004A6DFA0A8243412");
        assert!(
            response
                .redirect_to
                .ends_with("payment.html?code=8CF4BE7DCECEF0F004A6DFA0A8243412")
        );
    }

    #[test]
    fn test_normalize_rejects_unexpected_shapes() {
        let raw = xml::parse("<transaction><code>X</code></transaction>").unwrap();
        assert!(matches!(
            normalize_response(&raw),
            Err(Error::InvalidResponseShape {
                operation: "checkout"
            })
        ));

        let raw = xml::parse("<checkout><date>2020-01-02</date></checkout>").unwrap();
        assert!(matches!(
            normalize_response(&raw),
            Err(Error::InvalidResponseShape { .. })
        ));
    }
}

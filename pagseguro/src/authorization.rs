//! Authorization request payload and response shaping.
//!
//! An application asks a merchant for permissions by POSTing an
//! `authorizationRequest` XML document. The provider answers with a session
//! code; the merchant then approves the request on the provider's own page,
//! reached through [`AuthorizationResponse::redirect_to`].

use crate::error::Error;
use crate::permission::{Permission, PermissionSet};
use crate::xml::{self, Map, Value};

/// Path of the authorization request operation.
pub const REQUEST_PATH: &str = "/v2/authorizations/request";

/// Approval page; the session code is appended to form the redirect URL.
const REDIRECT_PAGE: &str = "https://pagseguro.uol.com.br/v2/authorization/request.jhtml?code=";

/// Builder for the `authorizationRequest` document.
///
/// Elements serialize in a fixed order: `reference`, `permissions`,
/// `redirectURL`, `account`. Empty-string leaves are pruned from the
/// document at any depth; fields never set are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    reference: Option<String>,
    permissions: PermissionSet,
    redirect_url: Option<String>,
    account: Option<Map>,
}

impl AuthorizationRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caller's own reference for this request.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Adds one permission to request.
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Replaces the permission set.
    #[must_use]
    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    /// Sets the URL the provider sends the merchant back to after the
    /// approval flow.
    #[must_use]
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Attaches merchant registration data.
    #[must_use]
    pub fn with_account(mut self, account: Map) -> Self {
        self.account = Some(account);
        self
    }

    /// The permissions requested so far.
    #[must_use]
    pub const fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Serializes the pruned `authorizationRequest` document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut request = Map::new();
        if let Some(reference) = &self.reference {
            request.insert("reference", reference.as_str());
        }
        let mut permissions = Map::new();
        permissions.insert(
            "code",
            Value::List(
                self.permissions
                    .iter()
                    .map(|permission| Value::text(permission.as_str()))
                    .collect(),
            ),
        );
        request.insert("permissions", permissions);
        if let Some(url) = &self.redirect_url {
            request.insert("redirectURL", url.as_str());
        }
        if let Some(account) = &self.account {
            request.insert("account", account.clone());
        }
        request.prune_empty();
        xml::write_document("authorizationRequest", &Value::Map(request))
    }
}

/// Normalized outcome of a successful authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    /// Raw `authorizationRequest` subtree as the provider returned it.
    pub authorization_request: Map,
    /// Session code identifying the pending authorization.
    pub code: String,
    /// Approval page the merchant must visit to finish the flow.
    pub redirect_to: String,
}

/// Shapes a decoded response body into an [`AuthorizationResponse`].
///
/// # Errors
///
/// Returns [`Error::InvalidResponseShape`] when the body lacks an
/// `authorizationRequest` element or that element carries no `code`.
pub fn normalize_response(raw: &Map) -> Result<AuthorizationResponse, Error> {
    let shape_error = Error::InvalidResponseShape {
        operation: "authorization",
    };
    let Some(request) = raw.get("authorizationRequest").and_then(Value::as_map) else {
        return Err(shape_error);
    };
    let Some(code) = request.get_text("code") else {
        return Err(shape_error);
    };
    Ok(AuthorizationResponse {
        authorization_request: request.clone(),
        code: code.to_string(),
        redirect_to: format!("{REDIRECT_PAGE}{code}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_fields_in_fixed_order() {
        let mut account = Map::new();
        account.insert("name", "Loja Exemplo");
        let request = AuthorizationRequest::new()
            .with_reference("REF-42")
            .with_permission(Permission::CreateCheckouts)
            .with_permission(Permission::SearchTransactions)
            .with_redirect_url("http://www.example.com.br/retorno")
            .with_account(account);

        assert_eq!(
            request.to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <authorizationRequest>\n\
             \x20\x20<reference>REF-42</reference>\n\
             \x20\x20<permissions>\n\
             \x20\x20\x20\x20<code>CREATE_CHECKOUTS</code>\n\
             \x20\x20\x20\x20<code>SEARCH_TRANSACTIONS</code>\n\
             \x20\x20</permissions>\n\
             \x20\x20<redirectURL>http://www.example.com.br/retorno</redirectURL>\n\
             \x20\x20<account>\n\
             \x20\x20\x20\x20<name>Loja Exemplo</name>\n\
             \x20\x20</account>\n\
             </authorizationRequest>\n"
        );
    }

    #[test]
    fn test_empty_string_leaves_are_pruned() {
        let mut account = Map::new();
        account.insert("name", "Loja Exemplo");
        account.insert("document", "");
        let document = AuthorizationRequest::new()
            .with_reference("")
            .with_redirect_url("http://www.example.com.br/retorno")
            .with_account(account)
            .to_xml();

        assert!(!document.contains("<reference"));
        assert!(!document.contains("<document"));
        assert!(document.contains("<name>Loja Exemplo</name>"));
        assert!(document.contains("<redirectURL>"));
    }

    #[test]
    fn test_duplicate_permissions_collapse() {
        let request = AuthorizationRequest::new()
            .with_permission(Permission::SearchTransactions)
            .with_permission(Permission::SearchTransactions);
        assert_eq!(request.permissions().len(), 1);
        let document = request.to_xml();
        assert_eq!(document.matches("SEARCH_TRANSACTIONS").count(), 1);
    }

    #[test]
    fn test_unset_fields_are_absent() {
        let document = AuthorizationRequest::new().to_xml();
        assert!(!document.contains("<reference"));
        assert!(!document.contains("<redirectURL"));
        assert!(!document.contains("<account"));
        assert!(document.contains("<permissions>"));
    }

    #[test]
    fn test_normalize_builds_redirect_from_code() {
        let raw = xml::parse(
            "<authorizationRequest><code>ABC123</code>\
             <date>2020-01-02T03:04:05-03:00</date></authorizationRequest>",
        )
        .unwrap();
        let response = normalize_response(&raw).unwrap();
        assert_eq!(response.code, "ABC123");
        assert!(response.redirect_to.ends_with("code=ABC123"));
        assert_eq!(
            response.authorization_request.get_text("date"),
            Some("2020-01-02T03:04:05-03:00")
        );
    }

    #[test]
    fn test_normalize_rejects_unexpected_shapes() {
        let raw = xml::parse("<transaction><code>ABC123</code></transaction>").unwrap();
        assert!(matches!(
            normalize_response(&raw),
            Err(Error::InvalidResponseShape {
                operation: "authorization"
            })
        ));

        let raw = xml::parse(
            "<authorizationRequest><date>2020-01-02T03:04:05-03:00</date>\
             </authorizationRequest>",
        )
        .unwrap();
        assert!(matches!(
            normalize_response(&raw),
            Err(Error::InvalidResponseShape { .. })
        ));
    }
}

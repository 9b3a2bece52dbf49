//! Consultation queries and response shaping.
//!
//! Two query families share this module: point reads of one transaction or
//! authorization notification by code, and date-window searches over the
//! transaction history. Search responses and basic-shape reads are projected
//! into [`TransactionSummary`] values; full reads and authorization reads
//! pass the provider's subtree through untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::xml::{Map, Value};

/// Base path for transaction reads and searches.
pub const TRANSACTION_PATH: &str = "/v2/transactions/";

/// Base path for authorization notification reads.
pub const AUTHORIZATION_NOTIFICATION_PATH: &str = "/v2/authorizations/notifications/";

/// Date format sent in search filters.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const OPERATION: &str = "consultation";

/// Which resource a point read fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReadKind {
    /// A transaction, by transaction or notification code.
    #[default]
    Transaction,
    /// An authorization notification, by notification code.
    Authorization,
}

impl ReadKind {
    /// Base path the resource code is appended to.
    #[must_use]
    pub const fn base_path(&self) -> &'static str {
        match self {
            Self::Transaction => TRANSACTION_PATH,
            Self::Authorization => AUTHORIZATION_NOTIFICATION_PATH,
        }
    }
}

/// Which transaction population searches run against.
///
/// Abandoned checkouts never reached payment, so their entries carry no
/// payment method and the basic-shape projection leaves those fields out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConsultMode {
    /// The regular transaction history.
    #[default]
    Transactions,
    /// Checkout sessions that were never completed.
    Abandoned,
}

impl ConsultMode {
    /// Path a date-window search runs against.
    #[must_use]
    pub const fn search_path(&self) -> &'static str {
        match self {
            Self::Transactions => TRANSACTION_PATH,
            Self::Abandoned => "/v2/transactions/abandoned/",
        }
    }
}

/// Page number and size for a date-window search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Page to fetch, starting at 1.
    pub page: u32,
    /// Records per page.
    pub max_page_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            max_page_results: 50,
        }
    }
}

impl SearchOptions {
    /// Sets the page to fetch.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the number of records per page.
    #[must_use]
    pub const fn with_max_page_results(mut self, max_page_results: u32) -> Self {
        self.max_page_results = max_page_results;
        self
    }
}

/// Validated date-window search filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    initial_date: NaiveDateTime,
    final_date: NaiveDateTime,
    options: SearchOptions,
}

impl SearchQuery {
    /// Parses the window bounds and builds the filter set.
    ///
    /// Accepted date forms are RFC 3339 (offset and fractional seconds
    /// are dropped from the filter), `YYYY-MM-DD HH:MM:SS` with either a
    /// space or a `T` separator, and a bare `YYYY-MM-DD` taken as
    /// midnight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateParse`] carrying the first bound that does not
    /// parse. No network call happens on this path.
    pub fn new(begin: &str, end: &str, options: SearchOptions) -> Result<Self, Error> {
        Ok(Self {
            initial_date: parse_date(begin)?,
            final_date: parse_date(end)?,
            options,
        })
    }

    /// Query parameters in the order the provider documents them.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "initialDate",
                self.initial_date.format(DATE_FORMAT).to_string(),
            ),
            ("finalDate", self.final_date.format(DATE_FORMAT).to_string()),
            ("page", self.options.page.to_string()),
            ("maxPageResults", self.options.max_page_results.to_string()),
        ]
    }
}

fn parse_date(input: &str) -> Result<NaiveDateTime, Error> {
    DateTime::parse_from_rfc3339(input)
        .map(|date| date.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(input, DATE_FORMAT))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| Error::DateParse {
            input: input.to_string(),
        })
}

/// Basic-shape projection of one transaction entry.
///
/// Search results always use this shape; point reads use it when the
/// `onlyBasic` setting is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    /// Creation date, reduced to `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    /// Transaction code.
    pub code: String,
    /// Gross amount, verbatim.
    pub value: String,
    /// Numeric transaction status.
    pub status: u32,
    /// Caller-supplied reference, when the checkout carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Last event date, verbatim.
    pub modified: String,
    /// Payment method type; absent for abandoned checkouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<u32>,
    /// Payment method code; absent for abandoned checkouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_code: Option<u32>,
}

/// One page of a date-window search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// Total pages available for the window.
    pub pages: u32,
    /// Records in this page.
    pub page_size: u32,
    /// Page number of this page.
    pub current: u32,
    /// Basic-shape entries of this page.
    pub items: Vec<TransactionSummary>,
}

/// Normalized consultation outcome, by response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsultResponse {
    /// Full `transaction` subtree, returned when `onlyBasic` is off.
    Transaction(Map),
    /// Basic-shape projection of a single transaction.
    Summary(TransactionSummary),
    /// One page of search results.
    Search(TransactionPage),
    /// Raw `authorization` subtree.
    Authorization(Map),
}

/// Shapes a decoded response body into a [`ConsultResponse`].
///
/// Dispatch is by which top-level element is present: `transaction`,
/// `transactionSearchResult`, or `authorization`.
///
/// # Errors
///
/// Returns [`Error::InvalidResponseShape`] when none of the known elements
/// is present, or when a recognized shape is missing one of its required
/// fields.
pub fn normalize_response(
    raw: &Map,
    only_basic: bool,
    mode: ConsultMode,
) -> Result<ConsultResponse, Error> {
    if let Some(transaction) = raw.get("transaction") {
        let entry = transaction.as_map().ok_or_else(shape_error)?;
        if only_basic {
            return Ok(ConsultResponse::Summary(project_entry(entry, mode)?));
        }
        return Ok(ConsultResponse::Transaction(entry.clone()));
    }
    if let Some(result) = raw.get("transactionSearchResult") {
        let result = result.as_map().ok_or_else(shape_error)?;
        let items = search_items(result)?
            .into_iter()
            .map(|entry| project_entry(entry, mode))
            .collect::<Result<Vec<_>, Error>>()?;
        return Ok(ConsultResponse::Search(TransactionPage {
            pages: required_u32(result, "totalPages")?,
            page_size: required_u32(result, "resultsInThisPage")?,
            current: required_u32(result, "currentPage")?,
            items,
        }));
    }
    if let Some(authorization) = raw.get("authorization") {
        let entry = authorization.as_map().ok_or_else(shape_error)?;
        return Ok(ConsultResponse::Authorization(entry.clone()));
    }
    Err(shape_error())
}

/// Entries under `transactionSearchResult.transactions`, tolerating the
/// one-record case where the provider nests a single element instead of a
/// list.
fn search_items(result: &Map) -> Result<Vec<&Map>, Error> {
    let Some(transactions) = result.get("transactions") else {
        return Ok(Vec::new());
    };
    match transactions {
        Value::Text(text) if text.is_empty() => Ok(Vec::new()),
        Value::Map(container) => match container.get("transaction") {
            None => Ok(Vec::new()),
            Some(Value::Map(single)) => Ok(vec![single]),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| item.as_map().ok_or_else(shape_error))
                .collect(),
            Some(Value::Text(_)) => Err(shape_error()),
        },
        Value::Text(_) | Value::List(_) => Err(shape_error()),
    }
}

fn project_entry(entry: &Map, mode: ConsultMode) -> Result<TransactionSummary, Error> {
    let date_raw = required_text(entry, "date")?;
    let date = date_raw.get(..19).unwrap_or(date_raw).replace('T', " ");

    let (payment_type, payment_code) = if mode == ConsultMode::Abandoned {
        (None, None)
    } else {
        match entry.get("paymentMethod").and_then(Value::as_map) {
            Some(method) => (
                optional_u32(method, "type")?,
                optional_u32(method, "code")?,
            ),
            None => (None, None),
        }
    };

    Ok(TransactionSummary {
        date,
        code: required_text(entry, "code")?.to_string(),
        value: required_text(entry, "grossAmount")?.to_string(),
        status: required_u32(entry, "status")?,
        reference: entry.get_text("reference").map(ToString::to_string),
        modified: required_text(entry, "lastEventDate")?.to_string(),
        payment_type,
        payment_code,
    })
}

fn required_text<'a>(entry: &'a Map, key: &str) -> Result<&'a str, Error> {
    entry.get_text(key).ok_or_else(shape_error)
}

fn required_u32(entry: &Map, key: &str) -> Result<u32, Error> {
    required_text(entry, key)?.parse().map_err(|_| shape_error())
}

fn optional_u32(entry: &Map, key: &str) -> Result<Option<u32>, Error> {
    entry
        .get_text(key)
        .map(|text| text.parse().map_err(|_| shape_error()))
        .transpose()
}

const fn shape_error() -> Error {
    Error::InvalidResponseShape {
        operation: OPERATION,
    }
}

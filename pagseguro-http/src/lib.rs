#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport and operation clients for the PagSeguro legacy v2 API.
//!
//! The [`transport`] module owns the provider session: validated settings,
//! credentials, the HTTP client, and the last provider complaint. The
//! remaining modules wrap one API operation each on top of it.
//!
//! # Modules
//!
//! - [`authorization`] - Application authorization requests
//! - [`checkout`] - Checkout submission
//! - [`consult`] - Transaction and notification consultation
//! - [`transport`] - Shared HTTP session and response decoding
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation on the operation clients
//! - `full` - Enables all optional features above

pub mod authorization;
pub mod checkout;
pub mod consult;
pub mod transport;

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Client core for the PagSeguro legacy v2 webservice.
//!
//! This crate provides the foundational types for talking to the PagSeguro
//! checkout, authorization, and consultation APIs. It owns everything that
//! does not require a network: credential validation, configuration merging,
//! the generic XML mapping used on the wire, per-operation payload builders,
//! and the normalizers that project provider responses into stable shapes.
//! The HTTP side lives in the companion `pagseguro-http` crate.
//!
//! # Overview
//!
//! Every operation follows the same pipeline: a request builder produces a
//! payload from validated settings and caller-supplied fields, a transport
//! sends it and decodes the XML response into an ordered mapping, and a
//! normalizer projects that mapping into the operation's result type or an
//! [`error::Error`]. Two credential modes exist: `seller` (merchant e-mail
//! plus API token) and `application` (application id and key, optionally
//! carrying a merchant-granted authorization code).
//!
//! # Modules
//!
//! - [`authorization`] - Payload and response shaping for merchant grants
//! - [`checkout`] - Form building and response shaping for checkouts
//! - [`consult`] - Query building and response shaping for consultations
//! - [`credentials`] - Credential modes, field validators, resolution
//! - [`error`] - Error taxonomy and the last-error compatibility slot
//! - [`permission`] - Grants an application can request from a merchant
//! - [`settings`] - Configuration, defaults, and endpoint assembly
//! - [`xml`] - Ordered XML value model, decoding, encoding, pruning

pub mod authorization;
pub mod checkout;
pub mod consult;
pub mod credentials;
pub mod error;
pub mod permission;
pub mod settings;
pub mod xml;

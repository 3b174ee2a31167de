// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Gatepass Core
//!
//! Core types and models for the Gatepass fetch gateway.
//!
//! This crate provides the foundational abstractions used across all other
//! Gatepass crates:
//!
//! - [`Credential`] - A cached header/cookie set earned for a domain
//! - [`Namespace`] - The two independent credential namespaces
//!   (opportunistic clearances vs. explicit login sessions)
//! - [`RegistrableDomain`] - The eTLD+1 cache key derived from a URL
//! - [`FetchResponse`] - The terminal result of a successful fetch
//! - [`Method`] - HTTP method of a logical fetch
//! - [`CoreError`] - Error type for core operations

pub mod domain;
pub mod error;
pub mod models;

pub use domain::RegistrableDomain;
pub use error::CoreError;
pub use models::{Credential, FetchResponse, Method, Namespace};

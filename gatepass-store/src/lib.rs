// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Gatepass Store
//!
//! Durable, domain-keyed credential storage for the Gatepass fetch gateway.
//!
//! This crate provides:
//!
//! - **[`CredentialStore`]**: the trait the fetch path programs against
//! - **[`MemoryCredentialStore`]**: in-memory, zero-persistence store for
//!   tests and embedding
//! - **[`JsonFileStore`]**: JSON-file-backed store that survives process
//!   restarts
//! - **[`persistence`]**: file I/O helpers with atomic writes and
//!   restrictive permissions
//!
//! ## Usage
//!
//! ```ignore
//! use gatepass_core::{Credential, Namespace};
//! use gatepass_store::{CredentialStore, JsonFileStore};
//!
//! let store = JsonFileStore::load_default().await?;
//! store.insert("example.com", Namespace::Login, credential).await?;
//! let cred = store.get("example.com", Namespace::Opportunistic).await?;
//! ```

pub mod error;
pub mod file_store;
pub mod persistence;
pub mod store;

pub use error::StoreError;
pub use file_store::JsonFileStore;
pub use persistence::{
    default_config_dir, default_credentials_path, load_json, load_json_or_default, save_json,
};
pub use store::{CredentialStore, MemoryCredentialStore};

// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Gatepass Fetch
//!
//! The resilient fetch-and-bypass layer: a bounded retry state machine, an
//! ordered anti-bot detector chain, a bypass-strategy contract, and the
//! public `get`/`post` gateway.
//!
//! ## Architecture
//!
//! - [`gateway::FetchGateway`] - public entry points; merges cached
//!   credentials into outgoing requests and delegates to the controller
//! - `controller` (internal) - the attempt loop: status dispatch,
//!   credential eviction, redirect resolution, cooldowns, exhaustion
//! - [`detect::DetectorChain`] - ordered classifiers identifying which
//!   anti-bot presentation a 403 body is
//! - [`bypass::BypassStrategy`] - contract for external remediation
//!   procedures (challenge solving, scripted fetching)
//! - [`transport::HttpTransport`] - single-attempt HTTP abstraction so
//!   tests can script responses
//! - [`backoff`] - attempt budget, fixed cooldown windows, injected clock
//!
//! ## Example
//!
//! ```ignore
//! use gatepass_fetch::{FetchGateway, RequestOptions};
//!
//! let gateway = FetchGateway::builder()
//!     .store(Arc::new(JsonFileStore::load_default().await?))
//!     .bypass(suite)
//!     .build()?;
//!
//! let response = gateway.get("https://site.example/page", RequestOptions::new()).await?;
//! println!("{} {}", response.status, response.final_url);
//! ```

pub mod backoff;
pub mod bypass;
mod controller;
pub mod detect;
pub mod error;
pub mod gateway;
pub mod request;
pub mod transport;

// Re-export key types at crate root

pub use backoff::{BackoffPolicy, Clock, MAX_ATTEMPTS, SystemClock};
pub use bypass::{BypassOutcome, BypassStrategy, BypassSuite, NoopBypass};
pub use detect::{BlockKind, Detector, DetectorChain, PatternDetector};
pub use error::{BypassError, FetchError, HttpError};
pub use gateway::{FetchGateway, FetchGatewayBuilder};
pub use request::{Body, RequestOptions, RequestSpec};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

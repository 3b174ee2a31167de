//! Request types for one logical fetch.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use gatepass_core::Method;

// ============================================================================
// Request Body
// ============================================================================

/// Body of a POST request.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    None,
    /// Form-encoded key/value pairs.
    Form(BTreeMap<String, String>),
    /// JSON document.
    Json(Value),
}

// ============================================================================
// Request Options
// ============================================================================

/// Caller-supplied options for a `get`/`post` call.
///
/// All fields are optional; caller-supplied headers and cookies are the
/// *fallback* when merged with cached credentials: a cached clearance token
/// always wins over a stale caller header.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters appended to the URL.
    pub params: Vec<(String, String)>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request cookies.
    pub cookies: BTreeMap<String, String>,
    /// Per-HTTP-call timeout. This bounds one transport attempt, not the
    /// whole retry loop.
    pub timeout: Option<Duration>,
    /// Arbitrary transport options, passed opaquely to the transport.
    pub extra: BTreeMap<String, Value>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Adds a request header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Adds a request cookie.
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    /// Sets the per-HTTP-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds an opaque transport option.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Request Spec
// ============================================================================

/// Fully assembled input of one HTTP attempt.
///
/// The controller rebuilds the header/cookie maps from the credential store
/// on every attempt; the spec itself is immutable apart from the target URL,
/// which redirect resolution may rewrite.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: String,
    /// Query parameters.
    pub params: Vec<(String, String)>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request cookies.
    pub cookies: BTreeMap<String, String>,
    /// Per-HTTP-call timeout.
    pub timeout: Option<Duration>,
    /// Request body (POST only).
    pub body: Body,
    /// Opaque transport options.
    pub extra: BTreeMap<String, Value>,
}

impl RequestSpec {
    /// Builds a GET spec from caller options.
    pub fn get(url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: options.params,
            headers: options.headers,
            cookies: options.cookies,
            timeout: options.timeout,
            body: Body::None,
            extra: options.extra,
        }
    }

    /// Builds a POST spec from caller options and a body.
    pub fn post(url: impl Into<String>, body: Body, options: RequestOptions) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: options.params,
            headers: options.headers,
            cookies: options.cookies,
            timeout: options.timeout,
            body,
            extra: options.extra,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

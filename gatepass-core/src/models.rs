//! Domain models for the fetch gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Method
// ============================================================================

/// HTTP method of one logical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

impl Method {
    /// Returns the wire name for this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// The credential namespace a record belongs to.
///
/// The two namespaces share the same key space (registrable domains) but are
/// logically independent stores:
///
/// - `Opportunistic` credentials are earned by a bypass strategy (e.g. a
///   clearance cookie) and may be evicted by the fetch path when they stop
///   working.
/// - `Login` credentials are written only by an explicit login procedure and
///   are never auto-evicted; they win over everything else when merged into
///   an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Short-lived, auto-acquired clearance credentials.
    Opportunistic,
    /// Longer-lived, explicitly authenticated credentials.
    Login,
}

impl Namespace {
    /// Returns the display name for this namespace.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Opportunistic => "opportunistic",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Credential
// ============================================================================

/// A header/cookie set earned for a domain.
///
/// One record exists per domain per namespace. Insertion replaces any prior
/// record for that domain; merging with caller-supplied values happens at
/// read time in the controller, never at storage time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Headers to merge into outgoing requests (e.g. `User-Agent`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Cookies to merge into outgoing requests (e.g. `cf_clearance`).
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// When the credential was stored. Recorded for operators; never used
    /// for expiry (the only eviction is the still-blocked rule in the
    /// retry controller).
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a credential from header and cookie maps.
    pub fn new(headers: BTreeMap<String, String>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            headers,
            cookies,
            saved_at: Utc::now(),
        }
    }

    /// Creates a credential holding a single cookie.
    pub fn from_cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut cookies = BTreeMap::new();
        cookies.insert(name.into(), value.into());
        Self::new(BTreeMap::new(), cookies)
    }

    /// Returns true if the credential carries no headers and no cookies.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.cookies.is_empty()
    }
}

// ============================================================================
// Fetch Response
// ============================================================================

/// The terminal result of a successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// HTTP status code (forced to 200 when a bypass strategy returned
    /// content directly).
    pub status: u16,
    /// Response body as text.
    pub text: String,
    /// Response body as raw bytes.
    pub bytes: Vec<u8>,
    /// The URL the terminal response was served from (may differ from the
    /// request URL after redirect resolution).
    pub final_url: String,
}

impl FetchResponse {
    /// Creates a response from a body already decoded as text.
    pub fn from_text(status: u16, text: impl Into<String>, final_url: impl Into<String>) -> Self {
        let text = text.into();
        let bytes = text.clone().into_bytes();
        Self {
            status,
            text,
            bytes,
            final_url: final_url.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
    }

    #[test]
    fn test_namespace_display() {
        assert_eq!(Namespace::Opportunistic.display_name(), "opportunistic");
        assert_eq!(Namespace::Login.display_name(), "login");
    }

    #[test]
    fn test_credential_from_cookie() {
        let cred = Credential::from_cookie("cf_clearance", "abc");
        assert_eq!(cred.cookies.get("cf_clearance").map(String::as_str), Some("abc"));
        assert!(cred.headers.is_empty());
        assert!(!cred.is_empty());
    }

    #[test]
    fn test_credential_roundtrip() {
        let cred = Credential::from_cookie("session", "xyz");
        let json = serde_json::to_string(&cred).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn test_response_from_text() {
        let resp = FetchResponse::from_text(200, "<html></html>", "https://example.com/");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.bytes, b"<html></html>");
    }
}

//! HTTP transport abstraction.
//!
//! The retry controller issues every attempt through [`HttpTransport`], so
//! tests can script responses without a network. The production
//! implementation wraps `reqwest` with a desktop-browser header profile and
//! redirects disabled: redirect handling belongs to the controller, which
//! must observe 301/302 statuses itself.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method as ReqwestMethod};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use gatepass_core::Method;

use crate::error::HttpError;
use crate::request::{Body, RequestSpec};

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Desktop Chrome on Windows; the profile the target sites were observed
/// to accept.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

// ============================================================================
// Raw Response
// ============================================================================

/// The transport-level result of one HTTP attempt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keys lowercased.
    pub headers: BTreeMap<String, String>,
    /// Body decoded as text (lossy UTF-8).
    pub text: String,
    /// Raw body bytes.
    pub bytes: Vec<u8>,
    /// The URL the response was served from.
    pub url: String,
}

impl RawResponse {
    /// Case-insensitive response header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Executes a single HTTP attempt.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues the request described by `spec` exactly once.
    async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse, HttpError>;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default browser profile and timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(Policy::none())
            .build()?;

        Ok(Self { inner: client })
    }

    fn method_of(spec: &RequestSpec) -> ReqwestMethod {
        match spec.method {
            Method::Get => ReqwestMethod::GET,
            Method::Post => ReqwestMethod::POST,
        }
    }

    fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpError> {
        let mut map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
        cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse, HttpError> {
        let mut request = self
            .inner
            .request(Self::method_of(spec), &spec.url)
            .headers(Self::header_map(&spec.headers)?);

        if !spec.params.is_empty() {
            request = request.query(&spec.params);
        }
        if !spec.cookies.is_empty() {
            let cookie = Self::cookie_header(&spec.cookies);
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| HttpError::InvalidHeader(format!("cookie: {e}")))?;
            request = request.header(reqwest::header::COOKIE, value);
        }
        if let Some(timeout) = spec.timeout {
            request = request.timeout(timeout);
        }
        match &spec.body {
            Body::None => {}
            Body::Form(form) => request = request.form(form),
            Body::Json(json) => request = request.json(json),
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }

        let bytes = response.bytes().await?.to_vec();
        let text = String::from_utf8_lossy(&bytes).into_owned();

        debug!(status, url = %url, bytes = bytes.len(), "Transport attempt completed");

        Ok(RawResponse {
            status,
            headers,
            text,
            bytes,
            url,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_assembly() {
        let mut cookies = BTreeMap::new();
        cookies.insert("a".to_string(), "1".to_string());
        cookies.insert("b".to_string(), "2".to_string());
        assert_eq!(ReqwestTransport::cookie_header(&cookies), "a=1; b=2");
    }

    #[test]
    fn test_header_map_rejects_bad_name() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header\n".to_string(), "x".to_string());
        assert!(ReqwestTransport::header_map(&headers).is_err());
    }

    #[test]
    fn test_raw_response_header_lookup() {
        let mut headers = BTreeMap::new();
        headers.insert("location".to_string(), "/next".to_string());
        let resp = RawResponse {
            status: 302,
            headers,
            text: String::new(),
            bytes: Vec::new(),
            url: "https://example.com/".to_string(),
        };
        assert_eq!(resp.header("Location"), Some("/next"));
    }
}

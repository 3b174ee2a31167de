//! Registrable domain extraction.
//!
//! The credential caches are keyed by the effective top-level-domain-plus-one
//! of the request URL (`sub.example.co.uk` → `example.co.uk`), so that a
//! clearance earned on one subdomain is reused across the whole site.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::CoreError;

/// The eTLD+1 cache key derived from a request URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrableDomain(String);

impl RegistrableDomain {
    /// Derives the registrable domain from an absolute URL.
    ///
    /// Hosts without a known public suffix (IP addresses, `localhost`,
    /// single-label intranet names) fall back to the literal host so they
    /// still get a stable cache key.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let parsed = Url::parse(url).map_err(|e| CoreError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CoreError::MissingHost(url.to_string()))?;
        Ok(Self::from_host(host))
    }

    /// Derives the registrable domain from a bare host name.
    pub fn from_host(host: &str) -> Self {
        match psl::domain_str(host) {
            Some(domain) => Self(domain.to_string()),
            None => Self(host.to_string()),
        }
    }

    /// Returns the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the site root for this domain under the given scheme,
    /// e.g. `https://example.co.uk`. Bypass strategies are pointed here
    /// rather than at a deep URL.
    pub fn site_root(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.0)
    }
}

impl fmt::Display for RegistrableDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RegistrableDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================

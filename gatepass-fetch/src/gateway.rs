//! Public fetch entry points.
//!
//! The gateway is what extraction clients call: `get`/`post` with optional
//! request data. It owns the injected collaborators (credential store,
//! transport, bypass suite, clock) and hands each call to the retry
//! controller. Clients never touch the credential store directly.

use std::sync::Arc;
use tracing::instrument;

use gatepass_core::FetchResponse;
use gatepass_store::{CredentialStore, MemoryCredentialStore};

use crate::backoff::{BackoffPolicy, Clock, SystemClock};
use crate::bypass::BypassSuite;
use crate::controller::RetryController;
use crate::error::FetchError;
use crate::request::{Body, RequestOptions, RequestSpec};
use crate::transport::{HttpTransport, ReqwestTransport};

// ============================================================================
// Fetch Gateway
// ============================================================================

/// The public fetch surface.
///
/// A call blocks until it produces a terminal [`FetchResponse`] or the
/// attempt budget is exhausted; there is deliberately no way to cancel an
/// in-flight call beyond the per-HTTP-call timeout.
pub struct FetchGateway {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    bypass: BypassSuite,
    clock: Arc<dyn Clock>,
    backoff: BackoffPolicy,
}

impl FetchGateway {
    /// Creates a gateway with default collaborators: `reqwest` transport,
    /// in-memory store, noop bypass suite, system clock.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Creates a builder for customizing the gateway.
    pub fn builder() -> FetchGatewayBuilder {
        FetchGatewayBuilder::new()
    }

    /// Fetches a URL with GET, retrying and remediating anti-bot blocks
    /// until terminal success or exhaustion.
    #[instrument(skip(self, options), fields(url = %url))]
    pub async fn get(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<FetchResponse, FetchError> {
        self.run(RequestSpec::get(url, options)).await
    }

    /// Fetches a URL with POST. POST never treats 404 as success, never
    /// follows redirects, and consults a narrower detector chain.
    #[instrument(skip(self, body, options), fields(url = %url))]
    pub async fn post(
        &self,
        url: &str,
        body: Body,
        options: RequestOptions,
    ) -> Result<FetchResponse, FetchError> {
        self.run(RequestSpec::post(url, body, options)).await
    }

    async fn run(&self, spec: RequestSpec) -> Result<FetchResponse, FetchError> {
        let controller = RetryController {
            transport: self.transport.as_ref(),
            store: self.store.as_ref(),
            bypass: &self.bypass,
            clock: self.clock.as_ref(),
            backoff: &self.backoff,
        };
        controller.run(spec).await
    }
}

impl std::fmt::Debug for FetchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGateway")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing a [`FetchGateway`].
pub struct FetchGatewayBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    store: Option<Arc<dyn CredentialStore>>,
    bypass: BypassSuite,
    clock: Option<Arc<dyn Clock>>,
    backoff: BackoffPolicy,
}

impl FetchGatewayBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            transport: None,
            store: None,
            bypass: BypassSuite::noop(),
            clock: None,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Sets the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the credential store. Use a durable store ([`JsonFileStore`])
    /// when earned clearances should survive restarts.
    ///
    /// [`JsonFileStore`]: gatepass_store::JsonFileStore
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the bypass strategy suite.
    pub fn bypass(mut self, bypass: BypassSuite) -> Self {
        self.bypass = bypass;
        self
    }

    /// Sets the clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the backoff policy.
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Builds the gateway. Fails only if the default transport cannot be
    /// constructed (broken TLS configuration).
    pub fn build(self) -> Result<FetchGateway, FetchError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        Ok(FetchGateway {
            transport,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
            bypass: self.bypass,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            backoff: self.backoff,
        })
    }
}

impl Default for FetchGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::error::HttpError;
    use crate::transport::RawResponse;

    struct OkTransport {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl HttpTransport for OkTransport {
        async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse, HttpError> {
            *self.calls.lock().unwrap() += 1;
            Ok(RawResponse {
                status: 200,
                headers: BTreeMap::new(),
                text: "ok".to_string(),
                bytes: b"ok".to_vec(),
                url: spec.url.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_gateway_get_roundtrip() {
        let transport = Arc::new(OkTransport {
            calls: Mutex::new(0),
        });
        let gateway = FetchGateway::builder()
            .transport(transport.clone())
            .build()
            .unwrap();

        let resp = gateway
            .get("https://example.com/page", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(*transport.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_gateway_rejects_invalid_url() {
        let transport = Arc::new(OkTransport {
            calls: Mutex::new(0),
        });
        let gateway = FetchGateway::builder().transport(transport).build().unwrap();

        let err = gateway.get("::notaurl::", RequestOptions::new()).await;
        assert!(matches!(err, Err(FetchError::Core(_))));
    }
}

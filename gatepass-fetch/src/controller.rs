//! The bounded retry state machine driving one logical fetch.
//!
//! Each attempt re-merges credentials from the store, issues the HTTP call,
//! and dispatches on the observed status: terminal success, 403 remediation
//! through the detector chain and bypass strategies, 429 rate-limit pause,
//! GET redirect resolution, or a short cooldown. The loop is bounded to
//! [`MAX_ATTEMPTS`] attempts; exhaustion is the only error surfaced besides
//! precondition and store failures.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

use gatepass_core::{Credential, FetchResponse, Method, Namespace, RegistrableDomain};
use gatepass_store::CredentialStore;

use crate::backoff::{BackoffPolicy, Clock, MAX_ATTEMPTS};
use crate::bypass::{BypassOutcome, BypassStrategy, BypassSuite};
use crate::detect::{self, BlockKind, Detector, DetectorChain};
use crate::error::FetchError;
use crate::request::RequestSpec;
use crate::transport::{HttpTransport, RawResponse};

// ============================================================================
// Retry Controller
// ============================================================================

/// Executes one logical fetch to completion.
pub(crate) struct RetryController<'a> {
    pub transport: &'a dyn HttpTransport,
    pub store: &'a dyn CredentialStore,
    pub bypass: &'a BypassSuite,
    pub clock: &'a dyn Clock,
    pub backoff: &'a BackoffPolicy,
}

/// What a 403 remediation decided.
enum Remediation {
    /// Bypass produced final content; stop with this response.
    Terminal(FetchResponse),
    /// Loop to the next attempt (a credential may have been persisted,
    /// or a cooldown already served).
    Retry,
}

impl RetryController<'_> {
    /// Runs the attempt loop for the given request.
    pub async fn run(&self, spec: RequestSpec) -> Result<FetchResponse, FetchError> {
        let domain = RegistrableDomain::from_url(&spec.url)?;
        let scheme = Url::parse(&spec.url)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        let site_root = domain.site_root(&scheme);
        let chain = match spec.method {
            Method::Get => DetectorChain::for_get(),
            Method::Post => DetectorChain::for_post(),
        };

        // The target may be rewritten by redirect resolution; everything else
        // about the request is fixed for the whole call.
        let mut url = spec.url.clone();
        let mut last_status: u16 = 0;

        for attempt in 1..=MAX_ATTEMPTS {
            let cached = self.store.get(domain.as_str(), Namespace::Opportunistic).await?;
            let login = self.store.get(domain.as_str(), Namespace::Login).await?;
            let merged = merge_spec(&spec, &url, cached.as_ref(), login.as_ref());

            let raw = match self.transport.execute(&merged).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(method = %spec.method, url = %url, attempt, error = %e, "Transport failure");
                    last_status = 0;
                    self.clock.wait(self.backoff.short).await;
                    continue;
                }
            };
            last_status = raw.status;
            info!(method = %spec.method, status = raw.status, url = %url, attempt, "Attempt completed");

            if is_terminal(spec.method, raw.status) {
                return Ok(into_response(raw));
            }

            match raw.status {
                403 => {
                    // A credential that still produces a 403 is known bad;
                    // drop it before remediation so it is never retried
                    // unchanged.
                    if cached.is_some() {
                        debug!(domain = %domain, "Evicting credential that no longer clears");
                        self.store.delete(domain.as_str(), Namespace::Opportunistic).await?;
                    }
                    let kind = chain.classify(&raw.text);
                    debug!(domain = %domain, kind = ?kind, "Classified 403 response");
                    match self
                        .remediate(kind, &site_root, &url, spec.method, &domain)
                        .await?
                    {
                        Remediation::Terminal(response) => return Ok(response),
                        Remediation::Retry => {}
                    }
                }
                429 => {
                    debug!(url = %url, "Rate limited, pausing");
                    self.clock.wait(self.backoff.rate_limit).await;
                }
                301 | 302 if spec.method == Method::Get => {
                    let Some(location) = raw.header("location") else {
                        self.clock.wait(self.backoff.short).await;
                        continue;
                    };
                    let resolved = resolve_location(&scheme, &domain, location);
                    debug!(from = %url, to = %resolved, "Following redirect");
                    url = resolved;

                    // Re-issue once within the same attempt against the
                    // resolved target, then accept a terminal status.
                    let merged = merge_spec(&spec, &url, cached.as_ref(), login.as_ref());
                    match self.transport.execute(&merged).await {
                        Ok(raw) => {
                            last_status = raw.status;
                            if is_terminal(spec.method, raw.status) {
                                return Ok(into_response(raw));
                            }
                        }
                        Err(e) => {
                            warn!(url = %url, error = %e, "Redirect re-issue failed");
                        }
                    }
                }
                _ => {
                    self.clock.wait(self.backoff.short).await;
                }
            }
        }

        Err(FetchError::Exhausted {
            last_status,
            attempts: MAX_ATTEMPTS,
            url,
        })
    }

    /// Dispatches the remediation for a classified 403.
    async fn remediate(
        &self,
        kind: Option<BlockKind>,
        site_root: &str,
        url: &str,
        method: Method,
        domain: &RegistrableDomain,
    ) -> Result<Remediation, FetchError> {
        match kind {
            Some(BlockKind::Interstitial) => {
                match self.invoke(&*self.bypass.full_solve, site_root, url).await {
                    BypassOutcome::Credential(credential) => {
                        self.persist(domain, credential).await?;
                        Ok(Remediation::Retry)
                    }
                    BypassOutcome::Content(content) => {
                        Ok(Remediation::Terminal(forced_success(content, url)))
                    }
                    BypassOutcome::Unavailable => {
                        self.scripted_then_fallback(site_root, url, method, domain).await
                    }
                }
            }
            Some(BlockKind::CookieGate | BlockKind::Attention) => {
                self.scripted_then_fallback(site_root, url, method, domain).await
            }
            // Timeout/BadGateway never appear in the 403 chains.
            None | Some(BlockKind::Timeout | BlockKind::BadGateway) => {
                self.fallback(site_root, url, method, domain).await
            }
        }
    }

    /// Scripted fetch, falling back to the generic strategy when it yields
    /// nothing.
    async fn scripted_then_fallback(
        &self,
        site_root: &str,
        url: &str,
        method: Method,
        domain: &RegistrableDomain,
    ) -> Result<Remediation, FetchError> {
        match self.invoke(&*self.bypass.scripted_fetch, site_root, url).await {
            BypassOutcome::Content(content) => Ok(Remediation::Terminal(forced_success(content, url))),
            BypassOutcome::Credential(credential) => {
                self.persist(domain, credential).await?;
                Ok(Remediation::Retry)
            }
            BypassOutcome::Unavailable => self.fallback(site_root, url, method, domain).await,
        }
    }

    /// Last-resort strategy. Content is accepted only when, on GET, it does
    /// not itself look like a timeout or bad-gateway page; otherwise the
    /// loop pauses for the challenge cooldown and retries.
    async fn fallback(
        &self,
        site_root: &str,
        url: &str,
        method: Method,
        domain: &RegistrableDomain,
    ) -> Result<Remediation, FetchError> {
        match self.invoke(&*self.bypass.no_captcha, site_root, url).await {
            BypassOutcome::Content(content) => {
                let rejected = method == Method::Get
                    && (detect::bad_gateway().matches(&content)
                        || detect::timeout().matches(&content));
                if rejected {
                    debug!(url = %url, "Fallback content still looks blocked");
                    self.clock.wait(self.backoff.challenge).await;
                    Ok(Remediation::Retry)
                } else {
                    Ok(Remediation::Terminal(forced_success(content, url)))
                }
            }
            BypassOutcome::Credential(credential) => {
                self.persist(domain, credential).await?;
                Ok(Remediation::Retry)
            }
            BypassOutcome::Unavailable => {
                self.clock.wait(self.backoff.challenge).await;
                Ok(Remediation::Retry)
            }
        }
    }

    /// Invokes a strategy, absorbing its errors as "no remediation".
    async fn invoke(
        &self,
        strategy: &dyn BypassStrategy,
        site_root: &str,
        url: &str,
    ) -> BypassOutcome {
        match strategy.solve(site_root, url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(strategy = strategy.id(), error = %e, "Bypass strategy failed");
                BypassOutcome::Unavailable
            }
        }
    }

    async fn persist(
        &self,
        domain: &RegistrableDomain,
        credential: Credential,
    ) -> Result<(), FetchError> {
        info!(domain = %domain, "Persisting earned clearance credential");
        self.store
            .insert(domain.as_str(), Namespace::Opportunistic, credential)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// 2xx is terminal for both methods; 404 is accepted as terminal on GET only
/// (missing-resource is actionable data for the extraction clients).
fn is_terminal(method: Method, status: u16) -> bool {
    (200..=299).contains(&status) || (method == Method::Get && status == 404)
}

fn into_response(raw: RawResponse) -> FetchResponse {
    FetchResponse {
        status: raw.status,
        text: raw.text,
        bytes: raw.bytes,
        final_url: raw.url,
    }
}

/// Content handed over by a bypass strategy counts as a 200 regardless of
/// the status the blocked attempt saw.
fn forced_success(content: String, url: &str) -> FetchResponse {
    FetchResponse::from_text(200, content, url)
}

/// Merges stored credentials into the caller-supplied request data with
/// precedence login > opportunistic > caller.
fn merge_spec(
    spec: &RequestSpec,
    url: &str,
    cached: Option<&Credential>,
    login: Option<&Credential>,
) -> RequestSpec {
    let mut headers: BTreeMap<String, String> = spec.headers.clone();
    let mut cookies: BTreeMap<String, String> = spec.cookies.clone();
    for credential in [cached, login].into_iter().flatten() {
        headers.extend(credential.headers.clone());
        cookies.extend(credential.cookies.clone());
    }
    RequestSpec {
        url: url.to_string(),
        headers,
        cookies,
        ..spec.clone()
    }
}

/// Resolves a `Location` header to an absolute URL; relative locations
/// resolve against the request's scheme and registrable domain.
fn resolve_location(scheme: &str, domain: &RegistrableDomain, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else if location.starts_with('/') {
        format!("{scheme}://{domain}{location}")
    } else {
        format!("{scheme}://{domain}/{location}")
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Bypass strategy contract.
//!
//! A bypass strategy is an external remediation procedure (typically browser
//! automation) invoked when a 403 body is classified as anti-bot-blocked.
//! Only the contract lives here; concrete solvers are collaborators supplied
//! by the embedding application.

use async_trait::async_trait;
use std::sync::Arc;

use gatepass_core::Credential;

use crate::error::BypassError;

// ============================================================================
// Bypass Outcome
// ============================================================================

/// What a bypass strategy produced.
///
/// A strategy returns exactly one of these; a strategy error is treated by
/// the controller identically to [`BypassOutcome::Unavailable`].
#[derive(Debug, Clone)]
pub enum BypassOutcome {
    /// A reusable clearance credential to persist and retry with.
    Credential(Credential),
    /// Rendered page content to treat as an immediate terminal success.
    Content(String),
    /// No remediation available.
    Unavailable,
}

// ============================================================================
// Bypass Strategy Trait
// ============================================================================

/// One remediation procedure the controller can dispatch to.
///
/// `site_root` is the scheme + registrable domain of the blocked request
/// (e.g. `https://example.co.uk`); `original_url` is the full URL the fetch
/// was for. Strategies that only need the site root may ignore the latter.
#[async_trait]
pub trait BypassStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g. "browser.full_solve").
    fn id(&self) -> &str;

    /// Attempts remediation for the blocked request.
    async fn solve(&self, site_root: &str, original_url: &str)
    -> Result<BypassOutcome, BypassError>;
}

// ============================================================================
// Noop Strategy
// ============================================================================

/// Strategy that never remediates. The default for embedders that have not
/// wired up an external solver.
#[derive(Debug, Clone)]
pub struct NoopBypass {
    id: &'static str,
}

impl NoopBypass {
    /// Creates a noop strategy with the given id.
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

#[async_trait]
impl BypassStrategy for NoopBypass {
    fn id(&self) -> &str {
        self.id
    }

    async fn solve(
        &self,
        _site_root: &str,
        _original_url: &str,
    ) -> Result<BypassOutcome, BypassError> {
        Ok(BypassOutcome::Unavailable)
    }
}

// ============================================================================
// Bypass Suite
// ============================================================================

/// The three strategy roles the retry controller dispatches to.
#[derive(Clone)]
pub struct BypassSuite {
    /// Full challenge solve; expected to yield a clearance credential.
    pub full_solve: Arc<dyn BypassStrategy>,
    /// Scripted fetch without a full browser; expected to yield content.
    pub scripted_fetch: Arc<dyn BypassStrategy>,
    /// Generic fallback when no classifier matched.
    pub no_captcha: Arc<dyn BypassStrategy>,
}

impl BypassSuite {
    /// A suite where every role is a noop.
    pub fn noop() -> Self {
        Self {
            full_solve: Arc::new(NoopBypass::new("noop.full_solve")),
            scripted_fetch: Arc::new(NoopBypass::new("noop.scripted_fetch")),
            no_captcha: Arc::new(NoopBypass::new("noop.no_captcha")),
        }
    }

    /// Replaces the full-solve strategy.
    pub fn with_full_solve(mut self, strategy: Arc<dyn BypassStrategy>) -> Self {
        self.full_solve = strategy;
        self
    }

    /// Replaces the scripted-fetch strategy.
    pub fn with_scripted_fetch(mut self, strategy: Arc<dyn BypassStrategy>) -> Self {
        self.scripted_fetch = strategy;
        self
    }

    /// Replaces the fallback strategy.
    pub fn with_no_captcha(mut self, strategy: Arc<dyn BypassStrategy>) -> Self {
        self.no_captcha = strategy;
        self
    }
}

impl Default for BypassSuite {
    fn default() -> Self {
        Self::noop()
    }
}

// ============================================================================
// Tests
// ============================================================================

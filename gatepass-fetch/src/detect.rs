//! Anti-bot response classification.
//!
//! On every 403 the controller runs the body through an ordered detector
//! chain; the first matching classifier wins and selects the remediation.
//! The chain is a data structure, so adding or reordering detectors is a
//! data change rather than a control-flow rewrite.

use std::fmt;

// ============================================================================
// Block Kind
// ============================================================================

/// The anti-bot presentation a response body was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Generic challenge interstitial ("checking your browser").
    Interstitial,
    /// Cookie-consent / enable-cookies gate.
    CookieGate,
    /// "Attention required" verification page (observed on POST only).
    Attention,
    /// Origin connection timeout page. Secondary check only, applied to
    /// bypass-produced content on GET.
    Timeout,
    /// Bad-gateway page. Secondary check only, applied to bypass-produced
    /// content on GET.
    BadGateway,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interstitial => "interstitial",
            Self::CookieGate => "cookie-gate",
            Self::Attention => "attention",
            Self::Timeout => "timeout",
            Self::BadGateway => "bad-gateway",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Detector
// ============================================================================

/// A predicate over response body text identifying one anti-bot presentation.
pub trait Detector: Send + Sync {
    /// Returns true if the body matches this presentation.
    fn matches(&self, body: &str) -> bool;
}

/// Detector matching any of a set of case-insensitive substrings.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    patterns: &'static [&'static str],
}

impl PatternDetector {
    /// Creates a detector from lowercase substring patterns.
    pub const fn new(patterns: &'static [&'static str]) -> Self {
        Self { patterns }
    }
}

impl Detector for PatternDetector {
    fn matches(&self, body: &str) -> bool {
        let lowered = body.to_lowercase();
        self.patterns.iter().any(|p| lowered.contains(p))
    }
}

/// Challenge interstitial markers.
pub fn interstitial() -> PatternDetector {
    PatternDetector::new(&[
        "just a moment",
        "checking your browser before accessing",
        "cf-browser-verification",
        "cf_chl_",
        "verifying you are human",
        "challenge-platform",
    ])
}

/// Enable-cookies gate markers.
pub fn cookie_gate() -> PatternDetector {
    PatternDetector::new(&[
        "please enable cookies",
        "cookies are disabled",
        "enable cookies and reload",
    ])
}

/// Attention/verification page markers.
pub fn attention() -> PatternDetector {
    PatternDetector::new(&[
        "attention required!",
        "sorry, you have been blocked",
    ])
}

/// Origin timeout page markers.
pub fn timeout() -> PatternDetector {
    PatternDetector::new(&[
        "connection timed out",
        "error code 522",
        "cf-error-code\">522",
    ])
}

/// Bad-gateway page markers.
pub fn bad_gateway() -> PatternDetector {
    PatternDetector::new(&[
        "bad gateway",
        "error code 502",
        "cf-error-code\">502",
    ])
}

// ============================================================================
// Detector Chain
// ============================================================================

/// Ordered list of `(kind, detector)` pairs; first match wins.
pub struct DetectorChain {
    rules: Vec<(BlockKind, Box<dyn Detector>)>,
}

impl DetectorChain {
    /// Builds a chain from ordered rules.
    pub fn new(rules: Vec<(BlockKind, Box<dyn Detector>)>) -> Self {
        Self { rules }
    }

    /// The chain consulted on GET 403s.
    pub fn for_get() -> Self {
        Self::new(vec![
            (BlockKind::Interstitial, Box::new(interstitial())),
            (BlockKind::CookieGate, Box::new(cookie_gate())),
        ])
    }

    /// The chain consulted on POST 403s. The attention page was only ever
    /// observed on POST responses; the timeout and bad-gateway classifiers
    /// are omitted since they were only ever observed on GET.
    pub fn for_post() -> Self {
        Self::new(vec![
            (BlockKind::Interstitial, Box::new(interstitial())),
            (BlockKind::CookieGate, Box::new(cookie_gate())),
            (BlockKind::Attention, Box::new(attention())),
        ])
    }

    /// Classifies a response body; returns the first matching kind.
    pub fn classify(&self, body: &str) -> Option<BlockKind> {
        self.rules
            .iter()
            .find(|(_, detector)| detector.matches(body))
            .map(|(kind, _)| *kind)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interstitial_patterns() {
        let d = interstitial();
        assert!(d.matches("<title>Just a moment...</title>"));
        assert!(d.matches("Checking your browser before accessing example.com"));
        assert!(!d.matches("<html>regular page</html>"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(cookie_gate().matches("PLEASE ENABLE COOKIES"));
    }

    #[test]
    fn test_first_match_wins() {
        // A body matching both interstitial and cookie-gate markers must
        // classify as interstitial, the higher-priority rule.
        let body = "Just a moment... please enable cookies";
        assert_eq!(
            DetectorChain::for_get().classify(body),
            Some(BlockKind::Interstitial)
        );
    }

    #[test]
    fn test_get_chain_ignores_attention() {
        let body = "Attention Required! | Cloudflare";
        assert_eq!(DetectorChain::for_get().classify(body), None);
        assert_eq!(
            DetectorChain::for_post().classify(body),
            Some(BlockKind::Attention)
        );
    }

    #[test]
    fn test_secondary_detectors() {
        assert!(timeout().matches("Error code 522"));
        assert!(bad_gateway().matches("<h1>Bad gateway</h1>"));
        assert!(!bad_gateway().matches("all good"));
    }

    #[test]
    fn test_unclassified_body() {
        assert_eq!(DetectorChain::for_get().classify("<p>403 forbidden</p>"), None);
    }
}

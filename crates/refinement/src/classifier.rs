//! Issue classification: routes critique findings between the cheap
//! local fix-up and a full regeneration.

/// How repairable an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueClass {
    /// Fixable with local pixel-level operations (blur, noise, ...).
    Simple,
    /// Requires re-synthesis (brand, message, safety, ...).
    Complex,
}

/// Classifies one piece of issue/feedback text. Pluggable so the
/// keyword heuristic can be swapped for a better classifier without
/// touching the routing logic.
pub trait IssueClassifier: Send + Sync {
    fn classify(&self, text: &str) -> IssueClass;
}

/// Default substring classifier. Complex keywords dominate; text that
/// matches neither set is treated as Complex, so unknown problems route
/// to regeneration rather than a cosmetic fix.
pub struct KeywordClassifier {
    simple: &'static [&'static str],
    complex: &'static [&'static str],
}

const SIMPLE_KEYWORDS: &[&str] = &[
    "blur",
    "blurry",
    "unsharp",
    "soft",
    "sharp",
    "noise",
    "noisy",
    "artifact",
    "grain",
    "contrast",
    "flat",
    "dull",
    "bright",
    "dark",
    "brightness",
    "exposure",
];

const COMPLEX_KEYWORDS: &[&str] = &[
    "brand",
    "logo",
    "color",
    "message",
    "product",
    "safety",
    "stereotype",
];

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            simple: SIMPLE_KEYWORDS,
            complex: COMPLEX_KEYWORDS,
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> IssueClass {
        let text = text.to_lowercase();
        if self.complex.iter().any(|kw| text.contains(kw)) {
            return IssueClass::Complex;
        }
        if self.simple.iter().any(|kw| text.contains(kw)) {
            return IssueClass::Simple;
        }
        IssueClass::Complex
    }
}

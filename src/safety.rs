//! Disallowed-topic keyword filter
//!
//! Case-insensitive substring match against a fixed list. A best-effort
//! heuristic, checked before any remote call is made.

/// Built-in disallowed fragments. Some carry a trailing space on purpose
/// ("kill " does not match "skills").
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "bomb",
    "explode",
    "how to kill",
    "kill ",
    "suicide",
    "self-harm",
    "hard drugs",
    "child sexual",
    "rape",
    "porn",
    "manufacture weapon",
    "weaponize",
    "how to make a bomb",
];

/// User-facing text for a rejected request
pub const REJECTION_MESSAGE: &str =
    "I cannot help with that request. It may be unsafe or disallowed.";

#[derive(Debug, Clone)]
pub struct SafetyFilter {
    keywords: Vec<String>,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyFilter {
    pub fn new() -> Self {
        Self {
            keywords: FORBIDDEN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Built-in list plus extra fragments; blank extras are ignored
    pub fn with_extra_keywords<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        filter.keywords.extend(
            extra
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.trim().is_empty()),
        );
        filter
    }

    pub fn is_disallowed(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

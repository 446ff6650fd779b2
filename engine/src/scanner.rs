//! Keyword-based message safety scanning.
//!
//! Classification is case-insensitive substring containment against a fixed,
//! ordered taxonomy. Tiers are checked in a fixed precedence: graphic content
//! first, then self-harm language, then despair language. The first tier that
//! matches wins and scanning stops, so a message containing both graphic and
//! self-harm keywords flags as graphic.
//!
//! The substring policy is deliberately crude and has known false positives
//! ("cutting vegetables" flags graphic). Smarter scanning is a product
//! decision, not a bug fix; the behavior here is load-bearing.

use aho_corasick::AhoCorasick;
use thiserror::Error;

use hearth_types::{FlagKind, SafetyFlag, SafetyScanResult};

/// Keyword lists and resource messages for one scanner instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyTaxonomy {
    pub graphic_keywords: Vec<String>,
    pub self_harm_keywords: Vec<String>,
    pub despair_keywords: Vec<String>,
    pub graphic_message: String,
    pub self_harm_message: String,
    pub despair_message: String,
}

impl Default for SafetyTaxonomy {
    fn default() -> Self {
        Self {
            graphic_keywords: to_strings(&["bleeding", "cutting", "blood"]),
            self_harm_keywords: to_strings(&[
                "kill myself",
                "suicide",
                "end it all",
                "hurt myself",
                "nothing to live for",
                "want to die",
            ]),
            despair_keywords: to_strings(&[
                "hopeless",
                "too much pain",
                "can't go on",
                "worthless",
                "giving up",
            ]),
            graphic_message:
                "A reminder: please avoid graphic details to keep this space safe for everyone."
                    .to_string(),
            self_harm_message:
                "It sounds like you are going through an overwhelming amount of pain. Please know \
                 you are not alone. You can call or text 988 to reach the Suicide & Crisis Lifeline."
                    .to_string(),
            despair_message:
                "We hear how hard this is. Remember to take a breath. If you need 1-on-1 support, \
                 text HOME to 741741 (Crisis Text Line)."
                    .to_string(),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

#[derive(Debug, Error)]
#[error("failed to build keyword matcher for {tier} tier")]
pub struct TaxonomyError {
    tier: &'static str,
    #[source]
    source: aho_corasick::BuildError,
}

/// One scan tier: a compiled matcher plus the keywords it was built from and
/// the resource message it produces.
#[derive(Debug)]
struct Tier {
    kind: FlagKind,
    matcher: AhoCorasick,
    keywords: Vec<String>,
    resource_message: String,
}

impl Tier {
    fn build(
        name: &'static str,
        kind: FlagKind,
        keywords: Vec<String>,
        resource_message: String,
    ) -> Result<Self, TaxonomyError> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&keywords)
            .map_err(|source| TaxonomyError { tier: name, source })?;
        Ok(Self {
            kind,
            matcher,
            keywords,
            resource_message,
        })
    }

    fn scan(&self, text: &str) -> Option<SafetyFlag> {
        let matched = self.matcher.find(text)?;
        Some(SafetyFlag {
            kind: self.kind,
            trigger_word: self.keywords[matched.pattern().as_usize()].clone(),
            resource_message: self.resource_message.clone(),
        })
    }
}

/// Classifies message text into a severity tier. Pure, deterministic, total;
/// independent of any room or lifecycle state.
#[derive(Debug)]
pub struct SafetyScanner {
    // Checked in this order; first match wins
    tiers: [Tier; 3],
}

impl SafetyScanner {
    /// Scanner over the reference taxonomy.
    #[must_use]
    pub fn new() -> Self {
        // The reference keyword lists are small and ASCII; building cannot fail
        Self::with_taxonomy(SafetyTaxonomy::default())
            .expect("reference taxonomy compiles")
    }

    pub fn with_taxonomy(taxonomy: SafetyTaxonomy) -> Result<Self, TaxonomyError> {
        Ok(Self {
            tiers: [
                Tier::build(
                    "graphic",
                    FlagKind::Graphic,
                    taxonomy.graphic_keywords,
                    taxonomy.graphic_message,
                )?,
                Tier::build(
                    "self-harm",
                    FlagKind::SelfHarm,
                    taxonomy.self_harm_keywords,
                    taxonomy.self_harm_message,
                )?,
                Tier::build(
                    "despair",
                    FlagKind::Despair,
                    taxonomy.despair_keywords,
                    taxonomy.despair_message,
                )?,
            ],
        })
    }

    /// Scan one message. Never fails; no match is a valid result.
    #[must_use]
    pub fn scan(&self, text: &str) -> SafetyScanResult {
        let normalized = text.trim().to_lowercase();
        for tier in &self.tiers {
            if let Some(flag) = tier.scan(&normalized) {
                return SafetyScanResult::Flagged(flag);
            }
        }
        SafetyScanResult::Clear
    }
}

impl Default for SafetyScanner {
    fn default() -> Self {
        Self::new()
    }
}

//! Keyword-based incident severity classification.
//!
//! Case-insensitive substring matching against fixed keyword lists, checked
//! critical -> high -> medium; the first matching level wins and anything
//! unmatched (including empty text) is low. Pure and deterministic: the same
//! text always yields the same classification.

use crate::models::CallPriority;

const CRITICAL_KEYWORDS: &[&str] = &[
    "shooting",
    "shots fired",
    "officer down",
    "hostage",
    "armed",
    "explosion",
    "structure fire",
    "active threat",
];

const HIGH_KEYWORDS: &[&str] = &[
    "robbery",
    "assault",
    "weapon",
    "domestic",
    "overdose",
    "pursuit",
    "chase",
    "burglary in progress",
    "stabbing",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "burglary",
    "theft",
    "accident",
    "crash",
    "vandalism",
    "fraud",
    "missing",
    "suspicious",
];

/// Classify incident free text into a severity level.
pub fn classify(incident_text: &str) -> CallPriority {
    let text = incident_text.to_lowercase();

    if matches_any(&text, CRITICAL_KEYWORDS) {
        CallPriority::Critical
    } else if matches_any(&text, HIGH_KEYWORDS) {
        CallPriority::High
    } else if matches_any(&text, MEDIUM_KEYWORDS) {
        CallPriority::Medium
    } else {
        CallPriority::Low
    }
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

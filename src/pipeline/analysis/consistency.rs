//! Company-consistency verdict parsing.
//!
//! The analysis prompt instructs the model to end its answer with one of two
//! literal marker lines. This module classifies an analysis text by pure
//! string inspection: no I/O, deterministic, and "unknown" is a first-class
//! outcome whenever neither marker is present.

use serde::{Serialize, Serializer};

/// Marker line opening emitted for a company mismatch.
pub const MISMATCH_MARKER: &str = "COMPANY_MISMATCH:";

/// Accepted match spellings, with and without a space after the colon.
/// The mismatch marker intentionally has a single spelling.
pub const MATCH_MARKERS: [&str; 2] = ["COMPANY_MATCH: YES", "COMPANY_MATCH:YES"];

/// Detail text is capped at this many characters.
const MAX_DETAIL_CHARS: usize = 200;

/// Tri-state company-match verdict. Serializes as `true` / `false` / `null`
/// in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyMatch {
    Match,
    Mismatch,
    Unknown,
}

impl CompanyMatch {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            CompanyMatch::Match => Some(true),
            CompanyMatch::Mismatch => Some(false),
            CompanyMatch::Unknown => None,
        }
    }

    /// Label used when listing prior documents in the analysis prompt.
    pub fn history_label(self) -> &'static str {
        match self {
            CompanyMatch::Match => "COMPANY_MATCH",
            CompanyMatch::Mismatch => "COMPANY_MISMATCH",
            CompanyMatch::Unknown => "unknown",
        }
    }
}

impl Serialize for CompanyMatch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_bool() {
            Some(b) => serializer.serialize_bool(b),
            None => serializer.serialize_none(),
        }
    }
}

/// Parsed outcome of inspecting one analysis text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyVerdict {
    pub verdict: CompanyMatch,
    /// The mismatch marker line, capped at 200 characters.
    pub detail: Option<String>,
    /// Company names the analysis found in the document.
    pub mentioned_companies: Option<String>,
}

impl ConsistencyVerdict {
    fn unknown() -> Self {
        Self {
            verdict: CompanyMatch::Unknown,
            detail: None,
            mentioned_companies: None,
        }
    }
}

/// Classify an analysis text against the expected company.
///
/// Only evaluated when an expected company was supplied; without one the
/// verdict is always unknown. A mismatch marker takes precedence over a
/// match marker when both appear.
pub fn parse_company_verdict(analysis: &str, expected_company: &str) -> ConsistencyVerdict {
    if expected_company.trim().is_empty() {
        return ConsistencyVerdict::unknown();
    }

    if let Some(idx) = analysis.find(MISMATCH_MARKER) {
        let rest = &analysis[idx..];
        let line = match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        };
        let detail = truncate_chars(line.trim(), MAX_DETAIL_CHARS);
        let mentioned = detail.replace(MISMATCH_MARKER, "").trim().to_string();
        return ConsistencyVerdict {
            verdict: CompanyMatch::Mismatch,
            detail: Some(detail),
            mentioned_companies: Some(mentioned),
        };
    }

    if MATCH_MARKERS.iter().any(|m| analysis.contains(m)) {
        return ConsistencyVerdict {
            verdict: CompanyMatch::Match,
            detail: None,
            mentioned_companies: Some(expected_company.to_string()),
        };
    }

    ConsistencyVerdict::unknown()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

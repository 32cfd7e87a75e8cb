//! Natural-language question -> `ResolvedQuery`.
//!
//! This is intentionally **not** a statistical parser: it is a fixed,
//! ordered set of keyword templates, so the same question always resolves
//! the same way. Templates, first match wins:
//!
//! 1. raw query markers (`sql: ...`, `raw: ...`, or a `SELECT ...` that parses)
//! 2. a known place (country or macroarea) outside any family name
//! 3. a known family name or alias
//! 4. "languages in/of <Capitalized words>" with an unknown place
//! 5. a capitalized word next to "family"/"genus"/"languages"
//! 6. statistics words ("how many", "statistics", "distribution", ...)
//!
//! Anything else falls back to statistics.

use crate::families::{find_family, FamilyMention};
use crate::sqlish::is_sql;
use serde::Serialize;
use std::fmt;
use walsgraph_geo::{fold_key, GeoResolver, Place};

/// The classified purpose of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Intent {
    Geographic,
    Family,
    Statistics,
    Raw,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A question reduced to an intent and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolvedQuery {
    /// `place` may be `Unresolved`; `place_text` is the text as written.
    Geographic { place_text: String, place: Place },
    Family { family: String },
    Statistics,
    Raw { query: String },
}

impl ResolvedQuery {
    pub fn intent(&self) -> Intent {
        match self {
            ResolvedQuery::Geographic { .. } => Intent::Geographic,
            ResolvedQuery::Family { .. } => Intent::Family,
            ResolvedQuery::Statistics => Intent::Statistics,
            ResolvedQuery::Raw { .. } => Intent::Raw,
        }
    }
}

const RAW_PREFIXES: [&str; 2] = ["sql:", "raw:"];

const STATS_TRIGGERS: [&str; 8] = [
    "how many",
    "statistics",
    "stats",
    "distribution",
    "overview",
    "count",
    "coverage",
    "total",
];

/// Words after which a place name is expected.
const PLACE_LEADS: [&str; 4] = ["in", "of", "from", "en"];

/// Words next to which a capitalized term reads as a family name.
const FAMILY_NOUNS: [&str; 7] = [
    "family", "families", "familia", "genus", "group", "languages", "lenguas",
];

/// Sentence-initial words that are never a family name, even before a family noun.
const QUESTION_LEADS: [&str; 16] = [
    "all", "any", "display", "do", "does", "find", "give", "how", "list", "many", "name",
    "show", "tell", "the", "what", "which",
];

pub struct QueryResolver {
    geo: &'static GeoResolver,
}

impl QueryResolver {
    pub fn new(geo: &'static GeoResolver) -> Self {
        Self { geo }
    }

    pub fn resolve(&self, question: &str) -> ResolvedQuery {
        let text = question.trim();
        if text.is_empty() {
            return ResolvedQuery::Statistics;
        }

        if let Some(query) = raw_query(text) {
            return ResolvedQuery::Raw { query };
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let family = find_family(&words);

        let masked: Vec<usize> = family
            .as_ref()
            .map(|FamilyMention { span, .. }| (span.0..span.1).collect())
            .unwrap_or_default();
        if let Some(mention) = self.geo.find_in(text, &masked) {
            return ResolvedQuery::Geographic {
                place_text: trim_punct(&mention.text).to_string(),
                place: mention.place,
            };
        }

        if let Some(FamilyMention { label, .. }) = family {
            return ResolvedQuery::Family { family: label };
        }

        if let Some(place_text) = unknown_place(&words) {
            let place = self.geo.resolve(&place_text);
            return ResolvedQuery::Geographic { place_text, place };
        }

        if let Some(family) = capitalized_family(&words) {
            return ResolvedQuery::Family { family };
        }

        let folded = format!(" {} ", fold_key(text));
        if STATS_TRIGGERS
            .iter()
            .any(|t| folded.contains(&format!(" {t} ")))
        {
            return ResolvedQuery::Statistics;
        }

        tracing::debug!(question = text, "no template matched, using statistics");
        ResolvedQuery::Statistics
    }
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::new(GeoResolver::global())
    }
}

/// Query text if the question is an explicit raw query.
fn raw_query(text: &str) -> Option<String> {
    for prefix in RAW_PREFIXES {
        let head = text.get(..prefix.len());
        if head.is_some_and(|h| h.eq_ignore_ascii_case(prefix)) {
            return Some(text[prefix.len()..].trim().to_string());
        }
    }
    let first = text.split_whitespace().next()?;
    // "Select the languages spoken in Spain" is a question, not SQL.
    (first.eq_ignore_ascii_case("select") && is_sql(text)).then(|| text.to_string())
}

/// "... in Atlantis?" -> "Atlantis": capitalized words after a place lead.
fn unknown_place(words: &[&str]) -> Option<String> {
    let lead = words
        .iter()
        .rposition(|w| PLACE_LEADS.contains(&w.to_lowercase().as_str()))?;
    let tail: Vec<&str> = words[lead + 1..]
        .iter()
        .map(|w| trim_punct(w))
        .take_while(|w| starts_upper(w))
        .collect();
    if tail.is_empty() {
        return None;
    }
    Some(tail.join(" "))
}

/// "the Kiranti family" / "family Kiranti" / "Kiranti languages".
fn capitalized_family(words: &[&str]) -> Option<String> {
    for (i, w) in words.iter().enumerate() {
        let noun = trim_punct(w).to_lowercase();
        if !FAMILY_NOUNS.contains(&noun.as_str()) {
            continue;
        }
        let before = i.checked_sub(1).map(|j| trim_punct(words[j]));
        let after = words.get(i + 1).map(|w| trim_punct(w));
        // The sentence-initial word is capitalized anyway; only take it
        // when it directly precedes the noun and is not a question word.
        let plausible = |c: &&str| {
            starts_upper(c) && (i > 1 || !QUESTION_LEADS.contains(&c.to_lowercase().as_str()))
        };
        if let Some(candidate) = before.filter(plausible) {
            return Some(candidate.to_string());
        }
        if let Some(candidate) = after.filter(|c| starts_upper(c)) {
            return Some(candidate.to_string());
        }
    }
    None
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn trim_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

//! Country and macroarea resolution for walsgraph
//!
//! Maps free text ("Germany", "deutschland", "DE", "Papunesia") onto the
//! identifiers stored on language nodes:
//! - ISO 3166-1 alpha-2 country codes
//! - one of the six WALS macroareas
//!
//! Resolution is a pure lookup over static tables built once per process.
//! There is no edit-distance matching: only exact aliases and word-bounded
//! partial matches are accepted, so short strings do not produce false hits.

pub mod countries;
pub mod macroarea;

pub use countries::{CountryEntry, COUNTRIES};
pub use macroarea::{Macroarea, UnknownMacroarea};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Alpha-2 country code, always upper case and always present in `COUNTRIES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(&'static str);

impl CountryCode {
    /// Look up a code in the country table.
    pub fn from_code(code: &str) -> Option<Self> {
        countries::by_code(code).map(|c| CountryCode(c.code))
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// English short name from the country table.
    pub fn name(self) -> &'static str {
        countries::by_code(self.0).map_or(self.0, |c| c.name)
    }
}

impl Serialize for CountryCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CountryCode::from_code(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown country code `{raw}`")))
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Outcome of resolving a place name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Place {
    Country(CountryCode),
    Macroarea(Macroarea),
    Unresolved,
}

impl Place {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Place::Unresolved)
    }

    pub fn country(&self) -> Option<CountryCode> {
        match self {
            Place::Country(c) => Some(*c),
            _ => None,
        }
    }
}

/// A place name found inside a longer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceMention {
    /// The words of the input that matched, as written.
    pub text: String,
    pub place: Place,
    /// Token range `[start, end)` of the match.
    pub span: (usize, usize),
}

/// Case-fold and normalize a place string for lookup.
///
/// Lower-cases, strips Latin diacritics, drops apostrophes and periods, turns
/// any other punctuation into a space, and collapses whitespace.
pub fn fold_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().flat_map(char::to_lowercase) {
        let ch = match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            '\'' | '’' | '.' => continue,
            c if c.is_alphanumeric() => c,
            _ => ' ',
        };
        out.push(ch);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest alias (in words) considered when scanning free text.
const MAX_ALIAS_WORDS: usize = 5;

/// Minimum folded length for partial (non-exact) country matches.
const MIN_PARTIAL_LEN: usize = 4;

/// Static lookup tables for countries and macroareas.
pub struct GeoResolver {
    /// folded alias -> index into `COUNTRIES` (names, aliases and codes)
    country_aliases: HashMap<String, usize>,
    /// folded country names and aliases in table order, for partial matches
    country_names: Vec<(String, usize)>,
    /// folded macroarea label/alias -> macroarea
    macroareas: HashMap<String, Macroarea>,
}

impl GeoResolver {
    pub fn new() -> Self {
        let mut country_aliases = HashMap::new();
        let mut country_names = Vec::new();
        for (idx, entry) in COUNTRIES.iter().enumerate() {
            country_aliases.insert(entry.code.to_ascii_lowercase(), idx);
            for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                let key = fold_key(name);
                // First entry wins on alias collisions.
                country_aliases.entry(key.clone()).or_insert(idx);
                country_names.push((key, idx));
            }
        }

        let mut macroareas = HashMap::new();
        for m in Macroarea::ALL {
            macroareas.insert(fold_key(m.label()), m);
            for alias in m.aliases() {
                macroareas.insert(fold_key(alias), m);
            }
        }

        Self {
            country_aliases,
            country_names,
            macroareas,
        }
    }

    /// Process-wide resolver; the tables are built on first use.
    pub fn global() -> &'static GeoResolver {
        static GLOBAL: OnceLock<GeoResolver> = OnceLock::new();
        GLOBAL.get_or_init(GeoResolver::new)
    }

    /// Resolve a whole string to a country or macroarea.
    ///
    /// Order: exact country alias or code, partial country name, macroarea,
    /// unresolved. Countries are tried before macroareas, so "Australia" is
    /// the country `AU`.
    pub fn resolve(&self, text: &str) -> Place {
        let key = fold_key(text);
        if key.is_empty() {
            return Place::Unresolved;
        }

        if let Some(&idx) = self.country_aliases.get(&key) {
            return Place::Country(CountryCode(COUNTRIES[idx].code));
        }

        if let Some(idx) = self.partial_country(&key) {
            return Place::Country(CountryCode(COUNTRIES[idx].code));
        }

        if let Some(&m) = self.macroareas.get(&key) {
            return Place::Macroarea(m);
        }
        let padded = format!(" {key} ");
        for m in Macroarea::ALL {
            if padded.contains(&format!(" {} ", fold_key(m.label()))) {
                return Place::Macroarea(m);
            }
        }

        Place::Unresolved
    }

    /// Resolve a dataset country field token to a code.
    ///
    /// Only exact aliases and codes are accepted here: dataset values are
    /// either codes or full names, never fragments.
    pub fn resolve_country_exact(&self, text: &str) -> Option<CountryCode> {
        let key = fold_key(text);
        self.country_aliases
            .get(&key)
            .map(|&idx| CountryCode(COUNTRIES[idx].code))
    }

    /// Partial match against country names, honoring word boundaries:
    /// - the text contains a full country name (longest name wins), or
    /// - a country name starts with the text (e.g. "papua").
    ///
    /// Ties go to the first entry in table order.
    fn partial_country(&self, key: &str) -> Option<usize> {
        if key.len() < MIN_PARTIAL_LEN {
            return None;
        }
        let padded = format!(" {key} ");

        let mut best: Option<(usize, usize)> = None; // (name_len, idx)
        for (name, idx) in &self.country_names {
            if name.len() < MIN_PARTIAL_LEN {
                continue;
            }
            if padded.contains(&format!(" {name} ")) {
                match best {
                    Some((len, _)) if len >= name.len() => {}
                    _ => best = Some((name.len(), *idx)),
                }
            }
        }
        if let Some((_, idx)) = best {
            return Some(idx);
        }

        self.country_names
            .iter()
            .find(|(name, _)| {
                name.starts_with(key) && name[key.len()..].starts_with(' ')
            })
            .map(|(_, idx)| *idx)
    }

    /// Scan free text for the longest place mention.
    ///
    /// Two-letter codes only count when written in upper case, so words like
    /// "in", "is" or "no" are never read as India, Iceland or Norway. Tokens
    /// whose index is in `masked` are never part of a match.
    pub fn find_in(&self, text: &str, masked: &[usize]) -> Option<PlaceMention> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let n = words.len();
        for width in (1..=MAX_ALIAS_WORDS.min(n)).rev() {
            for start in 0..=(n - width) {
                let end = start + width;
                if (start..end).any(|i| masked.contains(&i)) {
                    continue;
                }
                let phrase = words[start..end].join(" ");
                let key = fold_key(&phrase);
                if key.is_empty() {
                    continue;
                }

                if let Some(&idx) = self.country_aliases.get(&key) {
                    let entry = &COUNTRIES[idx];
                    let is_code = key.len() == 2 && key.eq_ignore_ascii_case(entry.code);
                    let written_upper = phrase
                        .trim_matches(|c: char| !c.is_alphanumeric())
                        .chars()
                        .all(|c| c.is_ascii_uppercase());
                    if !is_code || written_upper {
                        return Some(PlaceMention {
                            text: phrase,
                            place: Place::Country(CountryCode(entry.code)),
                            span: (start, end),
                        });
                    }
                }

                if let Some(&m) = self.macroareas.get(&key) {
                    return Some(PlaceMention {
                        text: phrase,
                        place: Place::Macroarea(m),
                        span: (start, end),
                    });
                }
            }
        }
        None
    }
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve with the process-wide tables.
pub fn resolve(text: &str) -> Place {
    GeoResolver::global().resolve(text)
}

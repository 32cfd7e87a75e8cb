//! Language family vocabulary for question resolution.
//!
//! Keys are folded with [`walsgraph_geo::fold_key`], so accents, case and
//! hyphens do not matter ("Románico", "romanico" and "ROMANICO" are one key).

use std::collections::HashMap;
use std::sync::OnceLock;
use walsgraph_geo::fold_key;

/// Variant spellings (including Spanish ones) and the label to search for.
pub const FAMILY_ALIASES: &[(&str, &str)] = &[
    ("indoeuropeo", "Indo-European"),
    ("indoeuropea", "Indo-European"),
    ("indoeuropean", "Indo-European"),
    ("indo europeo", "Indo-European"),
    ("romances", "Romance"),
    ("romanico", "Romance"),
    ("romanicas", "Romance"),
    ("romanic", "Romance"),
    ("germanico", "Germanic"),
    ("germanicas", "Germanic"),
    ("nigercongo", "Niger-Congo"),
    ("nigercongoese", "Niger-Congo"),
    ("afroasiatic", "Afro-Asiatic"),
    ("afroasiatico", "Afro-Asiatic"),
    ("sinotibetan", "Sino-Tibetan"),
    ("sino tibetano", "Sino-Tibetan"),
    ("austronesio", "Austronesian"),
    ("austronesico", "Austronesian"),
    ("semitico", "Semitic"),
    ("bantu", "Bantoid"),
    ("celtico", "Celtic"),
    ("eslavo", "Slavic"),
    ("eslavas", "Slavic"),
    ("slavonic", "Slavic"),
    ("uralico", "Uralic"),
    ("turkico", "Turkic"),
];

/// Family and genus labels as they appear in WALS.
pub const KNOWN_FAMILIES: &[&str] = &[
    "Afro-Asiatic",
    "Algic",
    "Altaic",
    "Arawakan",
    "Austro-Asiatic",
    "Austronesian",
    "Baltic",
    "Bantoid",
    "Basque",
    "Cariban",
    "Celtic",
    "Dravidian",
    "Eskimo-Aleut",
    "Germanic",
    "Hmong-Mien",
    "Indic",
    "Indo-European",
    "Iranian",
    "Kartvelian",
    "Khoisan",
    "Mayan",
    "Na-Dene",
    "Nakh-Daghestanian",
    "Niger-Congo",
    "Nilo-Saharan",
    "Oceanic",
    "Oto-Manguean",
    "Pama-Nyungan",
    "Panoan",
    "Penutian",
    "Quechuan",
    "Romance",
    "Salishan",
    "Semitic",
    "Sino-Tibetan",
    "Slavic",
    "Tai-Kadai",
    "Trans-New Guinea",
    "Tupian",
    "Turkic",
    "Uralic",
    "Uto-Aztecan",
];

/// Longest family label in words ("Trans-New Guinea" folds to three).
const MAX_FAMILY_WORDS: usize = 3;

/// A family name found in a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMention {
    /// Label to search for
    pub label: String,
    /// Token range `[start, end)` of the match
    pub span: (usize, usize),
}

fn table() -> &'static HashMap<String, &'static str> {
    static TABLE: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::new();
        for label in KNOWN_FAMILIES {
            map.insert(fold_key(label), *label);
        }
        for (alias, label) in FAMILY_ALIASES {
            map.insert(fold_key(alias), *label);
        }
        map
    })
}

/// Map a family name or alias to its canonical label, if it is known.
pub fn canonical_family(text: &str) -> Option<&'static str> {
    table().get(&fold_key(text)).copied()
}

/// The label to search for: the canonical one when known, else the text.
pub fn family_search_label(text: &str) -> String {
    canonical_family(text).map_or_else(|| text.trim().to_string(), str::to_string)
}

/// Find the longest known family mention among whitespace tokens.
pub fn find_family(words: &[&str]) -> Option<FamilyMention> {
    let n = words.len();
    for width in (1..=MAX_FAMILY_WORDS.min(n)).rev() {
        for start in 0..=(n - width) {
            let phrase = words[start..start + width].join(" ");
            if let Some(label) = canonical_family(&phrase) {
                return Some(FamilyMention {
                    label: label.to_string(),
                    span: (start, start + width),
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_spellings_map_to_labels() {
        assert_eq!(canonical_family("indoeuropeo"), Some("Indo-European"));
        assert_eq!(canonical_family("Románico"), Some("Romance"));
        assert_eq!(canonical_family("germánico"), Some("Germanic"));
        assert_eq!(canonical_family("austronesio"), Some("Austronesian"));
        assert_eq!(canonical_family("eslavo"), Some("Slavic"));
        assert_eq!(canonical_family("bantú"), Some("Bantoid"));
    }

    #[test]
    fn labels_match_case_and_hyphen_insensitively() {
        assert_eq!(canonical_family("indo-european"), Some("Indo-European"));
        assert_eq!(canonical_family("NIGER-CONGO"), Some("Niger-Congo"));
        assert_eq!(canonical_family("Klingon"), None);
        assert_eq!(family_search_label(" Kiranti "), "Kiranti");
    }

    #[test]
    fn finds_multi_word_families() {
        let words: Vec<&str> = "languages of the Trans-New Guinea family"
            .split_whitespace()
            .collect();
        let m = find_family(&words).unwrap();
        assert_eq!(m.label, "Trans-New Guinea");
        assert_eq!(m.span, (3, 5));
    }
}

//! The six WALS macroareas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Continental-scale region used by WALS to classify languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Macroarea {
    Africa,
    Eurasia,
    Australia,
    NorthAmerica,
    SouthAmerica,
    Papunesia,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown macroarea `{0}`")]
pub struct UnknownMacroarea(pub String);

impl Macroarea {
    pub const ALL: [Macroarea; 6] = [
        Macroarea::Africa,
        Macroarea::Eurasia,
        Macroarea::Australia,
        Macroarea::NorthAmerica,
        Macroarea::SouthAmerica,
        Macroarea::Papunesia,
    ];

    /// The label as it appears in the dataset and in stored nodes.
    pub const fn label(self) -> &'static str {
        match self {
            Macroarea::Africa => "Africa",
            Macroarea::Eurasia => "Eurasia",
            Macroarea::Australia => "Australia",
            Macroarea::NorthAmerica => "North America",
            Macroarea::SouthAmerica => "South America",
            Macroarea::Papunesia => "Papunesia",
        }
    }

    /// Extra spellings accepted besides the label itself.
    pub(crate) const fn aliases(self) -> &'static [&'static str] {
        match self {
            Macroarea::Africa => &[],
            Macroarea::Eurasia => &["europe", "asia"],
            Macroarea::Australia => &[],
            Macroarea::NorthAmerica => &["northamerica", "north american"],
            Macroarea::SouthAmerica => &["southamerica", "south american", "latin america"],
            Macroarea::Papunesia => &["papunesian"],
        }
    }

    /// Parse a dataset label (case-insensitive, tolerant of `-`/`_` separators).
    pub fn parse_label(s: &str) -> Result<Self, UnknownMacroarea> {
        let key = crate::fold_key(s);
        Self::ALL
            .into_iter()
            .find(|m| crate::fold_key(m.label()) == key)
            .ok_or_else(|| UnknownMacroarea(s.to_string()))
    }
}

impl fmt::Display for Macroarea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_labels() {
        assert_eq!(Macroarea::parse_label("Africa"), Ok(Macroarea::Africa));
        assert_eq!(
            Macroarea::parse_label("north america"),
            Ok(Macroarea::NorthAmerica)
        );
        assert_eq!(
            Macroarea::parse_label("South-America"),
            Ok(Macroarea::SouthAmerica)
        );
        assert!(Macroarea::parse_label("Atlantis").is_err());
        assert!(Macroarea::parse_label("").is_err());
    }

    #[test]
    fn labels_round_trip() {
        for m in Macroarea::ALL {
            assert_eq!(Macroarea::parse_label(m.label()), Ok(m));
        }
    }
}

//! Raw record -> canonical `LanguageNode`.

use crate::error::ValidationError;
use crate::record::LanguageRecord;
use walsgraph_geo::{CountryCode, GeoResolver, Macroarea};
use walsgraph_storage::{Coordinates, LanguageNode};

/// Spellings the dataset (and older exports of it) use for "no value".
const PLACEHOLDERS: [&str; 4] = ["nan", "none", "null", "n/a"];

/// A normalized node plus what the normalizer had to give up on.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub node: LanguageNode,
    /// At least one country of the record resolved to a code.
    pub geography_resolved: bool,
    /// Coordinates were present but unusable and were dropped.
    pub coordinates_dropped: bool,
}

/// Turns raw records into nodes.
pub struct Normalizer<'a> {
    resolver: &'a GeoResolver,
    require_name: bool,
}

impl<'a> Normalizer<'a> {
    pub fn new(resolver: &'a GeoResolver) -> Self {
        Self {
            resolver,
            require_name: false,
        }
    }

    /// Only accept records whose `Name` is set.
    pub fn require_name(mut self, yes: bool) -> Self {
        self.require_name = yes;
        self
    }

    pub fn normalize(&self, record: &LanguageRecord) -> Result<NormalizeOutcome, ValidationError> {
        let name = clean(record.name.as_deref());
        let wals_code = clean(record.wals_code.as_deref());
        let id = match (&name, &wals_code) {
            (Some(name), _) => name.clone(),
            (None, Some(code)) if !self.require_name => code.clone(),
            _ => return Err(ValidationError::MissingIdentifier),
        };

        let mut node = LanguageNode::new(id);
        node.family = clean(record.family.as_deref()).unwrap_or_default();
        node.genus = clean(record.genus.as_deref()).unwrap_or_default();
        node.subfamily = clean(record.subfamily.as_deref());
        node.iso_code = clean(record.iso_code.as_deref());
        node.wals_code = wals_code;

        node.macroarea = clean(record.macroarea.as_deref()).and_then(|label| {
            match Macroarea::parse_label(&label) {
                Ok(m) => Some(m),
                Err(err) => {
                    tracing::debug!(id = %node.id, error = %err, "dropping macroarea");
                    None
                }
            }
        });

        node.countries = self.resolve_countries(record.country_ids.as_deref());
        node.country_id = node.countries.first().copied();
        let geography_resolved = node.country_id.is_some();

        let mut coordinates_dropped = false;
        match parse_coordinates(record.latitude.as_deref(), record.longitude.as_deref()) {
            Ok(coords) => node.coordinates = coords,
            Err(err) => {
                tracing::debug!(id = %node.id, error = %err, "dropping coordinates");
                coordinates_dropped = true;
            }
        }

        Ok(NormalizeOutcome {
            node,
            geography_resolved,
            coordinates_dropped,
        })
    }

    /// Resolve a `Country_ID` field that may list several codes or names.
    ///
    /// The whole field is tried first (so "United States" stays one name),
    /// then each comma/semicolon part, then each word of a part.
    fn resolve_countries(&self, raw: Option<&str>) -> Vec<CountryCode> {
        let Some(raw) = clean(raw) else {
            return Vec::new();
        };
        if let Some(code) = self.resolver.resolve_country_exact(&raw) {
            return vec![code];
        }

        let mut out: Vec<CountryCode> = Vec::new();
        let mut push = |code: CountryCode| {
            if !out.contains(&code) {
                out.push(code);
            }
        };
        for part in raw.split([',', ';', '/']).map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(code) = self.resolver.resolve_country_exact(part) {
                push(code);
                continue;
            }
            for token in part.split_whitespace() {
                match self.resolver.resolve_country_exact(token) {
                    Some(code) => push(code),
                    None => tracing::debug!(token, "unresolved country token"),
                }
            }
        }
        out
    }
}

/// Trimmed value, or `None` for empty text and placeholders like `nan`.
pub fn clean(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty()
        || PLACEHOLDERS
            .iter()
            .any(|p| value.eq_ignore_ascii_case(p))
    {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a coordinate pair.
///
/// Both absent is `Ok(None)`. Anything else that is not a pair of in-range
/// numbers is `InvalidCoordinates`.
pub fn parse_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Option<Coordinates>, ValidationError> {
    let (lat, lon) = (clean(latitude), clean(longitude));
    if lat.is_none() && lon.is_none() {
        return Ok(None);
    }
    let invalid = || ValidationError::InvalidCoordinates {
        latitude: lat.clone().unwrap_or_default(),
        longitude: lon.clone().unwrap_or_default(),
    };
    let (Some(lat_s), Some(lon_s)) = (&lat, &lon) else {
        return Err(invalid());
    };
    let (Ok(lat_v), Ok(lon_v)) = (lat_s.parse::<f64>(), lon_s.parse::<f64>()) else {
        return Err(invalid());
    };
    Coordinates::new(lat_v, lon_v).map(Some).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> LanguageRecord {
        LanguageRecord {
            name: Some(name.to_string()),
            ..LanguageRecord::default()
        }
    }

    fn codes(node: &LanguageNode) -> Vec<&'static str> {
        node.countries.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn name_is_the_identifier_with_code_fallback() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Basque");
        rec.wals_code = Some("bsq".into());
        assert_eq!(n.normalize(&rec).unwrap().node.id, "Basque");

        rec.name = Some("nan".into());
        assert_eq!(n.normalize(&rec).unwrap().node.id, "bsq");

        let strict = Normalizer::new(GeoResolver::global()).require_name(true);
        assert_eq!(strict.normalize(&rec), Err(ValidationError::MissingIdentifier));

        rec.wals_code = None;
        assert_eq!(n.normalize(&rec), Err(ValidationError::MissingIdentifier));
    }

    #[test]
    fn placeholders_read_as_absent() {
        assert_eq!(clean(Some("  NaN ")), None);
        assert_eq!(clean(Some("None")), None);
        assert_eq!(clean(Some("")), None);
        assert_eq!(clean(None), None);
        assert_eq!(clean(Some(" Romance ")), Some("Romance".to_string()));
    }

    #[test]
    fn multiple_countries_keep_order_and_dedupe() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Basque");
        rec.country_ids = Some("ES FR ES".into());
        let out = n.normalize(&rec).unwrap();
        assert_eq!(codes(&out.node), vec!["ES", "FR"]);
        assert_eq!(out.node.country_id.map(|c| c.as_str()), Some("ES"));
        assert!(out.geography_resolved);
    }

    #[test]
    fn full_country_names_resolve() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Navajo");
        rec.country_ids = Some("United States".into());
        assert_eq!(codes(&n.normalize(&rec).unwrap().node), vec!["US"]);

        rec.country_ids = Some("Indonesia, Papua New Guinea".into());
        assert_eq!(codes(&n.normalize(&rec).unwrap().node), vec!["ID", "PG"]);
    }

    #[test]
    fn unresolved_country_is_not_an_error() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Mystery");
        rec.country_ids = Some("Atlantis".into());
        let out = n.normalize(&rec).unwrap();
        assert_eq!(out.node.country_id, None);
        assert!(!out.geography_resolved);
    }

    #[test]
    fn bad_coordinates_are_dropped_not_fatal() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Spanish");
        rec.latitude = Some("140".into());
        rec.longitude = Some("-4".into());
        let out = n.normalize(&rec).unwrap();
        assert_eq!(out.node.coordinates, None);
        assert!(out.coordinates_dropped);

        rec.latitude = Some("40.0".into());
        let out = n.normalize(&rec).unwrap();
        assert_eq!(out.node.coordinates, Coordinates::new(40.0, -4.0));
        assert!(!out.coordinates_dropped);
    }

    #[test]
    fn coordinate_parsing_cases() {
        assert_eq!(parse_coordinates(None, Some("nan")), Ok(None));
        assert!(parse_coordinates(Some("12"), None).is_err());
        assert!(parse_coordinates(Some("north"), Some("3")).is_err());
        assert!(parse_coordinates(Some("0"), Some("181")).is_err());
        assert!(parse_coordinates(Some("-90"), Some("180")).unwrap().is_some());
    }

    #[test]
    fn unknown_macroarea_is_dropped() {
        let n = Normalizer::new(GeoResolver::global());
        let mut rec = record("Spanish");
        rec.macroarea = Some("Eurasia".into());
        assert_eq!(n.normalize(&rec).unwrap().node.macroarea, Some(Macroarea::Eurasia));
        rec.macroarea = Some("Atlantis".into());
        assert_eq!(n.normalize(&rec).unwrap().node.macroarea, None);
    }
}

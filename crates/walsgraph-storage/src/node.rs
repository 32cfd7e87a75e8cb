//! The canonical stored language node and its attribute encoding.

use serde::Serialize;
use walsgraph_geo::{CountryCode, Macroarea};
use walsgraph_pathdb::EntityView;

/// Entity type under which every language node is stored.
pub const LANGUAGE_TYPE: &str = "Language";

/// Attribute names used on stored `Language` entities.
pub mod attr {
    pub const ID: &str = "id";
    pub const FAMILY: &str = "family";
    pub const GENUS: &str = "genus";
    pub const SUBFAMILY: &str = "subfamily";
    pub const COUNTRY_ID: &str = "country_id";
    pub const COUNTRIES: &str = "countries";
    pub const MACROAREA: &str = "macroarea";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const ISO_CODE: &str = "iso_code";
    pub const WALS_CODE: &str = "wals_code";

    /// Every attribute, in display order.
    pub const ALL: [&str; 11] = [
        ID, FAMILY, GENUS, SUBFAMILY, COUNTRY_ID, COUNTRIES, MACROAREA, LATITUDE, LONGITUDE,
        ISO_CODE, WALS_CODE,
    ];
}

/// A validated (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Returns `None` unless latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// One language as stored in the graph.
///
/// `id` is the upsert key. Every other field is optional; empty strings stand
/// for "unknown" on the classification fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageNode {
    pub id: String,
    pub family: String,
    pub genus: String,
    pub subfamily: Option<String>,
    /// First resolved country of the record.
    pub country_id: Option<CountryCode>,
    /// Every resolved country of the record, `country_id` first.
    pub countries: Vec<CountryCode>,
    pub macroarea: Option<Macroarea>,
    pub coordinates: Option<Coordinates>,
    pub iso_code: Option<String>,
    pub wals_code: Option<String>,
}

impl LanguageNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: String::new(),
            genus: String::new(),
            subfamily: None,
            country_id: None,
            countries: Vec::new(),
            macroarea: None,
            coordinates: None,
            iso_code: None,
            wals_code: None,
        }
    }

    /// Attribute pairs to store. Empty and absent fields are not stored.
    pub fn to_attrs(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![(attr::ID, self.id.clone())];
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                out.push((key, v));
            }
        };
        push(attr::FAMILY, Some(self.family.clone()));
        push(attr::GENUS, Some(self.genus.clone()));
        push(attr::SUBFAMILY, self.subfamily.clone());
        push(attr::COUNTRY_ID, self.country_id.map(|c| c.as_str().to_string()));
        push(
            attr::COUNTRIES,
            Some(
                self.countries
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        );
        push(attr::MACROAREA, self.macroarea.map(|m| m.label().to_string()));
        push(attr::LATITUDE, self.coordinates.map(|c| c.latitude.to_string()));
        push(attr::LONGITUDE, self.coordinates.map(|c| c.longitude.to_string()));
        push(attr::ISO_CODE, self.iso_code.clone());
        push(attr::WALS_CODE, self.wals_code.clone());
        out
    }

    /// Rebuild a node from a stored entity. Unparseable optional values read
    /// back as absent.
    pub fn from_view(view: &EntityView) -> Option<Self> {
        let get = |key: &str| view.attrs.get(key).filter(|v| !v.is_empty()).cloned();
        let id = get(attr::ID)?;

        let coordinates = match (get(attr::LATITUDE), get(attr::LONGITUDE)) {
            (Some(lat), Some(lon)) => match (lat.parse(), lon.parse()) {
                (Ok(lat), Ok(lon)) => Coordinates::new(lat, lon),
                _ => None,
            },
            _ => None,
        };

        Some(Self {
            family: get(attr::FAMILY).unwrap_or_default(),
            genus: get(attr::GENUS).unwrap_or_default(),
            subfamily: get(attr::SUBFAMILY),
            country_id: get(attr::COUNTRY_ID).and_then(|c| CountryCode::from_code(&c)),
            countries: get(attr::COUNTRIES)
                .map(|s| s.split_whitespace().filter_map(CountryCode::from_code).collect())
                .unwrap_or_default(),
            macroarea: get(attr::MACROAREA).and_then(|m| Macroarea::parse_label(&m).ok()),
            coordinates,
            iso_code: get(attr::ISO_CODE),
            wals_code: get(attr::WALS_CODE),
            id,
        })
    }
}

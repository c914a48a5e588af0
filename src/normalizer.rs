//! Schema normalization
//!
//! Upstream place records do not agree on field names or types. Each source
//! gets a [`SourceAdapter`] that maps a raw JSON record onto a [`Candidate`]
//! or reports why the record is unusable. Alias lists are static tables,
//! tried in order; the first alias holding a usable value wins.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::{Candidate, Category};

/// Why a raw record could not become a candidate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unusable {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{0}' is out of range")]
    OutOfRange(&'static str),
}

/// Ordered alias names per logical field
#[derive(Debug)]
pub struct FieldAliases {
    pub id: &'static [&'static str],
    pub name: &'static [&'static str],
    pub lat: &'static [&'static str],
    pub lng: &'static [&'static str],
    pub category: &'static [&'static str],
    pub distance: &'static [&'static str],
    pub rating: &'static [&'static str],
    pub address: &'static [&'static str],
    pub ai_score: &'static [&'static str],
}

/// Kakao Local `documents[]` entries (x is longitude, y is latitude)
pub static KAKAO_ALIASES: FieldAliases = FieldAliases {
    id: &["id", "placeId", "place_id"],
    name: &["place_name", "name"],
    lat: &["y", "latitude", "lat"],
    lng: &["x", "longitude", "lng"],
    category: &["category_group_code"],
    distance: &["distance", "distanceMeters", "distance_meters"],
    rating: &["rating"],
    address: &["address_name", "road_address_name", "address"],
    ai_score: &[],
};

/// Our own serialized shape plus the common alternates seen in the wild
pub static CANONICAL_ALIASES: FieldAliases = FieldAliases {
    id: &["id", "placeId", "place_id"],
    name: &["name", "place_name", "title"],
    lat: &["lat", "latitude", "y"],
    lng: &["lng", "longitude", "lon", "x"],
    category: &["category", "categoryName", "category_name", "category_group_code"],
    distance: &["distanceMeters", "distance_meters", "distance"],
    rating: &["rating", "stars"],
    address: &[
        "address",
        "roadAddressName",
        "addressName",
        "road_address_name",
        "address_name",
    ],
    ai_score: &["aiScore", "ai_score", "score"],
};

/// Maps one source's raw records onto canonical candidates
pub trait SourceAdapter: Send + Sync {
    /// Name used in logs
    fn source_name(&self) -> &str;

    /// Convert `record`. `hint` is the category the record was searched
    /// under and is used when the record does not say otherwise.
    ///
    /// Must never panic, whatever the shape of `record`.
    fn normalize(&self, record: &Value, hint: Category) -> Result<Candidate, Unusable>;
}

/// Alias-table driven adapter
#[derive(Debug, Clone, Copy)]
pub struct AliasAdapter {
    source: &'static str,
    aliases: &'static FieldAliases,
}

impl AliasAdapter {
    #[must_use]
    pub const fn new(source: &'static str, aliases: &'static FieldAliases) -> Self {
        Self { source, aliases }
    }

    /// Adapter for Kakao Local search documents
    #[must_use]
    pub const fn kakao() -> Self {
        Self::new("kakao", &KAKAO_ALIASES)
    }

    /// Adapter for already canonical (or nearly canonical) records
    #[must_use]
    pub const fn canonical() -> Self {
        Self::new("canonical", &CANONICAL_ALIASES)
    }
}

impl SourceAdapter for AliasAdapter {
    fn source_name(&self) -> &str {
        self.source
    }

    fn normalize(&self, record: &Value, hint: Category) -> Result<Candidate, Unusable> {
        let obj = record.as_object().ok_or(Unusable::NotAnObject)?;
        let a = self.aliases;

        let id = first(obj, a.id, as_id).ok_or(Unusable::Missing("id"))?;
        let name = first(obj, a.name, as_text).ok_or(Unusable::Missing("name"))?;
        let lat = first(obj, a.lat, as_number).ok_or(Unusable::Missing("lat"))?;
        let lng = first(obj, a.lng, as_number).ok_or(Unusable::Missing("lng"))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(Unusable::OutOfRange("lat"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(Unusable::OutOfRange("lng"));
        }

        let category = first(obj, a.category, as_text)
            .map_or(hint, |raw| resolve_category(&raw, hint));

        Ok(Candidate {
            id,
            name,
            category,
            lat,
            lng,
            distance_meters: first(obj, a.distance, as_meters),
            rating: first(obj, a.rating, as_number),
            address: first(obj, a.address, as_text),
            ai_score: first(obj, a.ai_score, as_number),
        })
    }
}

/// Normalize a batch, silently dropping unusable records
pub fn normalize_all(adapter: &dyn SourceAdapter, records: &[Value], hint: Category) -> Vec<Candidate> {
    records
        .iter()
        .filter_map(|record| match adapter.normalize(record, hint) {
            Ok(candidate) => Some(candidate),
            Err(reason) => {
                debug!(source = adapter.source_name(), %reason, "Dropping unusable record");
                None
            }
        })
        .collect()
}

/// Category names win outright. A provider code shared by several
/// categories resolves to the hint when the hint searches that code.
fn resolve_category(raw: &str, hint: Category) -> Category {
    let raw = raw.trim();
    if let Some(category) = Category::from_name(raw) {
        return category;
    }
    let code = raw.to_ascii_uppercase();
    if hint.owns_search_code(&code) {
        return hint;
    }
    code.parse::<Category>().unwrap_or(hint)
}

fn first<T>(obj: &Map<String, Value>, names: &[&str], extract: fn(&Value) -> Option<T>) -> Option<T> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find_map(extract)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => as_text(other),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn as_meters(value: &Value) -> Option<u32> {
    let meters = as_number(value)?.round();
    if meters < 0.0 || meters > f64::from(u32::MAX) {
        return None;
    }
    // Range checked above.
    Some(meters as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn kakao_doc() -> Value {
        json!({
            "id": "26338954",
            "place_name": "Cafe Layered",
            "category_group_code": "CE7",
            "x": "126.9849",
            "y": "37.5796",
            "address_name": "Seoul Jongno-gu Gahoe-dong 1",
            "distance": "412",
            "place_url": "http://place.map.kakao.com/26338954"
        })
    }

    #[test]
    fn test_kakao_document() {
        let c = AliasAdapter::kakao()
            .normalize(&kakao_doc(), Category::Cafe)
            .unwrap();
        assert_eq!(c.id, "26338954");
        assert_eq!(c.name, "Cafe Layered");
        assert_eq!(c.category, Category::Cafe);
        assert!((c.lat - 37.5796).abs() < 1e-9);
        assert!((c.lng - 126.9849).abs() < 1e-9);
        assert_eq!(c.distance_meters, Some(412));
        assert_eq!(c.rating, None);
        assert_eq!(c.address.as_deref(), Some("Seoul Jongno-gu Gahoe-dong 1"));
        assert_eq!(c.ai_score, None);
    }

    #[rstest]
    #[case("id")]
    #[case("place_name")]
    #[case("x")]
    #[case("y")]
    fn test_missing_required_field(#[case] field: &str) {
        let mut doc = kakao_doc();
        doc.as_object_mut().unwrap().remove(field);
        assert!(AliasAdapter::kakao().normalize(&doc, Category::Cafe).is_err());
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!([1, 2, 3]))]
    #[case(json!("place"))]
    #[case(json!({"id": {}, "name": [], "lat": true}))]
    #[case(json!({"id": "1", "name": "x", "lat": "north", "lng": 1}))]
    fn test_arbitrary_shapes_are_unusable(#[case] record: Value) {
        assert!(AliasAdapter::canonical().normalize(&record, Category::Food).is_err());
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let record = json!({"id": "1", "name": "x", "lat": 120.0, "lng": 10.0});
        assert_eq!(
            AliasAdapter::canonical().normalize(&record, Category::Food),
            Err(Unusable::OutOfRange("lat"))
        );
    }

    #[test]
    fn test_alias_priority_first_usable_wins() {
        let record = json!({
            "id": 42,
            "name": "  ",
            "place_name": "Fallback Name",
            "lat": 37.0,
            "lng": 127.0,
            "distanceMeters": null,
            "distance": "88.6"
        });
        let c = AliasAdapter::canonical().normalize(&record, Category::Food).unwrap();
        assert_eq!(c.id, "42");
        assert_eq!(c.name, "Fallback Name");
        assert_eq!(c.distance_meters, Some(89));
    }

    #[test]
    fn test_optional_fields_default_to_absent() {
        let record = json!({"id": "1", "name": "x", "lat": 1.0, "lng": 2.0, "distance": -5, "rating": "n/a"});
        let c = AliasAdapter::canonical().normalize(&record, Category::Stay).unwrap();
        assert_eq!(c.distance_meters, None);
        assert_eq!(c.rating, None);
        assert_eq!(c.address, None);
        assert_eq!(c.category, Category::Stay);
    }

    #[rstest]
    #[case("AT4", Category::Healing, Category::Healing)]
    #[case("AT4", Category::Food, Category::Photo)]
    #[case("FD6", Category::Cafe, Category::Food)]
    #[case("PHOTO", Category::Healing, Category::Photo)]
    #[case("ZZ9", Category::Shopping, Category::Shopping)]
    fn test_category_resolution(#[case] raw: &str, #[case] hint: Category, #[case] expected: Category) {
        assert_eq!(resolve_category(raw, hint), expected);
    }

    #[test]
    fn test_canonical_record_is_idempotent() {
        let original = Candidate::new("p-1", "Bukchon Hanok", Category::Culture, 37.58, 126.98)
            .with_distance(950)
            .with_rating(4.2)
            .with_address("Gyedong-gil")
            .with_ai_score(0.73);
        let record = serde_json::to_value(&original).unwrap();
        let again = AliasAdapter::canonical().normalize(&record, Category::Food).unwrap();
        assert_eq!(again, original);

        let thrice = AliasAdapter::canonical()
            .normalize(&serde_json::to_value(&again).unwrap(), Category::Food)
            .unwrap();
        assert_eq!(thrice, original);
    }

    #[test]
    fn test_normalize_all_drops_bad_records() {
        let records = vec![kakao_doc(), json!({"place_name": "no id"}), json!(7)];
        let out = normalize_all(&AliasAdapter::kakao(), &records, Category::Cafe);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "26338954");
    }
}

//! The canonical in-memory shape both input formats are lowered into.

use foundation::{CoordinatePair, LatLng};
use serde_json::{Map, Value};

use crate::error::{SourceError, describe_json};
use crate::wkt::{WktOptions, parse_wkt_polygon};
use crate::{geojson, records};

/// An outer ring as read from the source, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRing {
    /// Projected grid `[x, y]` metres. Unreadable vertices are `[NaN, NaN]`.
    Grid(Vec<CoordinatePair>),
    /// Already geographic, in `[lat, lng]` order.
    Geographic(Vec<LatLng>),
}

impl SourceRing {
    pub fn len(&self) -> usize {
        match self {
            SourceRing::Grid(points) => points.len(),
            SourceRing::Geographic(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceGeometry {
    Polygon(SourceRing),
    /// Any geometry type other than `Polygon`, by its GeoJSON type name.
    Unsupported(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    /// Position in the source, for diagnostics.
    pub index: usize,
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: SourceGeometry,
}

/// Raw input, classified once at the ingestion boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometrySource {
    /// A FeatureCollection, or a GeometryCollection to be wrapped into one.
    GeoJson(Value),
    /// Inline site records `{ id, points?, shape?, ... }`.
    Records(Vec<Value>),
    /// A bare WKT `POLYGON` making up the whole request.
    Wkt(String),
}

impl RawGeometrySource {
    /// Parses JSON text. Text starting with `POLYGON` is taken as bare WKT.
    pub fn from_json_str(payload: &str) -> Result<Self, SourceError> {
        let trimmed = payload.trim();
        if looks_like_wkt(trimmed) {
            return Ok(Self::Wkt(trimmed.to_string()));
        }
        let value: Value = serde_json::from_str(trimmed)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        if value.as_object().is_some_and(geojson::is_collection) {
            return Ok(Self::GeoJson(value));
        }
        match value {
            Value::Array(items) => Ok(Self::Records(items)),
            Value::String(text) if looks_like_wkt(text.trim()) => {
                Ok(Self::Wkt(text.trim().to_string()))
            }
            other => Err(SourceError::Unrecognized {
                found: describe_json(&other),
            }),
        }
    }

    /// Lowers the source into features. Only request-level problems are
    /// errors; unreadable individual features are logged and skipped.
    ///
    /// A bare WKT request is a single feature, so a malformed ring fails the
    /// whole request instead of yielding an empty result.
    pub fn into_features(self) -> Result<Vec<SourceFeature>, SourceError> {
        match self {
            RawGeometrySource::GeoJson(value) => geojson::read_features(value),
            RawGeometrySource::Records(items) => Ok(records::read_records(&items)),
            RawGeometrySource::Wkt(text) => {
                let ring = parse_wkt_polygon(&text, WktOptions::default())?
                    .into_iter()
                    .map(|[lng, lat]| LatLng::new(lat, lng))
                    .collect();
                Ok(vec![SourceFeature {
                    index: 0,
                    id: None,
                    properties: Map::new(),
                    geometry: SourceGeometry::Polygon(SourceRing::Geographic(ring)),
                }])
            }
        }
    }
}

fn looks_like_wkt(text: &str) -> bool {
    text.get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("POLYGON"))
}

#[cfg(test)]
mod tests {
    use super::{RawGeometrySource, SourceGeometry, SourceRing};
    use crate::{SourceError, WktError};
    use serde_json::json;

    #[test]
    fn arrays_are_records_and_collections_are_geojson() {
        let records = RawGeometrySource::from_value(json!([{ "id": 1 }])).unwrap();
        assert!(matches!(records, RawGeometrySource::Records(ref items) if items.len() == 1));

        let fc = json!({ "type": "FeatureCollection", "features": [] });
        assert!(matches!(
            RawGeometrySource::from_value(fc).unwrap(),
            RawGeometrySource::GeoJson(_)
        ));

        let gc = json!({ "type": "GeometryCollection", "geometries": [] });
        assert!(matches!(
            RawGeometrySource::from_value(gc).unwrap(),
            RawGeometrySource::GeoJson(_)
        ));
    }

    #[test]
    fn bare_wkt_becomes_a_single_feature() {
        let source =
            RawGeometrySource::from_json_str("polygon((17 48, 17.1 48, 17.1 48.1, 17 48))").unwrap();
        let features = source.into_features().unwrap();
        assert_eq!(features.len(), 1);
        match &features[0].geometry {
            SourceGeometry::Polygon(SourceRing::Geographic(points)) => assert_eq!(points.len(), 3),
            other => panic!("unexpected geometry {other:?}"),
        }

        let quoted = RawGeometrySource::from_value(json!("POLYGON((0 0, 1 0, 1 1))")).unwrap();
        assert!(matches!(quoted, RawGeometrySource::Wkt(_)));
    }

    #[test]
    fn malformed_bare_wkt_fails_the_request() {
        for text in [
            "POLYGON((17 48, 17.1 abc, 17.1 48.1))",
            "POLYGON 17 48",
            "POLYGONAL nonsense",
        ] {
            let source = RawGeometrySource::from_json_str(text).unwrap();
            assert!(
                matches!(
                    source.into_features(),
                    Err(SourceError::Wkt(WktError::Malformed(_)))
                ),
                "{text:?}"
            );
        }
    }

    #[test]
    fn unreadable_input_is_a_request_level_error() {
        assert!(matches!(
            RawGeometrySource::from_json_str("{ not json"),
            Err(SourceError::Json(_))
        ));
        assert!(matches!(
            RawGeometrySource::from_value(json!({ "type": "Point", "coordinates": [0, 0] })),
            Err(SourceError::Unrecognized { .. })
        ));
        assert!(matches!(
            RawGeometrySource::from_value(json!(42)),
            Err(SourceError::Unrecognized { .. })
        ));
    }
}

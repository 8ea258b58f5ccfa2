//! Reader for shapefile-derived GeoJSON in projected grid coordinates.
//!
//! Parsing is lenient per feature: anything that is not a usable polygon is
//! still returned, tagged, so the normalizer can report it in one place.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{SourceError, describe_json};
use crate::source::{SourceFeature, SourceGeometry, SourceRing};
use foundation::CoordinatePair;

/// Property injected into features synthesized from a GeometryCollection.
pub const SOURCE_INDEX_KEY: &str = "sourceIndex";

const UNREADABLE_VERTEX: CoordinatePair = [f64::NAN, f64::NAN];

pub fn is_collection(obj: &Map<String, Value>) -> bool {
    obj.get("features").is_some_and(Value::is_array)
        || (obj.get("type").and_then(Value::as_str) == Some("GeometryCollection")
            && obj.get("geometries").is_some_and(Value::is_array))
}

/// Rewrites a GeometryCollection into a FeatureCollection, wrapping geometry
/// `i` as a Feature with `sourceIndex = "geom-<i>"`. Other values pass
/// through unchanged.
pub fn wrap_geometry_collection(value: Value) -> Value {
    let Value::Object(mut obj) = value else {
        return value;
    };
    let is_gc = !obj.get("features").is_some_and(Value::is_array)
        && obj.get("type").and_then(Value::as_str) == Some("GeometryCollection");
    if !is_gc {
        return Value::Object(obj);
    }
    let Some(Value::Array(geometries)) = obj.remove("geometries") else {
        return Value::Object(obj);
    };

    let features = geometries
        .into_iter()
        .enumerate()
        .map(|(i, geometry)| {
            let mut properties = Map::new();
            properties.insert(SOURCE_INDEX_KEY.to_string(), Value::String(format!("geom-{i}")));
            let mut feature = Map::new();
            feature.insert("type".to_string(), Value::String("Feature".to_string()));
            feature.insert("properties".to_string(), Value::Object(properties));
            feature.insert("geometry".to_string(), geometry);
            Value::Object(feature)
        })
        .collect();

    let mut root = Map::new();
    root.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    root.insert("features".to_string(), Value::Array(features));
    Value::Object(root)
}

pub fn read_features(value: Value) -> Result<Vec<SourceFeature>, SourceError> {
    let value = wrap_geometry_collection(value);
    let found = describe_json(&value);
    let Value::Object(mut root) = value else {
        return Err(SourceError::NotGeoJson { found });
    };
    let Some(Value::Array(raw_features)) = root.remove("features") else {
        return Err(SourceError::NotGeoJson { found });
    };

    let mut features = Vec::with_capacity(raw_features.len());
    for (index, raw) in raw_features.into_iter().enumerate() {
        let Value::Object(mut obj) = raw else {
            warn!(index, "skipping GeoJSON feature that is not an object");
            continue;
        };

        let id = obj.get("id").and_then(json_id);
        let properties = match obj.remove("properties") {
            Some(Value::Object(props)) => props,
            _ => Map::new(),
        };
        let geometry = obj
            .get("geometry")
            .map(|g| read_geometry(index, g))
            .unwrap_or(SourceGeometry::Missing);

        features.push(SourceFeature {
            index,
            id,
            properties,
            geometry,
        });
    }
    debug!(count = features.len(), "read GeoJSON features");
    Ok(features)
}

/// Identifier text for a JSON string or number; blank strings are absent.
pub fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_geometry(index: usize, value: &Value) -> SourceGeometry {
    let Some(obj) = value.as_object() else {
        return SourceGeometry::Missing;
    };
    match obj.get("type").and_then(Value::as_str) {
        Some("Polygon") => {}
        Some(other) => return SourceGeometry::Unsupported(other.to_string()),
        None => return SourceGeometry::Missing,
    }

    // Only the outer ring is honored.
    let outer = obj
        .get("coordinates")
        .and_then(Value::as_array)
        .and_then(|rings| rings.first())
        .and_then(Value::as_array);
    let Some(outer) = outer else {
        return SourceGeometry::Polygon(SourceRing::Grid(Vec::new()));
    };

    let ring = outer
        .iter()
        .map(|vertex| {
            read_vertex(vertex).unwrap_or_else(|| {
                debug!(index, %vertex, "unreadable grid vertex");
                UNREADABLE_VERTEX
            })
        })
        .collect();
    SourceGeometry::Polygon(SourceRing::Grid(ring))
}

fn read_vertex(value: &Value) -> Option<CoordinatePair> {
    let arr = value.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    Some([arr[0].as_f64()?, arr[1].as_f64()?])
}

#[cfg(test)]
mod tests {
    use super::{read_features, wrap_geometry_collection};
    use crate::source::{SourceGeometry, SourceRing};
    use crate::SourceError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn square() -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [-577000.0, -1281000.0],
                [-576900.0, -1281000.0],
                [-576900.0, -1280900.0],
                [-577000.0, -1280900.0],
                [-577000.0, -1281000.0]
            ]]
        })
    }

    #[test]
    fn geometry_collection_matches_hand_built_feature_collection() {
        let gc = json!({
            "type": "GeometryCollection",
            "geometries": [square(), { "type": "Point", "coordinates": [0.0, 0.0] }]
        });
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "sourceIndex": "geom-0" }, "geometry": square() },
                {
                    "type": "Feature",
                    "properties": { "sourceIndex": "geom-1" },
                    "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                }
            ]
        });
        assert_eq!(wrap_geometry_collection(gc.clone()), fc);
        assert_eq!(read_features(gc).unwrap(), read_features(fc).unwrap());
    }

    #[test]
    fn features_are_tagged_by_geometry_kind() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": 7, "properties": { "SPEC_CISLO": "BF-1" }, "geometry": square() },
                { "type": "Feature", "properties": {}, "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "properties": null, "geometry": null },
                "garbage"
            ]
        });
        let features = read_features(fc).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].id.as_deref(), Some("7"));
        assert_eq!(features[0].properties["SPEC_CISLO"], json!("BF-1"));
        assert!(matches!(
            &features[0].geometry,
            SourceGeometry::Polygon(SourceRing::Grid(ring)) if ring.len() == 5
        ));
        assert_eq!(
            features[1].geometry,
            SourceGeometry::Unsupported("LineString".to_string())
        );
        assert_eq!(features[2].geometry, SourceGeometry::Missing);
        assert!(features[2].properties.is_empty());
    }

    #[test]
    fn unreadable_vertices_become_nan_placeholders() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [[[1.0, 2.0], ["x", 3.0], [4.0]]] }
            }]
        });
        let features = read_features(fc).unwrap();
        let SourceGeometry::Polygon(SourceRing::Grid(ring)) = &features[0].geometry else {
            panic!("expected a grid polygon");
        };
        assert_eq!(ring[0], [1.0, 2.0]);
        assert!(ring[1][0].is_nan() && ring[2][1].is_nan());
    }

    #[test]
    fn non_collections_are_rejected() {
        assert!(matches!(
            read_features(json!({ "type": "Feature" })),
            Err(SourceError::NotGeoJson { .. })
        ));
        assert!(matches!(
            read_features(json!([])),
            Err(SourceError::NotGeoJson { .. })
        ));
    }
}

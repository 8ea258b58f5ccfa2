//! Renderer-facing GeoJSON for an assembled `FeatureSet`.
//!
//! Output coordinates are `[lng, lat]` and rings are explicitly closed, as
//! GeoJSON requires.

use serde_json::{Map, Value};

use crate::assemble::{FeatureSet, StyledFeature};
use crate::markers::MarkerRecord;
use foundation::LatLng;

impl FeatureSet {
    /// `{ "polygons": FeatureCollection, "markers": FeatureCollection }`.
    pub fn to_geojson(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "polygons".to_string(),
            collection(self.styled_features.iter().map(polygon_feature)),
        );
        root.insert(
            "markers".to_string(),
            collection(self.markers.iter().map(marker_feature)),
        );
        Value::Object(root)
    }
}

fn collection(features: impl Iterator<Item = Value>) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    obj.insert("features".to_string(), Value::Array(features.collect()));
    Value::Object(obj)
}

fn polygon_feature(feature: &StyledFeature) -> Value {
    let mut ring: Vec<Value> = feature.ring.iter().map(|p| position(*p)).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    let mut geometry = Map::new();
    geometry.insert("type".to_string(), Value::String("Polygon".to_string()));
    geometry.insert(
        "coordinates".to_string(),
        Value::Array(vec![Value::Array(ring)]),
    );

    let mut props = Map::new();
    props.insert("id".to_string(), Value::String(feature.id.clone()));
    props.insert(
        "fillColor".to_string(),
        Value::String(feature.fill_color.clone()),
    );
    props.insert(
        "color".to_string(),
        Value::String(feature.outline_color.clone()),
    );
    props.insert("fillOpacity".to_string(), Value::from(feature.fill_opacity));
    props.insert(
        "outlineWidth".to_string(),
        Value::from(feature.outline_width),
    );
    if let Some(dash) = &feature.dash_pattern {
        props.insert("dashPattern".to_string(), Value::from(dash.clone()));
    }
    if let Some(key) = &feature.pattern_key {
        props.insert("patternKey".to_string(), Value::String(key.clone()));
    }

    feature_value(Some(&feature.id), geometry, props)
}

fn marker_feature(marker: &MarkerRecord) -> Value {
    let mut geometry = Map::new();
    geometry.insert("type".to_string(), Value::String("Point".to_string()));
    geometry.insert("coordinates".to_string(), position(marker.position));

    let mut props = Map::new();
    props.insert("id".to_string(), Value::String(marker.id.clone()));
    props.insert(
        "iconName".to_string(),
        Value::String(marker.icon_key.clone()),
    );
    props.insert("label".to_string(), Value::String(marker.label.clone()));

    feature_value(None, geometry, props)
}

fn feature_value(id: Option<&str>, geometry: Map<String, Value>, props: Map<String, Value>) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = id {
        obj.insert("id".to_string(), Value::String(id.to_string()));
    }
    obj.insert("geometry".to_string(), Value::Object(geometry));
    obj.insert("properties".to_string(), Value::Object(props));
    Value::Object(obj)
}

fn position(p: LatLng) -> Value {
    Value::Array(vec![Value::from(p.lng), Value::from(p.lat)])
}

#[cfg(test)]
mod tests {
    use crate::assemble::{FeatureSet, StyledFeature};
    use crate::markers::MarkerRecord;
    use foundation::LatLng;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> FeatureSet {
        FeatureSet {
            styled_features: vec![StyledFeature {
                id: "BF-1".to_string(),
                ring: vec![
                    LatLng::new(48.0, 17.0),
                    LatLng::new(48.0, 17.5),
                    LatLng::new(48.5, 17.5),
                ],
                fill_color: "rgba(31,77,155,0.4)".to_string(),
                outline_color: "#1f4d9b".to_string(),
                fill_opacity: 0.4,
                outline_width: 2.0,
                dash_pattern: Some(vec![2.0, 1.0]),
                pattern_key: None,
            }],
            markers: vec![MarkerRecord {
                id: "centroid-BF-1".to_string(),
                position: LatLng::new(48.25, 17.25),
                icon_key: "brownfield".to_string(),
                icon_url: Some("https://example.org/bf.png".to_string()),
                label: "Old brewery".to_string(),
            }],
            ..FeatureSet::default()
        }
    }

    #[test]
    fn rings_are_closed_and_lng_lat() {
        let out = sample().to_geojson();
        assert_eq!(
            out["polygons"],
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "id": "BF-1",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[17.0, 48.0], [17.5, 48.0], [17.5, 48.5], [17.0, 48.0]]]
                    },
                    "properties": {
                        "id": "BF-1",
                        "fillColor": "rgba(31,77,155,0.4)",
                        "color": "#1f4d9b",
                        "fillOpacity": 0.4,
                        "outlineWidth": 2.0,
                        "dashPattern": [2.0, 1.0]
                    }
                }]
            })
        );
    }

    #[test]
    fn markers_carry_icon_name_and_label() {
        let out = sample().to_geojson();
        assert_eq!(
            out["markers"]["features"][0],
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [17.25, 48.25] },
                "properties": { "id": "centroid-BF-1", "iconName": "brownfield", "label": "Old brewery" }
            })
        );
    }

    #[test]
    fn empty_set_exports_empty_collections() {
        let out = FeatureSet::default().to_geojson();
        assert_eq!(out["polygons"]["features"], json!([]));
        assert_eq!(out["markers"]["features"], json!([]));
    }
}

//! Reader for inline site records `{ id, points?, shape?, ...properties }`.

use foundation::LatLng;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::geojson::json_id;
use crate::source::{SourceFeature, SourceGeometry, SourceRing};
use crate::wkt::{WktOptions, safe_parse_wkt_polygon};

#[derive(Debug, Deserialize)]
struct SiteRecord {
    #[serde(default)]
    id: Option<Value>,
    /// `[lat, lng]` pairs, used verbatim.
    #[serde(default)]
    points: Option<Vec<[f64; 2]>>,
    /// WKT `POLYGON` in `[lng, lat]` order.
    #[serde(default)]
    shape: Option<String>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

/// Lowers site records into features. `points` win over `shape`; a record
/// with neither has a missing geometry. Records that are not objects, or whose
/// `points` are not numeric pairs, are skipped with a warning.
pub fn read_records(items: &[Value]) -> Vec<SourceFeature> {
    let mut features = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let record = match SiteRecord::deserialize(item) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable site record");
                continue;
            }
        };

        let geometry = match (record.points, record.shape) {
            (Some(points), _) if !points.is_empty() => SourceGeometry::Polygon(
                SourceRing::Geographic(
                    points
                        .into_iter()
                        .map(|[lat, lng]| LatLng::new(lat, lng))
                        .collect(),
                ),
            ),
            (_, Some(shape)) => {
                let ring = safe_parse_wkt_polygon(&shape, WktOptions::default())
                    .into_iter()
                    .map(|[lng, lat]| LatLng::new(lat, lng))
                    .collect();
                SourceGeometry::Polygon(SourceRing::Geographic(ring))
            }
            (Some(_), None) => SourceGeometry::Polygon(SourceRing::Geographic(Vec::new())),
            (None, None) => SourceGeometry::Missing,
        };

        features.push(SourceFeature {
            index,
            id: record.id.as_ref().and_then(json_id),
            properties: record.properties,
            geometry,
        });
    }
    features
}

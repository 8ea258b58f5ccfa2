//! Fan-out of per-feature normalization.
//!
//! Output is sorted by polygon id (stable, so ties keep input order) in both
//! builds, making parallel and sequential runs agree.

use formats::{PolygonRecord, SourceFeature};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::normalize::Normalizer;

#[cfg(feature = "parallel")]
pub fn normalize_all(normalizer: &Normalizer<'_>, features: &[SourceFeature]) -> Vec<PolygonRecord> {
    let mut out: Vec<PolygonRecord> = features
        .par_iter()
        .filter_map(|feature| normalizer.normalize(feature))
        .collect();
    sort_by_id(&mut out);
    out
}

#[cfg(not(feature = "parallel"))]
pub fn normalize_all(normalizer: &Normalizer<'_>, features: &[SourceFeature]) -> Vec<PolygonRecord> {
    let mut out: Vec<PolygonRecord> = features
        .iter()
        .filter_map(|feature| normalizer.normalize(feature))
        .collect();
    sort_by_id(&mut out);
    out
}

fn sort_by_id(records: &mut [PolygonRecord]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}

#[cfg(test)]
mod tests {
    use super::normalize_all;
    use crate::normalize::{FieldTable, IdPolicy, Normalizer};
    use formats::{SourceFeature, SourceGeometry, SourceRing};
    use foundation::LatLng;
    use foundation::math::Reprojector;
    use serde_json::Map;

    fn feature(index: usize, id: &str, lat: f64) -> SourceFeature {
        SourceFeature {
            index,
            id: Some(id.to_string()),
            properties: Map::new(),
            geometry: SourceGeometry::Polygon(SourceRing::Geographic(vec![
                LatLng::new(lat, 17.0),
                LatLng::new(lat, 17.1),
                LatLng::new(lat + 0.1, 17.1),
            ])),
        }
    }

    #[test]
    fn output_is_sorted_by_id_with_stable_ties() {
        let reprojector = Reprojector::default();
        let fields = FieldTable::default();
        let normalizer = Normalizer::new(&reprojector, &fields, IdPolicy::Random);
        let features = vec![
            feature(0, "c", 48.0),
            feature(1, "a", 48.1),
            SourceFeature {
                index: 2,
                id: None,
                properties: Map::new(),
                geometry: SourceGeometry::Unsupported("Point".to_string()),
            },
            feature(3, "b", 48.2),
            feature(4, "a", 48.3),
        ];
        let out = normalize_all(&normalizer, &features);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "a", "b", "c"]);
        assert_eq!(out[0].points[0].lat, 48.1);
        assert_eq!(out[1].points[0].lat, 48.3);
    }
}

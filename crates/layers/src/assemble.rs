//! Joins validated polygons with their styles and centroid markers.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use formats::PolygonRecord;
use foundation::{GeoBounds, LatLng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::markers::{MarkerFactory, MarkerRecord, marker_id};
use crate::symbology::{PatternSpec, StyleDefaults, StyleResolver};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledFeature {
    pub id: String,
    /// Implicitly closed ring in `[lat, lng]` order.
    pub ring: Vec<LatLng>,
    pub fill_color: String,
    pub outline_color: String,
    pub fill_opacity: f64,
    pub outline_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_pattern: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_key: Option<String>,
}

/// Render-ready output of one assembly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub styled_features: Vec<StyledFeature>,
    pub markers: Vec<MarkerRecord>,
    /// Every pattern referenced by a `patternKey`, built once by the renderer.
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.styled_features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assembler {
    defaults: StyleDefaults,
}

impl Assembler {
    pub fn new(defaults: StyleDefaults) -> Self {
        Self { defaults }
    }

    /// Builds the feature set. Output order follows `polygons`; equal inputs
    /// give equal output. Repeated ids are suffixed `#2`, `#3`, ... in order
    /// of appearance.
    pub fn assemble(
        &self,
        polygons: &[PolygonRecord],
        styles: &impl StyleResolver,
        markers: &impl MarkerFactory,
    ) -> FeatureSet {
        let mut out = FeatureSet::default();
        let mut seen: HashSet<String> = HashSet::with_capacity(polygons.len());

        for polygon in polygons {
            if polygon.points.len() < 3 {
                warn!(
                    id = %polygon.id,
                    vertices = polygon.points.len(),
                    "skipping polygon with fewer than 3 vertices"
                );
                continue;
            }

            let id = unique_id(&polygon.id, &mut seen);
            let polygon: Cow<'_, PolygonRecord> = if id == polygon.id {
                Cow::Borrowed(polygon)
            } else {
                Cow::Owned(PolygonRecord {
                    id: id.clone(),
                    ..polygon.clone()
                })
            };

            let style = styles.resolve(&polygon).resolve_against(&self.defaults);
            let pattern_key = style.pattern.map(|spec| {
                let key = spec.key();
                out.patterns.entry(key.clone()).or_insert(spec);
                key
            });

            if let Some(position) = polygon.centroid() {
                let mut marker = markers.marker(&polygon, position);
                let expected = marker_id(&id);
                if marker.id != expected {
                    debug!(found = %marker.id, %expected, "marker id replaced");
                    marker.id = expected;
                }
                out.markers.push(marker);
            }

            out.bounds = match (out.bounds, GeoBounds::from_points(&polygon.points)) {
                (Some(mut all), Some(ring)) => {
                    all.union(&ring);
                    Some(all)
                }
                (all, ring) => all.or(ring),
            };

            out.styled_features.push(StyledFeature {
                id,
                ring: polygon.points.clone(),
                fill_color: style.fill_color,
                outline_color: style.outline_color,
                fill_opacity: style.fill_opacity,
                outline_width: style.outline_width,
                dash_pattern: style.dash_pattern,
                pattern_key,
            });
        }

        debug!(
            features = out.styled_features.len(),
            markers = out.markers.len(),
            patterns = out.patterns.len(),
            "feature set assembled"
        );
        out
    }
}

fn unique_id(id: &str, seen: &mut HashSet<String>) -> String {
    if seen.insert(id.to_string()) {
        return id.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{id}#{n}");
        if seen.insert(candidate.clone()) {
            warn!(id, renamed = %candidate, "duplicate polygon id");
            return candidate;
        }
        n += 1;
    }
}

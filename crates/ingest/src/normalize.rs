//! Lowers `SourceFeature`s into validated `PolygonRecord`s.

use std::collections::BTreeMap;

use formats::{PolygonRecord, PropertyValue, SourceFeature, SourceGeometry, SourceRing};
use foundation::math::{ReprojectionError, Reprojector};
use foundation::{CoordinatePair, LatLng, LngLat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const SYNTHETIC_ID_PREFIX: &str = "bf-";
const SYNTHETIC_ID_LEN: usize = 7;
const MIN_VERTICES: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("feature {index}: unsupported geometry {kind}")]
    UnsupportedGeometry { index: usize, kind: String },
    #[error("feature {index}: vertex {vertex} is not a valid coordinate ({lng}, {lat})")]
    InvalidCoordinate {
        index: usize,
        vertex: usize,
        lng: f64,
        lat: f64,
    },
    #[error("feature {index}: vertex {vertex} could not be reprojected: {source}")]
    Reprojection {
        index: usize,
        vertex: usize,
        source: ReprojectionError,
    },
    #[error("feature {index}: {count} usable vertices, at least 3 required")]
    TooFewVertices { index: usize, count: usize },
}

/// One canonical property and where to find it in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub key: String,
    /// Source keys tried in order; the first present value wins.
    pub candidates: Vec<String>,
    pub default: PropertyValue,
}

impl FieldRule {
    pub fn new(key: &str, candidates: &[&str], default: impl Into<PropertyValue>) -> Self {
        Self {
            key: key.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            default: default.into(),
        }
    }
}

/// Declarative property mapping from source attributes to canonical keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldTable {
    pub rules: Vec<FieldRule>,
    /// Property keys tried for the identifier after the feature-level id.
    pub id_candidates: Vec<String>,
}

impl Default for FieldTable {
    fn default() -> Self {
        Self {
            rules: vec![
                FieldRule::new("name", &["NAZOV", "name"], "N/A"),
                FieldRule::new("address", &["ADRESA", "address"], "N/A"),
                FieldRule::new("cityPart", &["MC", "cityPart"], "N/A"),
                FieldRule::new("area", &["VYMERA", "area", "area_m2"], 0.0),
                FieldRule::new("ownership", &["DRUH_VLA", "ownership"], "N/A"),
                FieldRule::new(
                    "currentUse",
                    &["S_VYUZITIE", "current_use", "status"],
                    "N/A",
                ),
                FieldRule::new("environmentalBurden", &["SEZ_POPIS"], "N/A"),
                FieldRule::new("urbanPlanFunction", &["N_FUNK_POP"], "N/A"),
                FieldRule::new("lastUpdate", &["AKTUALIZAC"], "N/A"),
                FieldRule::new("category", &["category", "fclass"], "N/A"),
            ],
            id_candidates: vec![
                "SPEC_CISLO".to_string(),
                formats::geojson::SOURCE_INDEX_KEY.to_string(),
                "id".to_string(),
            ],
        }
    }
}

impl FieldTable {
    pub fn extract(&self, source: &Map<String, Value>) -> BTreeMap<String, PropertyValue> {
        self.rules
            .iter()
            .map(|rule| {
                let value = rule
                    .candidates
                    .iter()
                    .find_map(|c| source.get(c).and_then(PropertyValue::from_json))
                    .unwrap_or_else(|| rule.default.clone());
                (rule.key.clone(), value)
            })
            .collect()
    }

    pub fn identifier(&self, feature: &SourceFeature) -> Option<String> {
        feature.id.clone().or_else(|| {
            self.id_candidates.iter().find_map(|c| {
                feature
                    .properties
                    .get(c)
                    .and_then(PropertyValue::from_json)
                    .map(|v| v.to_string())
            })
        })
    }
}

/// How identifiers are made up for features that carry none.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdPolicy {
    /// `bf-` plus 7 random characters; differs between runs.
    #[default]
    Random,
    /// `bf-` plus a hash prefix of the ring and properties; stable across runs.
    ContentHash,
}

impl IdPolicy {
    fn synthesize(self, points: &[LatLng], properties: &BTreeMap<String, PropertyValue>) -> String {
        let suffix = match self {
            IdPolicy::Random => Uuid::new_v4().simple().to_string(),
            IdPolicy::ContentHash => {
                let mut hasher = blake3::Hasher::new();
                for p in points {
                    hasher.update(&p.lat.to_le_bytes());
                    hasher.update(&p.lng.to_le_bytes());
                }
                for (key, value) in properties {
                    hasher.update(key.as_bytes());
                    hasher.update(&[0]);
                    hasher.update(value.to_string().as_bytes());
                    hasher.update(&[0]);
                }
                hasher.finalize().to_hex().to_string()
            }
        };
        format!("{SYNTHETIC_ID_PREFIX}{}", &suffix[..SYNTHETIC_ID_LEN])
    }
}

/// Stateless apart from its borrowed configuration, so it can be shared
/// across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    reprojector: &'a Reprojector,
    fields: &'a FieldTable,
    ids: IdPolicy,
}

impl<'a> Normalizer<'a> {
    pub fn new(reprojector: &'a Reprojector, fields: &'a FieldTable, ids: IdPolicy) -> Self {
        Self {
            reprojector,
            fields,
            ids,
        }
    }

    /// Logs and drops features that cannot become a polygon. Unsupported
    /// geometry types are routine in mixed layers and only logged at debug.
    pub fn normalize(&self, feature: &SourceFeature) -> Option<PolygonRecord> {
        match self.try_normalize(feature) {
            Ok(record) => Some(record),
            Err(err @ NormalizeError::UnsupportedGeometry { .. }) => {
                debug!(error = %err, "feature skipped");
                None
            }
            Err(err) => {
                warn!(error = %err, "feature dropped");
                None
            }
        }
    }

    pub fn try_normalize(&self, feature: &SourceFeature) -> Result<PolygonRecord, NormalizeError> {
        let index = feature.index;
        let ring = match &feature.geometry {
            SourceGeometry::Polygon(ring) => ring,
            SourceGeometry::Unsupported(kind) => {
                return Err(NormalizeError::UnsupportedGeometry {
                    index,
                    kind: kind.clone(),
                });
            }
            SourceGeometry::Missing => {
                return Err(NormalizeError::UnsupportedGeometry {
                    index,
                    kind: "null".to_string(),
                });
            }
        };

        let points = self.geographic_ring(index, ring);
        if points.len() < MIN_VERTICES {
            return Err(NormalizeError::TooFewVertices {
                index,
                count: points.len(),
            });
        }

        let properties = self.fields.extract(&feature.properties);
        let id = self
            .fields
            .identifier(feature)
            .unwrap_or_else(|| self.ids.synthesize(&points, &properties));

        Ok(PolygonRecord {
            id,
            points,
            properties,
        })
    }

    fn geographic_ring(&self, index: usize, ring: &SourceRing) -> Vec<LatLng> {
        let vertices: Vec<Result<LatLng, NormalizeError>> = match ring {
            SourceRing::Grid(points) => points
                .iter()
                .enumerate()
                .map(|(vertex, p)| self.grid_vertex(index, vertex, *p))
                .collect(),
            SourceRing::Geographic(points) => points
                .iter()
                .enumerate()
                .map(|(vertex, p)| checked_vertex(index, vertex, p.to_lng_lat()))
                .collect(),
        };

        let mut points: Vec<LatLng> = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            match vertex {
                Ok(p) => points.push(p),
                Err(err) => warn!(error = %err, "vertex dropped"),
            }
        }

        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    }

    fn grid_vertex(
        &self,
        index: usize,
        vertex: usize,
        point: CoordinatePair,
    ) -> Result<LatLng, NormalizeError> {
        let p = self
            .reprojector
            .try_reproject(point)
            .map_err(|source| NormalizeError::Reprojection {
                index,
                vertex,
                source,
            })?;
        checked_vertex(index, vertex, p)
    }
}

fn checked_vertex(index: usize, vertex: usize, p: LngLat) -> Result<LatLng, NormalizeError> {
    if p.is_valid() {
        Ok(p.to_lat_lng())
    } else {
        Err(NormalizeError::InvalidCoordinate {
            index,
            vertex,
            lng: p.lng,
            lat: p.lat,
        })
    }
}

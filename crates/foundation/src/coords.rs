use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two ordinates whose axis order is fixed by the stage that produced them.
pub type CoordinatePair = [f64; 2];

/// Axis order of a `CoordinatePair`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    /// `[lng, lat]`, the WKT and GeoJSON convention.
    #[default]
    LngLat,
    /// `[lat, lng]`, the renderer convention.
    LatLng,
}

impl AxisOrder {
    pub fn arrange(self, lng: f64, lat: f64) -> CoordinatePair {
        match self {
            AxisOrder::LngLat => [lng, lat],
            AxisOrder::LatLng => [lat, lng],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown axis order {0:?} (expected \"lnglat\" or \"latlng\")")]
pub struct UnknownAxisOrder(pub String);

impl FromStr for AxisOrder {
    type Err = UnknownAxisOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lnglat" => Ok(AxisOrder::LngLat),
            "latlng" => Ok(AxisOrder::LatLng),
            _ => Err(UnknownAxisOrder(s.to_string())),
        }
    }
}

/// True when both ordinates are finite and inside the geographic range.
pub fn is_valid_geographic(lng: f64, lat: f64) -> bool {
    lng.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lng)
        && (-90.0..=90.0).contains(&lat)
}

/// Geographic position in degrees, serialized as `[lng, lat]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    /// Sentinel for a vertex that could not be computed.
    pub const INVALID: LngLat = LngLat {
        lng: f64::NAN,
        lat: f64::NAN,
    };

    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_geographic(self.lng, self.lat)
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self::new(lng, lat)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Geographic position in degrees, serialized as `[lat, lng]`.
///
/// This is the storage order of polygon rings and marker positions.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_geographic(self.lng, self.lat)
    }

    pub fn to_lng_lat(self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self::new(lat, lng)
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(p: LatLng) -> Self {
        [p.lat, p.lng]
    }
}

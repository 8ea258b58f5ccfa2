//! Single-ring WKT `POLYGON` parsing.
//!
//! Only the outer ring is read; interior rings are discarded. Token handling
//! has two tiers: a token with fewer than two ordinates is skipped, but once a
//! pair is present both ordinates must be finite numbers.

use foundation::{AxisOrder, CoordinatePair};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

static POLYGON_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^POLYGON\s*\(\(").expect("static regex"));
static RING_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\)\s*,\s*\(").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WktError {
    #[error("malformed WKT: {0}")]
    Malformed(#[from] WktDefect),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WktDefect {
    #[error("input does not start with POLYGON((")]
    NotPolygon,
    #[error("missing or empty (( ... )) ring")]
    MissingRing,
    #[error("invalid numeric coordinate in segment {segment:?}")]
    InvalidNumber { segment: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WktOptions {
    /// Output order of each pair. WKT input is always `[lng, lat]`.
    pub order: AxisOrder,
    /// Drop a last pair identical to the first.
    pub dedupe: bool,
}

impl WktOptions {
    pub fn lat_lng() -> Self {
        Self {
            order: AxisOrder::LatLng,
            ..Self::default()
        }
    }
}

impl Default for WktOptions {
    fn default() -> Self {
        Self {
            order: AxisOrder::LngLat,
            dedupe: true,
        }
    }
}

pub fn parse_wkt_polygon(
    text: &str,
    options: WktOptions,
) -> Result<Vec<CoordinatePair>, WktError> {
    let trimmed = text.trim();
    if !POLYGON_PREFIX.is_match(trimmed) {
        return Err(WktDefect::NotPolygon.into());
    }

    let start = trimmed.find("((").ok_or(WktDefect::MissingRing)?;
    let end = trimmed.rfind("))").ok_or(WktDefect::MissingRing)?;
    if end <= start + 2 {
        return Err(WktDefect::MissingRing.into());
    }
    let inner = trimmed[start + 2..end].trim();
    if inner.is_empty() {
        return Err(WktDefect::MissingRing.into());
    }

    let outer = RING_SEPARATOR.split(inner).next().unwrap_or(inner);

    let mut coords = Vec::new();
    for segment in outer.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut fields = segment.split_whitespace();
        let (Some(lng_raw), Some(lat_raw)) = (fields.next(), fields.next()) else {
            debug!(segment, "skipping WKT token without two ordinates");
            continue;
        };
        let lng = parse_ordinate(lng_raw, segment)?;
        let lat = parse_ordinate(lat_raw, segment)?;
        coords.push(options.order.arrange(lng, lat));
    }

    if options.dedupe && coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    Ok(coords)
}

/// Best-effort variant for batch ingestion: logs and returns an empty ring.
pub fn safe_parse_wkt_polygon(text: &str, options: WktOptions) -> Vec<CoordinatePair> {
    match parse_wkt_polygon(text, options) {
        Ok(coords) => coords,
        Err(err) => {
            warn!(error = %err, "WKT polygon skipped");
            Vec::new()
        }
    }
}

fn parse_ordinate(raw: &str, segment: &str) -> Result<f64, WktDefect> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| WktDefect::InvalidNumber {
            segment: segment.to_string(),
        })
}

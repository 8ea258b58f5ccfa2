//! Point markers derived from polygon centroids.

use formats::PolygonRecord;
use foundation::LatLng;
use serde::{Deserialize, Serialize};

pub const MARKER_ID_PREFIX: &str = "centroid-";
const ICON_KEY_PREFIX: &str = "icon-";
const ICON_KEY_HEX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub id: String,
    pub position: LatLng,
    pub icon_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub label: String,
}

pub fn marker_id(polygon_id: &str) -> String {
    format!("{MARKER_ID_PREFIX}{polygon_id}")
}

/// Stable icon key for an image URL.
pub fn icon_key_for_url(url: &str) -> String {
    let hex = blake3::hash(url.as_bytes()).to_hex();
    format!("{ICON_KEY_PREFIX}{}", &hex.as_str()[..ICON_KEY_HEX_LEN])
}

pub trait MarkerFactory {
    fn marker(&self, polygon: &PolygonRecord, position: LatLng) -> MarkerRecord;
}

impl<F> MarkerFactory for F
where
    F: Fn(&PolygonRecord, LatLng) -> MarkerRecord,
{
    fn marker(&self, polygon: &PolygonRecord, position: LatLng) -> MarkerRecord {
        self(polygon, position)
    }
}

/// The default factory: one configured icon for every marker, labelled from a
/// polygon property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerConfig {
    pub icon_key: Option<String>,
    pub icon_url: Option<String>,
    pub label_key: String,
    pub max_label_len: Option<usize>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            icon_key: None,
            icon_url: None,
            label_key: "name".to_string(),
            max_label_len: None,
        }
    }
}

impl MarkerConfig {
    /// Explicit key, else a hash of the icon URL, else the marker's own id.
    fn icon_key_for(&self, marker_id: &str) -> String {
        match (&self.icon_key, &self.icon_url) {
            (Some(key), _) => key.clone(),
            (None, Some(url)) => icon_key_for_url(url),
            (None, None) => marker_id.to_string(),
        }
    }

    fn label_for(&self, polygon: &PolygonRecord) -> String {
        let label = polygon
            .property(&self.label_key)
            .map(|v| v.to_string())
            .unwrap_or_default();
        match self.max_label_len {
            Some(0) => String::new(),
            Some(max) if label.chars().count() > max => {
                let mut cut: String = label.chars().take(max.saturating_sub(1)).collect();
                cut.push('…');
                cut
            }
            _ => label,
        }
    }
}

impl MarkerFactory for MarkerConfig {
    fn marker(&self, polygon: &PolygonRecord, position: LatLng) -> MarkerRecord {
        let id = marker_id(&polygon.id);
        MarkerRecord {
            icon_key: self.icon_key_for(&id),
            icon_url: self.icon_url.clone(),
            label: self.label_for(polygon),
            position,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerConfig, MarkerFactory, MarkerRecord, icon_key_for_url, marker_id};
    use formats::{PolygonRecord, PropertyValue};
    use foundation::LatLng;
    use pretty_assertions::assert_eq;

    fn parcel(name: &str) -> PolygonRecord {
        PolygonRecord {
            id: "BF-17".to_string(),
            points: vec![
                LatLng::new(48.0, 17.0),
                LatLng::new(48.0, 17.1),
                LatLng::new(48.1, 17.1),
            ],
            properties: [("name".to_string(), PropertyValue::from(name))].into(),
        }
    }

    #[test]
    fn default_factory_labels_from_the_name() {
        let at = LatLng::new(48.05, 17.05);
        let marker = MarkerConfig::default().marker(&parcel("Old brewery"), at);
        assert_eq!(
            marker,
            MarkerRecord {
                id: "centroid-BF-17".to_string(),
                position: at,
                icon_key: "centroid-BF-17".to_string(),
                icon_url: None,
                label: "Old brewery".to_string(),
            }
        );
        assert_eq!(marker.id, marker_id("BF-17"));
    }

    #[test]
    fn icon_key_is_derived_from_the_url_when_not_configured() {
        let config = MarkerConfig {
            icon_url: Some("https://example.org/icons/factory.png".to_string()),
            ..MarkerConfig::default()
        };
        let marker = config.marker(&parcel("x"), LatLng::new(48.0, 17.0));
        assert_eq!(marker.icon_key, icon_key_for_url("https://example.org/icons/factory.png"));
        assert_ne!(marker.icon_key, icon_key_for_url("https://example.org/icons/other.png"));

        let explicit = MarkerConfig {
            icon_key: Some("brownfield".to_string()),
            ..config
        };
        assert_eq!(explicit.marker(&parcel("x"), LatLng::new(48.0, 17.0)).icon_key, "brownfield");
    }

    #[test]
    fn long_labels_are_shortened() {
        let config = MarkerConfig {
            max_label_len: Some(6),
            ..MarkerConfig::default()
        };
        let marker = config.marker(&parcel("Stará tržnica"), LatLng::new(48.0, 17.0));
        assert_eq!(marker.label, "Stará…");
        let short = config.marker(&parcel("Hala"), LatLng::new(48.0, 17.0));
        assert_eq!(short.label, "Hala");
    }

    #[test]
    fn shortened_labels_never_exceed_the_limit() {
        for max in 0..4 {
            let config = MarkerConfig {
                max_label_len: Some(max),
                ..MarkerConfig::default()
            };
            let label = config.marker(&parcel("Cvernovka"), LatLng::new(48.0, 17.0)).label;
            assert!(label.chars().count() <= max, "max {max}: {label:?}");
        }
        let hidden = MarkerConfig {
            max_label_len: Some(0),
            ..MarkerConfig::default()
        };
        assert_eq!(hidden.marker(&parcel("Hala"), LatLng::new(48.0, 17.0)).label, "");
    }

    #[test]
    fn missing_label_property_gives_an_empty_label() {
        let mut polygon = parcel("x");
        polygon.properties.clear();
        let marker = MarkerConfig::default().marker(&polygon, LatLng::new(48.0, 17.0));
        assert_eq!(marker.label, "");
    }
}

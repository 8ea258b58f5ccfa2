//! Polygon styling: defaults, per-feature overrides and fill patterns.

use formats::PolygonRecord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILL_COLOR: &str = "rgba(31,77,155,0.4)";
pub const DEFAULT_OUTLINE_COLOR: &str = "#1f4d9b";
pub const DEFAULT_FILL_OPACITY: f64 = 0.4;
pub const DEFAULT_OUTLINE_WIDTH: f64 = 2.0;

const PATTERN_KEY_PREFIX: &str = "pattern-";
const PATTERN_KEY_HEX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDefaults {
    pub fill_color: String,
    pub outline_color: String,
    pub fill_opacity: f64,
    pub outline_width: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            outline_color: DEFAULT_OUTLINE_COLOR.to_string(),
            fill_opacity: DEFAULT_FILL_OPACITY,
            outline_width: DEFAULT_OUTLINE_WIDTH,
        }
    }
}

/// Per-feature style request. Every field is optional; omitted fields fall
/// back to `StyleDefaults`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOverrides {
    pub fill_color: Option<String>,
    pub outline_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub outline_width: Option<f64>,
    pub dash_pattern: Option<Vec<f64>>,
    pub pattern: Option<PatternSpec>,
}

impl StyleOverrides {
    /// Fields set in `other` replace the ones in `self`.
    pub fn merged_with(self, other: StyleOverrides) -> StyleOverrides {
        StyleOverrides {
            fill_color: other.fill_color.or(self.fill_color),
            outline_color: other.outline_color.or(self.outline_color),
            fill_opacity: other.fill_opacity.or(self.fill_opacity),
            outline_width: other.outline_width.or(self.outline_width),
            dash_pattern: other.dash_pattern.or(self.dash_pattern),
            pattern: other.pattern.or(self.pattern),
        }
    }

    pub fn resolve_against(self, defaults: &StyleDefaults) -> FeatureStyle {
        FeatureStyle {
            fill_color: self
                .fill_color
                .unwrap_or_else(|| defaults.fill_color.clone()),
            outline_color: self
                .outline_color
                .unwrap_or_else(|| defaults.outline_color.clone()),
            fill_opacity: self.fill_opacity.unwrap_or(defaults.fill_opacity),
            outline_width: self.outline_width.unwrap_or(defaults.outline_width),
            dash_pattern: self.dash_pattern,
            pattern: self.pattern,
        }
    }
}

/// A fully resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub fill_color: String,
    pub outline_color: String,
    pub fill_opacity: f64,
    pub outline_width: f64,
    pub dash_pattern: Option<Vec<f64>>,
    pub pattern: Option<PatternSpec>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    Hatch,
    CrossHatch,
    Dots,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Hatch => "hatch",
            PatternKind::CrossHatch => "crossHatch",
            PatternKind::Dots => "dots",
        }
    }
}

/// Parameters of a generated fill image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    pub kind: PatternKind,
    pub foreground: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default = "default_spacing")]
    pub spacing_px: f64,
    #[serde(default = "default_line_width")]
    pub line_width_px: f64,
    #[serde(default)]
    pub angle_deg: f64,
}

fn default_spacing() -> f64 {
    8.0
}

fn default_line_width() -> f64 {
    1.0
}

impl PatternSpec {
    pub fn new(kind: PatternKind, foreground: impl Into<String>) -> Self {
        Self {
            kind,
            foreground: foreground.into(),
            background: None,
            spacing_px: default_spacing(),
            line_width_px: default_line_width(),
            angle_deg: 0.0,
        }
    }

    /// Image-cache key: equal specs share a key, any parameter change gives a
    /// new one.
    pub fn key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.foreground.as_bytes());
        hasher.update(&[0]);
        match &self.background {
            Some(bg) => {
                hasher.update(&[1]);
                hasher.update(bg.as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(&[0]);
        for v in [self.spacing_px, self.line_width_px, self.angle_deg] {
            // -0.0 and 0.0 compare equal and must hash equal.
            hasher.update(&(v + 0.0).to_le_bytes());
        }
        let hex = hasher.finalize().to_hex();
        format!("{PATTERN_KEY_PREFIX}{}", &hex.as_str()[..PATTERN_KEY_HEX_LEN])
    }
}

/// Chooses style overrides for a polygon.
pub trait StyleResolver {
    fn resolve(&self, polygon: &PolygonRecord) -> StyleOverrides;
}

impl<F> StyleResolver for F
where
    F: Fn(&PolygonRecord) -> StyleOverrides,
{
    fn resolve(&self, polygon: &PolygonRecord) -> StyleOverrides {
        self(polygon)
    }
}

/// Leaves every polygon on the defaults.
#[derive(Debug, Copy, Clone, Default)]
pub struct DefaultStyle;

impl StyleResolver for DefaultStyle {
    fn resolve(&self, _polygon: &PolygonRecord) -> StyleOverrides {
        StyleOverrides::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    /// Compared with the property's display text.
    pub value: String,
    pub style: StyleOverrides,
}

/// Rule table keyed on one property. The first matching rule wins; polygons
/// without a match get `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStyleResolver {
    pub property: String,
    #[serde(default)]
    pub rules: Vec<StyleRule>,
    #[serde(default)]
    pub fallback: StyleOverrides,
}

impl PropertyStyleResolver {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            rules: Vec::new(),
            fallback: StyleOverrides::default(),
        }
    }

    pub fn with_rule(mut self, value: impl Into<String>, style: StyleOverrides) -> Self {
        self.rules.push(StyleRule {
            value: value.into(),
            style,
        });
        self
    }
}

impl StyleResolver for PropertyStyleResolver {
    fn resolve(&self, polygon: &PolygonRecord) -> StyleOverrides {
        let Some(value) = polygon.property(&self.property) else {
            return self.fallback.clone();
        };
        let text = value.to_string();
        self.rules
            .iter()
            .find(|rule| rule.value == text)
            .map(|rule| rule.style.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

//! Pipeline configuration, loaded once and handed to `Pipeline::new`.

use std::path::{Path, PathBuf};

use foundation::math::ReprojectionParameters;
use formats::PolygonRecord;
use layers::{MarkerConfig, PropertyStyleResolver, StyleDefaults, StyleOverrides, StyleResolver};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::{FieldTable, IdPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Every section falls back to its default, so `{}` is a complete
/// configuration for S-JTSK input. Keys are camelCase throughout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub reprojection: ReprojectionParameters,
    pub style: StyleConfig,
    pub fields: FieldTable,
    pub ids: IdPolicy,
    pub marker: MarkerConfig,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// Style section: defaults, overrides applied to every polygon, and an
/// optional rule table on one property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub defaults: StyleDefaults,
    pub all: StyleOverrides,
    pub by_property: Option<PropertyStyleResolver>,
}

impl StyleResolver for StyleConfig {
    fn resolve(&self, polygon: &PolygonRecord) -> StyleOverrides {
        match &self.by_property {
            Some(rules) => self.all.clone().merged_with(rules.resolve(polygon)),
            None => self.all.clone(),
        }
    }
}

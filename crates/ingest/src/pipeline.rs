//! End-to-end ingestion: raw source to render-ready feature set.

use formats::{PolygonRecord, RawGeometrySource, SourceError, SourceFeature};
use foundation::math::Reprojector;
use layers::{Assembler, FeatureSet};
use tracing::info;

use crate::batch;
use crate::config::PipelineConfig;
use crate::normalize::Normalizer;

/// Holds the configuration and everything derived from it. Immutable once
/// built; share it by reference.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    reprojector: Reprojector,
    assembler: Assembler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let reprojector = Reprojector::new(config.reprojection.clone());
        let assembler = Assembler::new(config.style.defaults.clone());
        Self {
            config,
            reprojector,
            assembler,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reprojector(&self) -> &Reprojector {
        &self.reprojector
    }

    pub fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(&self.reprojector, &self.config.fields, self.config.ids)
    }

    pub fn normalize_features(&self, features: &[SourceFeature]) -> Vec<PolygonRecord> {
        batch::normalize_all(&self.normalizer(), features)
    }

    pub fn normalize_source(
        &self,
        source: RawGeometrySource,
    ) -> Result<Vec<PolygonRecord>, SourceError> {
        let features = source.into_features()?;
        let polygons = self.normalize_features(&features);
        info!(
            features = features.len(),
            polygons = polygons.len(),
            "source normalized"
        );
        Ok(polygons)
    }

    pub fn assemble(&self, polygons: &[PolygonRecord]) -> FeatureSet {
        self.assembler
            .assemble(polygons, &self.config.style, &self.config.marker)
    }

    pub fn run(&self, source: RawGeometrySource) -> Result<FeatureSet, SourceError> {
        let polygons = self.normalize_source(source)?;
        Ok(self.assemble(&polygons))
    }

    pub fn run_json_str(&self, payload: &str) -> Result<FeatureSet, SourceError> {
        self.run(RawGeometrySource::from_json_str(payload)?)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

//! Floor-area-ratio development scenarios for a site.

use std::collections::BTreeMap;

use formats::PolygonRecord;
use serde::{Deserialize, Serialize};

pub const RESIDENTIAL_AREA_PER_PERSON_M2: f64 = 35.0;
pub const COMMERCIAL_AREA_PER_WORKPLACE_M2: f64 = 15.0;
pub const FLOOR_AREA_RATIOS: [f64; 4] = [1.0, 1.5, 2.0, 3.0];
pub const USE_MIXES: [UseMix; 2] = [UseMix::new(30, 70), UseMix::new(70, 30)];

/// Commercial / residential split of the gross floor area, in percent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UseMix {
    pub commercial_pct: u8,
    pub residential_pct: u8,
}

impl UseMix {
    pub const fn new(commercial_pct: u8, residential_pct: u8) -> Self {
        Self {
            commercial_pct,
            residential_pct,
        }
    }

    pub fn label(&self) -> String {
        format!("{}c_{}r", self.commercial_pct, self.residential_pct)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub population_change: f64,
    pub workplace_change: f64,
    pub gfa_change: f64,
}

/// `"30c_70r_far_1"`, `"70c_30r_far_1_5"`, ...
pub fn scenario_key(mix: UseMix, far: f64) -> String {
    format!("{}_far_{}", mix.label(), far.to_string().replace('.', "_"))
}

pub fn development_scenario(area_m2: f64, mix: UseMix, far: f64) -> ScenarioOutcome {
    let total_gfa = area_m2 * far;
    let commercial_gfa = total_gfa * f64::from(mix.commercial_pct) / 100.0;
    let residential_gfa = total_gfa * f64::from(mix.residential_pct) / 100.0;

    let workplaces = if commercial_gfa > 0.0 {
        commercial_gfa / COMMERCIAL_AREA_PER_WORKPLACE_M2
    } else {
        0.0
    };
    let population = if residential_gfa > 0.0 {
        residential_gfa / RESIDENTIAL_AREA_PER_PERSON_M2
    } else {
        0.0
    };

    ScenarioOutcome {
        population_change: round2(population),
        workplace_change: round2(workplaces),
        gfa_change: round2(total_gfa),
    }
}

/// Every FAR and use-mix combination for one site area.
pub fn development_scenarios(area_m2: f64) -> BTreeMap<String, ScenarioOutcome> {
    let mut out = BTreeMap::new();
    for far in FLOOR_AREA_RATIOS {
        for mix in USE_MIXES {
            out.insert(scenario_key(mix, far), development_scenario(area_m2, mix, far));
        }
    }
    out
}

/// Scenarios keyed by polygon id, from each polygon's `area` property.
pub fn scenarios_by_polygon(
    polygons: &[PolygonRecord],
) -> BTreeMap<String, BTreeMap<String, ScenarioOutcome>> {
    polygons
        .iter()
        .map(|p| {
            let area = p
                .property("area")
                .and_then(|v| v.as_number())
                .unwrap_or(0.0);
            (p.id.clone(), development_scenarios(area))
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

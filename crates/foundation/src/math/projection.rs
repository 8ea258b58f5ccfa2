use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Ellipsoid, Geodetic, Helmert, Krovak, KrovakDefinition};
use crate::coords::{CoordinatePair, LngLat};

/// Everything needed to turn grid coordinates into geographic ones.
///
/// Defaults describe S-JTSK / Krovak East North (EPSG:5514) on Bessel 1841
/// with the `+towgs84=589,76,480` shift to WGS84.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReprojectionParameters {
    pub ellipsoid: Ellipsoid,
    pub latitude_of_origin_deg: f64,
    pub longitude_of_origin_deg: f64,
    pub azimuth_deg: f64,
    pub pseudo_standard_parallel_deg: f64,
    pub scale_factor: f64,
    pub false_easting_m: f64,
    pub false_northing_m: f64,
    pub to_wgs84: Helmert,
    pub target_ellipsoid: Ellipsoid,
}

impl ReprojectionParameters {
    pub fn s_jtsk_krovak_east_north() -> Self {
        Self {
            ellipsoid: Ellipsoid::BESSEL_1841,
            latitude_of_origin_deg: 49.5,
            longitude_of_origin_deg: 24.833_333_333_333_33,
            azimuth_deg: 30.288_139_752_777_78,
            pseudo_standard_parallel_deg: 78.5,
            scale_factor: 0.9999,
            false_easting_m: 0.0,
            false_northing_m: 0.0,
            to_wgs84: Helmert::S_JTSK_TO_WGS84,
            target_ellipsoid: Ellipsoid::WGS84,
        }
    }

    fn krovak_definition(&self) -> KrovakDefinition {
        KrovakDefinition {
            latitude_of_origin_deg: self.latitude_of_origin_deg,
            longitude_of_origin_deg: self.longitude_of_origin_deg,
            azimuth_deg: self.azimuth_deg,
            pseudo_standard_parallel_deg: self.pseudo_standard_parallel_deg,
            scale_factor: self.scale_factor,
            false_easting_m: self.false_easting_m,
            false_northing_m: self.false_northing_m,
        }
    }
}

impl Default for ReprojectionParameters {
    fn default() -> Self {
        Self::s_jtsk_krovak_east_north()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ReprojectionError {
    #[error("grid point [{x}, {y}] did not converge to a geographic position")]
    NoConvergence { x: f64, y: f64 },
    #[error("geographic point ({lat}, {lng}) cannot be projected onto the grid")]
    OutsideDomain { lng: f64, lat: f64 },
}

/// Grid to geographic transform with all derived constants fixed at
/// construction. Holds no mutable state, so one instance can be shared across
/// threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Reprojector {
    params: ReprojectionParameters,
    grid: Krovak,
}

impl Reprojector {
    pub fn new(params: ReprojectionParameters) -> Self {
        let grid = Krovak::new(params.ellipsoid, &params.krovak_definition());
        Self { params, grid }
    }

    /// Grid `[x, y]` to geographic `LngLat` on the target datum.
    pub fn try_reproject(&self, point: CoordinatePair) -> Result<LngLat, ReprojectionError> {
        let [x, y] = point;
        let no_convergence = ReprojectionError::NoConvergence { x, y };

        let local = self.grid.inverse(point).ok_or(no_convergence)?;
        let ecef = self.params.ellipsoid.geodetic_to_ecef(local);
        let shifted = self.params.to_wgs84.apply(ecef);
        if !shifted.is_finite() {
            return Err(no_convergence);
        }
        let geo = self.params.target_ellipsoid.ecef_to_geodetic(shifted);

        let out = LngLat::new(geo.lon_deg(), geo.lat_deg());
        if out.lng.is_finite() && out.lat.is_finite() {
            Ok(out)
        } else {
            Err(no_convergence)
        }
    }

    /// Like `try_reproject`, but yields `LngLat::INVALID` instead of an error
    /// so a caller can drop the single vertex.
    pub fn reproject(&self, point: CoordinatePair) -> LngLat {
        self.try_reproject(point).unwrap_or(LngLat::INVALID)
    }

    /// Geographic `LngLat` on the target datum to grid `[x, y]`.
    pub fn try_project(&self, point: LngLat) -> Result<CoordinatePair, ReprojectionError> {
        let outside = ReprojectionError::OutsideDomain {
            lng: point.lng,
            lat: point.lat,
        };
        if !point.is_valid() {
            return Err(outside);
        }

        let target = Geodetic::from_degrees(point.lat, point.lng);
        let ecef = self.params.target_ellipsoid.geodetic_to_ecef(target);
        let local = self
            .params
            .ellipsoid
            .ecef_to_geodetic(self.params.to_wgs84.apply_inverse(ecef));
        self.grid.forward(local).ok_or(outside)
    }

    pub fn project(&self, point: LngLat) -> CoordinatePair {
        self.try_project(point).unwrap_or([f64::NAN, f64::NAN])
    }
}

impl Default for Reprojector {
    fn default() -> Self {
        Self::new(ReprojectionParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{ReprojectionError, ReprojectionParameters, Reprojector};
    use crate::coords::LngLat;
    use crate::math::{Ellipsoid, Geodetic};

    fn ground_distance_m(a: LngLat, b: LngLat) -> f64 {
        let wgs = Ellipsoid::WGS84;
        wgs.geodetic_to_ecef(Geodetic::from_degrees(a.lat, a.lng))
            .distance(wgs.geodetic_to_ecef(Geodetic::from_degrees(b.lat, b.lng)))
    }

    #[test]
    fn round_trip_stays_within_a_meter() {
        let r = Reprojector::default();
        for p in [
            LngLat::new(17.1077, 48.1486),
            LngLat::new(17.0, 48.0),
            LngLat::new(21.2611, 48.7164),
            LngLat::new(14.4213, 50.0875),
            LngLat::new(19.1462, 48.7363),
        ] {
            let grid = r.try_project(p).unwrap();
            let back = r.try_reproject(grid).unwrap();
            let drift = ground_distance_m(p, back);
            assert!(drift < 1.0, "{p:?} drifted {drift} m");
        }
    }

    #[test]
    fn grid_point_lands_on_reference_wgs84_position() {
        let r = Reprojector::default();
        let grid = [-577_000.0, -1_281_000.0];
        let geo = r.try_reproject(grid).unwrap();
        assert!((geo.lng - 17.064_266_356_9).abs() < 1e-9, "lng {}", geo.lng);
        assert!((geo.lat - 48.139_548_095_2).abs() < 1e-9, "lat {}", geo.lat);

        let [x, y] = r.try_project(LngLat::new(17.064_266_356_9, 48.139_548_095_2)).unwrap();
        assert!((x - grid[0]).abs() < 1e-3, "x {x}");
        assert!((y - grid[1]).abs() < 1e-3, "y {y}");
    }

    #[test]
    fn reprojection_is_deterministic() {
        let r = Reprojector::default();
        let a = r.reproject([-577_123.4, -1_281_456.7]);
        let b = r.reproject([-577_123.4, -1_281_456.7]);
        assert_eq!(a.lng.to_bits(), b.lng.to_bits());
        assert_eq!(a.lat.to_bits(), b.lat.to_bits());
        assert!(a.is_valid());
    }

    #[test]
    fn datum_shift_moves_the_point_by_about_a_hundred_meters() {
        let shifted = Reprojector::default();
        let mut params = ReprojectionParameters::default();
        params.to_wgs84 = Default::default();
        let unshifted = Reprojector::new(params);

        let grid = [-577_000.0, -1_281_000.0];
        let d = ground_distance_m(shifted.reproject(grid), unshifted.reproject(grid));
        assert!((20.0..300.0).contains(&d), "shift {d} m");
    }

    #[test]
    fn pathological_input_yields_the_sentinel() {
        let r = Reprojector::default();
        assert!(!r.reproject([f64::NAN, 0.0]).is_valid());
        assert!(matches!(
            r.try_reproject([f64::INFINITY, 1.0]),
            Err(ReprojectionError::NoConvergence { .. })
        ));
        assert!(r.try_project(LngLat::new(f64::NAN, 48.0)).is_err());
    }
}

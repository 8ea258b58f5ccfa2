//! Krovak oblique conformal conic projection.
//!
//! The ellipsoid is mapped conformally onto a Gaussian sphere, the sphere is
//! rotated so that the cone axis passes through the pole of the oblique
//! system, and the oblique sphere is projected onto a cone tangent along the
//! pseudo standard parallel. Grid axes follow the East North convention of
//! EPSG:5514: `x = -westing`, `y = -southing`.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::{Ellipsoid, Geodetic};

const MAX_ITER: usize = 100;
const LAT_TOLERANCE_RAD: f64 = 1e-14;

/// Defining constants of a Krovak grid, in degrees and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KrovakDefinition {
    pub latitude_of_origin_deg: f64,
    pub longitude_of_origin_deg: f64,
    /// Azimuth of the cone axis at the projection centre.
    pub azimuth_deg: f64,
    pub pseudo_standard_parallel_deg: f64,
    pub scale_factor: f64,
    pub false_easting_m: f64,
    pub false_northing_m: f64,
}

/// A Krovak grid with its derived constants computed once.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Krovak {
    a: f64,
    e: f64,
    lam0: f64,
    // Gaussian sphere exponent and constant.
    alpha: f64,
    k: f64,
    // Cone constant, radius of the standard parallel, oblique pole distance.
    n: f64,
    rho0: f64,
    s0: f64,
    ad: f64,
    x0: f64,
    y0: f64,
}

impl Krovak {
    pub fn new(ellipsoid: Ellipsoid, def: &KrovakDefinition) -> Self {
        let e2 = ellipsoid.e2();
        let e = e2.sqrt();
        let phi0 = def.latitude_of_origin_deg.to_radians();
        let sin_phi0 = phi0.sin();

        let alpha = (1.0 + e2 * phi0.cos().powi(4) / (1.0 - e2)).sqrt();
        let u0 = (sin_phi0 / alpha).asin();
        let g = ((1.0 + e * sin_phi0) / (1.0 - e * sin_phi0)).powf(alpha * e / 2.0);
        let k = (u0 / 2.0 + FRAC_PI_4).tan() / (phi0 / 2.0 + FRAC_PI_4).tan().powf(alpha) * g;

        let n0 = (1.0 - e2).sqrt() / (1.0 - e2 * sin_phi0 * sin_phi0);
        let s0 = def.pseudo_standard_parallel_deg.to_radians();
        let n = s0.sin();
        let rho0 = def.scale_factor * n0 / s0.tan();

        Self {
            a: ellipsoid.a(),
            e,
            lam0: def.longitude_of_origin_deg.to_radians(),
            alpha,
            k,
            n,
            rho0,
            s0,
            ad: def.azimuth_deg.to_radians(),
            x0: def.false_easting_m,
            y0: def.false_northing_m,
        }
    }

    /// Geodetic position on the grid's own ellipsoid to grid `[x, y]` meters.
    ///
    /// Returns `None` at the cone apex or for non-finite results.
    pub fn forward(&self, geo: Geodetic) -> Option<[f64; 2]> {
        let phi = geo.lat_rad;
        let lam = geo.lon_rad - self.lam0;
        let e_sin = self.e * phi.sin();

        let gfi = ((1.0 + e_sin) / (1.0 - e_sin)).powf(self.alpha * self.e / 2.0);
        let u = 2.0
            * ((self.k * (phi / 2.0 + FRAC_PI_4).tan().powf(self.alpha) / gfi).atan()
                - FRAC_PI_4);
        let deltav = -lam * self.alpha;

        let s = (self.ad.cos() * u.sin() + self.ad.sin() * u.cos() * deltav.cos()).asin();
        let cos_s = s.cos();
        if cos_s < 1e-12 {
            return None;
        }
        let d = (u.cos() * deltav.sin() / cos_s).asin();
        let eps = self.n * d;
        let rho = self.rho0 * (self.s0 / 2.0 + FRAC_PI_4).tan().powf(self.n)
            / (s / 2.0 + FRAC_PI_4).tan().powf(self.n);

        let southing = rho * eps.cos();
        let westing = rho * eps.sin();
        let x = -westing * self.a + self.x0;
        let y = -southing * self.a + self.y0;

        (x.is_finite() && y.is_finite()).then_some([x, y])
    }

    /// Grid `[x, y]` meters to a geodetic position on the grid's ellipsoid.
    ///
    /// Returns `None` for non-finite input or when the latitude iteration does
    /// not converge.
    pub fn inverse(&self, [x, y]: [f64; 2]) -> Option<Geodetic> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let westing = -(x - self.x0) / self.a;
        let southing = -(y - self.y0) / self.a;

        let rho = westing.hypot(southing);
        let eps = westing.atan2(southing);
        let d = eps / self.n;
        let s = if rho == 0.0 {
            FRAC_PI_2
        } else {
            2.0 * (((self.rho0 / rho).powf(1.0 / self.n) * (self.s0 / 2.0 + FRAC_PI_4).tan())
                .atan()
                - FRAC_PI_4)
        };

        let u = (self.ad.cos() * s.sin() - self.ad.sin() * s.cos() * d.cos()).asin();
        let deltav = (s.cos() * d.sin() / u.cos()).asin();
        let lam = -deltav / self.alpha;

        let conformal =
            self.k.powf(-1.0 / self.alpha) * (u / 2.0 + FRAC_PI_4).tan().powf(1.0 / self.alpha);
        let mut fi1 = u;
        for _ in 0..MAX_ITER {
            let e_sin = self.e * fi1.sin();
            let phi = 2.0
                * ((conformal * ((1.0 + e_sin) / (1.0 - e_sin)).powf(self.e / 2.0)).atan()
                    - FRAC_PI_4);
            if !phi.is_finite() {
                return None;
            }
            if (fi1 - phi).abs() < LAT_TOLERANCE_RAD {
                let lon = lam + self.lam0;
                return lon.is_finite().then(|| Geodetic::new(phi, lon, 0.0));
            }
            fi1 = phi;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Krovak, KrovakDefinition};
    use crate::math::{Ellipsoid, Geodetic};

    fn s_jtsk() -> Krovak {
        Krovak::new(
            Ellipsoid::BESSEL_1841,
            &KrovakDefinition {
                latitude_of_origin_deg: 49.5,
                longitude_of_origin_deg: 24.833_333_333_333_33,
                azimuth_deg: 30.288_139_752_777_78,
                pseudo_standard_parallel_deg: 78.5,
                scale_factor: 0.9999,
                false_easting_m: 0.0,
                false_northing_m: 0.0,
            },
        )
    }

    #[test]
    fn grid_coordinates_are_negative_in_the_working_area() {
        let [x, y] = s_jtsk().forward(Geodetic::from_degrees(48.1486, 17.1077)).unwrap();
        // Bratislava sits near westing 577 km, southing 1280 km.
        assert!((-620_000.0..-530_000.0).contains(&x), "x = {x}");
        assert!((-1_320_000.0..-1_230_000.0).contains(&y), "y = {y}");
        assert!(x.abs() < y.abs());
    }

    #[test]
    fn forward_matches_published_bessel_reference_points() {
        let grid = s_jtsk();
        for ((lon, lat), (x, y)) in [
            ((12.09, 47.73), (-951_555.9379, -1_276_319.1516)),
            ((22.56, 51.06), (-159_523.5347, -983_087.5481)),
        ] {
            let [gx, gy] = grid.forward(Geodetic::from_degrees(lat, lon)).unwrap();
            assert!((gx - x).abs() < 1e-3, "({lon}, {lat}) x {gx} != {x}");
            assert!((gy - y).abs() < 1e-3, "({lon}, {lat}) y {gy} != {y}");

            let back = grid.inverse([x, y]).unwrap();
            assert!((back.lat_deg() - lat).abs() < 1e-9, "lat {}", back.lat_deg());
            assert!((back.lon_deg() - lon).abs() < 1e-9, "lon {}", back.lon_deg());
        }
    }

    #[test]
    fn inverse_undoes_forward() {
        let grid = s_jtsk();
        for (lat, lon) in [(48.1486, 17.1077), (50.0875, 14.4213), (49.2, 21.9)] {
            let geo = Geodetic::from_degrees(lat, lon);
            let xy = grid.forward(geo).unwrap();
            let back = grid.inverse(xy).unwrap();
            assert!((back.lat_deg() - lat).abs() < 1e-9, "lat {lat} -> {}", back.lat_deg());
            assert!((back.lon_deg() - lon).abs() < 1e-9, "lon {lon} -> {}", back.lon_deg());
        }
    }

    #[test]
    fn non_finite_input_does_not_converge() {
        assert!(s_jtsk().inverse([f64::NAN, -1_200_000.0]).is_none());
        assert!(s_jtsk().inverse([f64::INFINITY, 0.0]).is_none());
    }
}

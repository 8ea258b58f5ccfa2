use serde::{Deserialize, Serialize};

use super::Ecef;

/// Reference ellipsoid given by its semi-major axis and inverse flattening.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipsoid {
    pub semi_major_axis_m: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 298.257_223_563);
    /// Bessel 1841, the ellipsoid of the S-JTSK datum.
    pub const BESSEL_1841: Ellipsoid = Ellipsoid::new(6_377_397.155, 299.152_812_8);

    pub const fn new(semi_major_axis_m: f64, inverse_flattening: f64) -> Self {
        Self {
            semi_major_axis_m,
            inverse_flattening,
        }
    }

    pub fn a(&self) -> f64 {
        self.semi_major_axis_m
    }

    pub fn flattening(&self) -> f64 {
        1.0 / self.inverse_flattening
    }

    /// Semi-minor axis (meters).
    pub fn b(&self) -> f64 {
        self.a() * (1.0 - self.flattening())
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    /// Second eccentricity squared.
    pub fn ep2(&self) -> f64 {
        let a = self.a();
        let b = self.b();
        (a * a - b * b) / (b * b)
    }

    pub fn geodetic_to_ecef(&self, geo: Geodetic) -> Ecef {
        let sin_lat = geo.lat_rad.sin();
        let cos_lat = geo.lat_rad.cos();
        let sin_lon = geo.lon_rad.sin();
        let cos_lon = geo.lon_rad.cos();
        let e2 = self.e2();

        let n = self.a() / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let x = (n + geo.alt_m) * cos_lat * cos_lon;
        let y = (n + geo.alt_m) * cos_lat * sin_lon;
        let z = (n * (1.0 - e2) + geo.alt_m) * sin_lat;

        Ecef::new(x, y, z)
    }

    /// Bowring's closed form; sub-millimetre near the ellipsoid surface.
    pub fn ecef_to_geodetic(&self, ecef: Ecef) -> Geodetic {
        let a = self.a();
        let b = self.b();
        let e2 = self.e2();

        let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
        let lon = ecef.y.atan2(ecef.x);

        let theta = (ecef.z * a).atan2(p * b);
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        let lat = (ecef.z + self.ep2() * b * sin_theta * sin_theta * sin_theta)
            .atan2(p - e2 * a * cos_theta * cos_theta * cos_theta);

        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt = p / lat.cos() - n;

        Geodetic::new(lat, lon, alt)
    }
}

/// Geodetic coordinates in radians and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }

    pub fn from_degrees(lat_deg: f64, lon_deg: f64) -> Self {
        Self::new(lat_deg.to_radians(), lon_deg.to_radians(), 0.0)
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }
}

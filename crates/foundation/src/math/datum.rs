use serde::{Deserialize, Serialize};

use super::Ecef;

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Seven-parameter Helmert transform between two geocentric frames.
///
/// Rotations use the position-vector convention (the one behind PROJ's
/// `+towgs84`). A three-parameter shift is the case with zero rotations and
/// zero scale.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Helmert {
    pub tx_m: f64,
    pub ty_m: f64,
    pub tz_m: f64,
    pub rx_arcsec: f64,
    pub ry_arcsec: f64,
    pub rz_arcsec: f64,
    pub scale_ppm: f64,
}

impl Helmert {
    /// S-JTSK to WGS84, `+towgs84=589,76,480`.
    pub const S_JTSK_TO_WGS84: Helmert = Helmert::translation(589.0, 76.0, 480.0);

    pub const fn translation(tx_m: f64, ty_m: f64, tz_m: f64) -> Self {
        Self {
            tx_m,
            ty_m,
            tz_m,
            rx_arcsec: 0.0,
            ry_arcsec: 0.0,
            rz_arcsec: 0.0,
            scale_ppm: 0.0,
        }
    }

    /// Builds the transform from a PROJ style `towgs84` list (3 or 7 values).
    pub fn from_towgs84(values: &[f64]) -> Option<Self> {
        match *values {
            [tx, ty, tz] => Some(Self::translation(tx, ty, tz)),
            [tx, ty, tz, rx, ry, rz, s] => Some(Self {
                tx_m: tx,
                ty_m: ty,
                tz_m: tz,
                rx_arcsec: rx,
                ry_arcsec: ry,
                rz_arcsec: rz,
                scale_ppm: s,
            }),
            _ => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, p: Ecef) -> Ecef {
        let rx = self.rx_arcsec * ARCSEC_TO_RAD;
        let ry = self.ry_arcsec * ARCSEC_TO_RAD;
        let rz = self.rz_arcsec * ARCSEC_TO_RAD;
        let s = 1.0 + self.scale_ppm * 1e-6;

        Ecef::new(
            self.tx_m + s * (p.x - rz * p.y + ry * p.z),
            self.ty_m + s * (rz * p.x + p.y - rx * p.z),
            self.tz_m + s * (-ry * p.x + rx * p.y + p.z),
        )
    }

    /// Maps a point of the target frame back into the source frame.
    ///
    /// Translation and scale are undone exactly; the rotation is undone with
    /// the transposed small-angle matrix, leaving a second-order residual of a
    /// few millimetres for national datum rotations.
    pub fn apply_inverse(&self, p: Ecef) -> Ecef {
        let rx = self.rx_arcsec * ARCSEC_TO_RAD;
        let ry = self.ry_arcsec * ARCSEC_TO_RAD;
        let rz = self.rz_arcsec * ARCSEC_TO_RAD;
        let s = 1.0 + self.scale_ppm * 1e-6;

        let x = p.x - self.tx_m;
        let y = p.y - self.ty_m;
        let z = p.z - self.tz_m;

        Ecef::new(
            (x + rz * y - ry * z) / s,
            (-rz * x + y + rx * z) / s,
            (ry * x - rx * y + z) / s,
        )
    }
}

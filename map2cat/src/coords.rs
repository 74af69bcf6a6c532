//! Pixel to equatorial coordinate conversion.

use crate::sky_map::SkyMap;

/// Offset added to right ascension after conversion, in degrees
pub const RA_ROTATION_DEG: f64 = 0.0;

/// Sky position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
}

impl SkyPosition {
    /// Convert HEALPix-style `(theta, phi)` in radians.
    ///
    /// `dec = 90 - theta` and `ra = phi + RA_ROTATION_DEG`, both in degrees.
    pub fn from_angles(theta: f64, phi: f64) -> Self {
        Self {
            ra: phi.to_degrees() + RA_ROTATION_DEG,
            dec: 90.0 - theta.to_degrees(),
        }
    }
}

/// Sky position of pixel `index` of `map`
pub fn pixel_to_radec<M: SkyMap + ?Sized>(map: &M, index: usize) -> SkyPosition {
    let (theta, phi) = map.pixel_to_angle(index);
    SkyPosition::from_angles(theta, phi)
}

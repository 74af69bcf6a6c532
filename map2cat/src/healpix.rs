//! HEALPix pixel geometry.
//!
//! Pixel-centre positions for the RING and NESTED orderings following the
//! Gorski et al. (2005) construction. Angles are returned as colatitude
//! `theta` in [0, π] and longitude `phi` in [0, 2π), both in radians.

use crate::error::CatalogueError;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

/// Largest nside whose pixel indices still fit the 64-bit arithmetic below
pub const MAX_NSIDE: u64 = 1 << 29;

/// Row/column offsets of the 12 base faces used by the nested scheme
const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Pixel ordering of a HEALPix map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// Pixels numbered along iso-latitude rings from north to south
    Ring,
    /// Pixels numbered hierarchically within each of the 12 base faces
    Nested,
}

impl FromStr for Ordering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RING" => Ok(Ordering::Ring),
            "NESTED" | "NEST" => Ok(Ordering::Nested),
            other => Err(format!("Unknown HEALPix ordering '{other}'")),
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordering::Ring => write!(f, "RING"),
            Ordering::Nested => write!(f, "NESTED"),
        }
    }
}

/// Resolution and ordering of a HEALPix pixelization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Healpix {
    nside: u64,
    ordering: Ordering,
}

impl Healpix {
    /// Create a pixelization with the given nside and ordering.
    ///
    /// The nested scheme requires nside to be a power of two.
    pub fn new(nside: u64, ordering: Ordering) -> Result<Self, CatalogueError> {
        if nside == 0 || nside > MAX_NSIDE {
            return Err(CatalogueError::map_load(format!(
                "nside {nside} outside the supported range 1..={MAX_NSIDE}"
            )));
        }
        if ordering == Ordering::Nested && !nside.is_power_of_two() {
            return Err(CatalogueError::map_load(format!(
                "nside {nside} is not a power of two, required for NESTED ordering"
            )));
        }
        Ok(Self { nside, ordering })
    }

    /// Infer the pixelization from a map length (`npix = 12 * nside^2`)
    pub fn from_npix(npix: usize, ordering: Ordering) -> Result<Self, CatalogueError> {
        let nside = isqrt(npix as u64 / 12);
        if nside == 0 || 12 * nside * nside != npix as u64 {
            return Err(CatalogueError::map_load(format!(
                "{npix} pixels is not a valid HEALPix map size"
            )));
        }
        Self::new(nside, ordering)
    }

    pub fn nside(&self) -> u64 {
        self.nside
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn npix(&self) -> u64 {
        12 * self.nside * self.nside
    }

    /// Centre of pixel `pix` as `(theta, phi)` in radians.
    ///
    /// `pix` must be below [`Healpix::npix`].
    pub fn pix2ang(&self, pix: u64) -> (f64, f64) {
        debug_assert!(pix < self.npix(), "pixel {pix} out of range");
        match self.ordering {
            Ordering::Ring => pix2ang_ring(self.nside, pix),
            Ordering::Nested => pix2ang_nest(self.nside, pix),
        }
    }
}

fn pix2ang_ring(nside: u64, pix: u64) -> (f64, f64) {
    let npix = 12 * nside * nside;
    let ncap = 2 * nside * (nside - 1);
    let fact2 = 4.0 / npix as f64;
    let fact1 = (2 * nside) as f64 * fact2;

    if pix < ncap {
        // North polar cap
        let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
        let iphi = pix + 1 - 2 * iring * (iring - 1);
        let z = 1.0 - (iring * iring) as f64 * fact2;
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (theta_from_z(z), phi)
    } else if pix < npix - ncap {
        // Equatorial belt
        let nl4 = 4 * nside;
        let ip = pix - ncap;
        let tmp = ip / nl4;
        let iring = tmp + nside;
        let iphi = ip - nl4 * tmp + 1;
        let fodd = if (iring + nside) & 1 == 1 { 1.0 } else { 0.5 };
        let z = (2 * nside as i64 - iring as i64) as f64 * fact1;
        let phi = (iphi as f64 - fodd) * PI * 0.75 * fact1;
        (theta_from_z(z), phi)
    } else {
        // South polar cap, rings counted from the south pole
        let ip = npix - pix;
        let iring = (1 + isqrt(2 * ip - 1)) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        let z = (iring * iring) as f64 * fact2 - 1.0;
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (theta_from_z(z), phi)
    }
}

fn pix2ang_nest(nside: u64, pix: u64) -> (f64, f64) {
    let order = nside.trailing_zeros();
    let npface = nside * nside;
    let face = (pix >> (2 * order)) as usize;
    let ipf = pix & (npface - 1);
    let ix = compress_bits(ipf, order) as i64;
    let iy = compress_bits(ipf >> 1, order) as i64;

    let nside_i = nside as i64;
    let nl4 = 4 * nside_i;
    let fact2 = 4.0 / (12 * npface) as f64;
    let fact1 = (2 * nside) as f64 * fact2;

    let jr = JRLL[face] * nside_i - ix - iy - 1;
    let (nr, z, kshift) = if jr < nside_i {
        (jr, 1.0 - (jr * jr) as f64 * fact2, 0)
    } else if jr > 3 * nside_i {
        let nr = nl4 - jr;
        (nr, (nr * nr) as f64 * fact2 - 1.0, 0)
    } else {
        (nside_i, (2 * nside_i - jr) as f64 * fact1, (jr - nside_i) & 1)
    };

    let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
    if jp > nl4 {
        jp -= nl4;
    }
    if jp < 1 {
        jp += nl4;
    }
    let phi = (jp as f64 - (kshift + 1) as f64 * 0.5) * (FRAC_PI_2 / nr as f64);
    (theta_from_z(z), phi)
}

/// Colatitude from z = cos(theta), accurate near the poles
fn theta_from_z(z: f64) -> f64 {
    ((1.0 - z) * (1.0 + z)).sqrt().atan2(z)
}

/// Gather the even-position bits of `v` (inverse of the Z-order interleave)
fn compress_bits(v: u64, order: u32) -> u64 {
    let mut result = 0;
    for i in 0..order {
        result |= ((v >> (2 * i)) & 1) << i;
    }
    result
}

fn isqrt(v: u64) -> u64 {
    let mut root = (v as f64).sqrt() as u64;
    while root * root > v {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= v {
        root += 1;
    }
    root
}

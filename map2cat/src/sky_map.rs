//! Pixel map access.
//!
//! The generator only needs three capabilities from a map: its pixel count,
//! the value stored at a pixel, and the sky position of a pixel. [`SkyMap`]
//! exposes exactly those, so synthetic in-memory maps and maps loaded from
//! disk are interchangeable.

use crate::error::CatalogueError;
use crate::healpix::{Healpix, Ordering};

/// Read access to one pixelized sky map
pub trait SkyMap {
    /// Number of pixels in the map
    fn npix(&self) -> usize;

    /// Value stored at pixel `index`, with `index < npix()`
    fn value_at(&self, index: usize) -> f64;

    /// Pixel centre as `(theta, phi)` in radians
    fn pixel_to_angle(&self, index: usize) -> (f64, f64);

    /// Whether `other` uses the same pixel-to-angle mapping as `self`
    fn same_pixelization(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.npix() == other.npix()
    }
}

/// In-memory HEALPix map of f64 values
#[derive(Debug, Clone, PartialEq)]
pub struct HealpixMap {
    geometry: Healpix,
    values: Vec<f64>,
}

impl HealpixMap {
    /// Wrap `values` with the given pixelization.
    ///
    /// Fails if the number of values is not `geometry.npix()`.
    pub fn new(geometry: Healpix, values: Vec<f64>) -> Result<Self, CatalogueError> {
        if values.len() as u64 != geometry.npix() {
            return Err(CatalogueError::map_load(format!(
                "map has {} values but nside {} needs {}",
                values.len(),
                geometry.nside(),
                geometry.npix()
            )));
        }
        Ok(Self { geometry, values })
    }

    /// Wrap `values`, inferring nside from their count
    pub fn from_values(values: Vec<f64>, ordering: Ordering) -> Result<Self, CatalogueError> {
        let geometry = Healpix::from_npix(values.len(), ordering)?;
        Ok(Self { geometry, values })
    }

    /// Map of `geometry.npix()` pixels all holding `value`
    pub fn filled(geometry: Healpix, value: f64) -> Self {
        Self {
            geometry,
            values: vec![value; geometry.npix() as usize],
        }
    }

    pub fn geometry(&self) -> Healpix {
        self.geometry
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl SkyMap for HealpixMap {
    fn npix(&self) -> usize {
        self.values.len()
    }

    fn value_at(&self, index: usize) -> f64 {
        self.values[index]
    }

    fn pixel_to_angle(&self, index: usize) -> (f64, f64) {
        self.geometry.pix2ang(index as u64)
    }

    fn same_pixelization(&self, other: &Self) -> bool {
        self.geometry == other.geometry
    }
}

/// The three aligned maps a catalogue is generated from.
///
/// Positions are always taken from the count map; construction guarantees
/// the shape maps share its pixelization.
#[derive(Debug, Clone)]
pub struct MapTriplet<M: SkyMap> {
    counts: M,
    shape1: M,
    shape2: M,
}

impl<M: SkyMap> MapTriplet<M> {
    /// Bundle a count map with its two shape-component maps
    pub fn new(counts: M, shape1: M, shape2: M) -> Result<Self, CatalogueError> {
        for (name, shape) in [("first", &shape1), ("second", &shape2)] {
            if shape.npix() != counts.npix() {
                return Err(CatalogueError::map_load(format!(
                    "{name} shape map has {} pixels, count map has {}",
                    shape.npix(),
                    counts.npix()
                )));
            }
            if !counts.same_pixelization(shape) {
                return Err(CatalogueError::map_load(format!(
                    "{name} shape map uses a different pixelization from the count map"
                )));
            }
        }
        Ok(Self {
            counts,
            shape1,
            shape2,
        })
    }

    pub fn npix(&self) -> usize {
        self.counts.npix()
    }

    pub fn counts(&self) -> &M {
        &self.counts
    }

    pub fn shape1(&self) -> &M {
        &self.shape1
    }

    pub fn shape2(&self) -> &M {
        &self.shape2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(nside: u64) -> Healpix {
        Healpix::new(nside, Ordering::Ring).unwrap()
    }

    #[test]
    fn test_healpix_map_length_checked() {
        assert!(HealpixMap::new(ring(1), vec![0.0; 12]).is_ok());
        let err = HealpixMap::new(ring(1), vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, CatalogueError::MapLoad(_)));
    }

    #[test]
    fn test_from_values_infers_nside() {
        let map = HealpixMap::from_values(vec![1.0; 48], Ordering::Nested).unwrap();
        assert_eq!(map.geometry().nside(), 2);
        assert_eq!(map.geometry().ordering(), Ordering::Nested);
        assert_eq!(map.npix(), 48);
        assert_eq!(map.value_at(47), 1.0);
    }

    #[test]
    fn test_triplet_rejects_mismatched_sizes() {
        let counts = HealpixMap::filled(ring(2), 1.0);
        let e1 = HealpixMap::filled(ring(2), 0.0);
        let e2 = HealpixMap::filled(ring(1), 0.0);
        let err = MapTriplet::new(counts, e1, e2).unwrap_err();
        assert!(err.to_string().contains("second shape map has 12 pixels"));
    }

    #[test]
    fn test_triplet_rejects_mixed_ordering() {
        let counts = HealpixMap::filled(ring(2), 1.0);
        let e1 = HealpixMap::filled(Healpix::new(2, Ordering::Nested).unwrap(), 0.0);
        let e2 = HealpixMap::filled(ring(2), 0.0);
        let err = MapTriplet::new(counts, e1, e2).unwrap_err();
        assert!(err.to_string().contains("different pixelization"));
    }

    #[test]
    fn test_triplet_accessors() {
        let maps = MapTriplet::new(
            HealpixMap::filled(ring(1), 3.0),
            HealpixMap::filled(ring(1), 0.1),
            HealpixMap::filled(ring(1), -0.1),
        )
        .unwrap();
        assert_eq!(maps.npix(), 12);
        assert_eq!(maps.counts().value_at(5), 3.0);
        assert_eq!(maps.shape1().value_at(5), 0.1);
        assert_eq!(maps.shape2().value_at(5), -0.1);
    }
}

//! Synthetic catalogue generation.
//!
//! Walks the count map in ascending pixel order and, for every pixel, draws
//! as many galaxies as the pixel value asks for. Each galaxy takes three
//! draws from the generator's random stream, always in the same order:
//!
//! 1. redshift `z ~ U[z_min, z_max)`
//! 2. `n1 ~ N(0, 1)`, giving `e1 = e1_map + n1 * sigma_e`
//! 3. `n2 ~ N(0, 1)`, giving `e2 = e2_map + n2 * sigma_e`
//!
//! Keeping this order fixed is what makes a run reproducible from its seed.
//! Records are handed to a [`RecordSink`] as soon as they are drawn, so the
//! catalogue is never held in memory.

use crate::config::GenerationConfig;
use crate::coords::{pixel_to_radec, SkyPosition};
use crate::error::CatalogueError;
use crate::sky_map::{MapTriplet, SkyMap};
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, info, warn};

/// One synthetic galaxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogueRecord {
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
    /// Redshift
    pub z: f64,
    /// First shape component
    pub e1: f64,
    /// Second shape component
    pub e2: f64,
}

/// Consumer of generated records, called once per galaxy in emission order
pub trait RecordSink {
    fn accept(&mut self, record: &CatalogueRecord) -> Result<(), CatalogueError>;
}

impl RecordSink for Vec<CatalogueRecord> {
    fn accept(&mut self, record: &CatalogueRecord) -> Result<(), CatalogueError> {
        self.push(*record);
        Ok(())
    }
}

/// Number of galaxies requested by a raw count-map value.
///
/// Negative and non-finite values (including the HEALPix `UNSEEN` sentinel)
/// give zero galaxies; anything else is truncated toward zero.
pub fn galaxy_count(raw: f64) -> u64 {
    if is_clamped(raw) {
        0
    } else {
        raw.trunc() as u64
    }
}

/// Per-pixel count above which a map is almost certainly not a galaxy-count map
pub const OVERSIZED_PIXEL_COUNT: u64 = 1_000_000_000;

/// Whether `raw` is a count-map value that [`galaxy_count`] clamps to zero
pub fn is_clamped(raw: f64) -> bool {
    !raw.is_finite() || raw < 0.0
}

/// Totals for a finished generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Pixels visited
    pub pixels: usize,
    /// Records emitted
    pub galaxies: u64,
    /// Pixels whose count was negative or non-finite
    pub clamped_pixels: usize,
    /// Pixels asking for more than [`OVERSIZED_PIXEL_COUNT`] galaxies
    pub oversized_pixels: usize,
}

impl GenerationSummary {
    pub(crate) fn merge(&mut self, other: &GenerationSummary) {
        self.pixels += other.pixels;
        self.galaxies += other.galaxies;
        self.clamped_pixels += other.clamped_pixels;
        self.oversized_pixels += other.oversized_pixels;
    }
}

/// Per-galaxy sampling shared by the sequential and parallel drivers
#[derive(Debug, Clone)]
pub(crate) struct PixelSampler {
    z_dist: Uniform<f64>,
    sigma_e: f64,
}

impl PixelSampler {
    pub(crate) fn new(config: &GenerationConfig) -> Self {
        let bounds = config.bounds();
        Self {
            z_dist: Uniform::new(bounds.min(), bounds.max()),
            sigma_e: config.sigma_e(),
        }
    }

    /// Emit every galaxy of pixel `index` into `sink`, recording totals in `summary`
    pub(crate) fn sample_pixel<M, R, S>(
        &self,
        rng: &mut R,
        maps: &MapTriplet<M>,
        index: usize,
        sink: &mut S,
        summary: &mut GenerationSummary,
    ) -> Result<(), CatalogueError>
    where
        M: SkyMap,
        R: Rng + ?Sized,
        S: RecordSink + ?Sized,
    {
        summary.pixels += 1;

        let raw = maps.counts().value_at(index);
        if is_clamped(raw) {
            debug!("Pixel {} has count {}, emitting no galaxies", index, raw);
            summary.clamped_pixels += 1;
            return Ok(());
        }
        let count = galaxy_count(raw);
        if count == 0 {
            return Ok(());
        }
        if count > OVERSIZED_PIXEL_COUNT {
            warn!(
                "Pixel {} asks for {} galaxies (map value {}); check the count map",
                index, count, raw
            );
            summary.oversized_pixels += 1;
        }

        let e1_base = maps.shape1().value_at(index);
        let e2_base = maps.shape2().value_at(index);
        let SkyPosition { ra, dec } = pixel_to_radec(maps.counts(), index);

        for _ in 0..count {
            let z = self.z_dist.sample(rng);
            let n1: f64 = StandardNormal.sample(rng);
            let n2: f64 = StandardNormal.sample(rng);
            sink.accept(&CatalogueRecord {
                ra,
                dec,
                z,
                e1: e1_base + n1 * self.sigma_e,
                e2: e2_base + n2 * self.sigma_e,
            })?;
        }
        summary.galaxies += count;
        Ok(())
    }
}

/// Sequential catalogue generator owning the run's random stream
pub struct CatalogueGenerator {
    sampler: PixelSampler,
    rng: ChaCha8Rng,
}

impl CatalogueGenerator {
    /// Create a generator whose random stream is seeded from `config.seed()`
    pub fn new(config: &GenerationConfig) -> Self {
        info!(
            "Random seed {}, z bounds [{}), sigma_e {}",
            config.seed(),
            config.bounds(),
            config.sigma_e()
        );
        Self {
            sampler: PixelSampler::new(config),
            rng: ChaCha8Rng::seed_from_u64(config.seed()),
        }
    }

    /// Generate the whole catalogue into `sink`.
    ///
    /// Pixels are visited in ascending order; within a pixel records appear
    /// in draw order. Only errors raised by `sink` can abort the run.
    pub fn run<M, S>(
        mut self,
        maps: &MapTriplet<M>,
        sink: &mut S,
    ) -> Result<GenerationSummary, CatalogueError>
    where
        M: SkyMap,
        S: RecordSink + ?Sized,
    {
        info!("Number of pixels in the map is {}", maps.npix());

        let mut summary = GenerationSummary::default();
        for index in 0..maps.npix() {
            self.sampler
                .sample_pixel(&mut self.rng, maps, index, sink, &mut summary)?;
        }

        info!(
            "Generated {} galaxies from {} pixels ({} clamped to zero)",
            summary.galaxies, summary.pixels, summary.clamped_pixels
        );
        Ok(summary)
    }
}

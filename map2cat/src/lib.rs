//! Synthetic galaxy catalogues from HEALPix count and shape maps
//!
//! Turns a galaxy-count map plus two shape-component maps into a point-source
//! catalogue with one `(ra, dec, z, e1, e2)` row per synthetic galaxy. Each
//! pixel contributes as many galaxies as its count value, all placed at the
//! pixel centre, with redshifts drawn uniformly from the configured range and
//! Gaussian shape noise added to the pixel's mean shape.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | INI [`ConfigSource`](config::ConfigSource), [`GenerationConfig`], [`JobConfig`] |
//! | [`bounds`] | Redshift range parsing |
//! | [`healpix`] | RING/NESTED pixel geometry |
//! | [`sky_map`] | [`SkyMap`] trait, [`HealpixMap`], [`MapTriplet`] |
//! | [`coords`] | Pixel to `(ra, dec)` conversion |
//! | [`generator`] | Seeded sequential generation |
//! | [`parallel`] | Chunked generation over a rayon pool |
//! | [`writer`] | Delimited-text output |
//! | [`job`] | End-to-end runs with partial-file cleanup |
//! | `io` | FITS map loading (feature `fits`) |
//!
//! # Features
//!
//! - **`fits`**: Enables reading HEALPix maps from FITS files and the
//!   `map2cat` binary. Requires cfitsio (built from source by `fitsio-src`).

pub mod bounds;
pub mod config;
pub mod coords;
pub mod error;
pub mod generator;
pub mod healpix;
#[cfg(feature = "fits")]
pub mod io;
pub mod job;
pub mod parallel;
pub mod sky_map;
pub mod writer;

pub use bounds::{parse_bounds, RedshiftBounds};
pub use config::{ConfigSource, GenerationConfig, IniConfig, JobConfig};
pub use coords::{pixel_to_radec, SkyPosition};
pub use error::CatalogueError;
pub use generator::{
    galaxy_count, CatalogueGenerator, CatalogueRecord, GenerationSummary, RecordSink,
};
pub use healpix::{Healpix, Ordering};
pub use job::{write_catalogue, ExecutionMode};
pub use parallel::{generate_parallel, ParallelOptions};
pub use sky_map::{HealpixMap, MapTriplet, SkyMap};
pub use writer::{format_significant, CatalogueWriter};

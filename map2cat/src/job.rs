//! End-to-end catalogue runs.
//!
//! Opens the catalogue file, drives the sequential or parallel generator into
//! it, and removes the partial file if anything fails after it was created.

use crate::config::GenerationConfig;
use crate::error::CatalogueError;
use crate::generator::{CatalogueGenerator, GenerationSummary};
use crate::parallel::{generate_parallel, ParallelOptions};
use crate::sky_map::{MapTriplet, SkyMap};
use crate::writer::CatalogueWriter;
use std::path::Path;
use tracing::{info, warn};

/// How pixels are scheduled during generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One random stream, pixels in index order; byte-reproducible from the seed
    #[default]
    Sequential,
    /// Chunked fan-out over a worker pool, see [`crate::parallel`]
    Parallel(ParallelOptions),
}

/// Generate the catalogue described by `config` from `maps` into its output file
pub fn write_catalogue<M>(
    config: &GenerationConfig,
    maps: &MapTriplet<M>,
    mode: ExecutionMode,
) -> Result<GenerationSummary, CatalogueError>
where
    M: SkyMap + Sync,
{
    let path = config.output_path();
    info!("Delimiter for separation is '{}'", config.delimiter());
    let mut writer = CatalogueWriter::create(path, config.delimiter())?;

    let result = match mode {
        ExecutionMode::Sequential => CatalogueGenerator::new(config).run(maps, &mut writer),
        ExecutionMode::Parallel(options) => {
            generate_parallel(config, maps, &mut writer, options)
        }
    }
    .and_then(|summary| writer.finish().map(|_| summary));

    match result {
        Ok(summary) => {
            info!(
                "Wrote {} galaxies to {}",
                summary.galaxies,
                path.display()
            );
            Ok(summary)
        }
        Err(e) => {
            discard_partial(path);
            Err(e)
        }
    }
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => warn!("Removed partial catalogue {}", path.display()),
        Err(e) => warn!(
            "Generation failed and partial catalogue {} could not be removed: {}",
            path.display(),
            e
        ),
    }
}

/// Load the maps named by `job` and write its catalogue
#[cfg(feature = "fits")]
pub fn run_job(
    job: &crate::config::JobConfig,
    mode: ExecutionMode,
) -> Result<GenerationSummary, CatalogueError> {
    info!("Reading the maps from {}", job.map_file.display());
    let maps = crate::io::fits::read_healpix_maps(&job.map_file)?;
    write_catalogue(&job.generation, &maps, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::RedshiftBounds;
    use crate::healpix::{Healpix, Ordering};
    use crate::sky_map::HealpixMap;

    fn maps() -> MapTriplet<HealpixMap> {
        let geometry = Healpix::new(2, Ordering::Ring).unwrap();
        MapTriplet::new(
            HealpixMap::filled(geometry, 2.0),
            HealpixMap::filled(geometry, 0.0),
            HealpixMap::filled(geometry, 0.0),
        )
        .unwrap()
    }

    fn config(path: &Path) -> GenerationConfig {
        let bounds = RedshiftBounds::new(0.0, 1.0).unwrap();
        GenerationConfig::new(bounds, 42, 0.1, path, ",").unwrap()
    }

    #[test]
    fn test_sequential_job_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.dat");
        let summary = write_catalogue(&config(&path), &maps(), ExecutionMode::Sequential).unwrap();

        assert_eq!(summary.galaxies, 96);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 97);
        assert!(text.starts_with("#ra,dec,z,e1,e2\n"));
    }

    #[test]
    fn test_parallel_job_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.dat");
        let mode = ExecutionMode::Parallel(ParallelOptions {
            chunk_pixels: 5,
            threads: Some(2),
        });
        let summary = write_catalogue(&config(&path), &maps(), mode).unwrap();
        assert_eq!(summary.galaxies, 96);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 97);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("cat.dat");
        let err = write_catalogue(&config(&path), &maps(), ExecutionMode::Sequential).unwrap_err();
        assert!(matches!(err, CatalogueError::OutputOpen { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_partial_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.dat");
        std::fs::write(&path, "#ra,dec,z,e1,e2\n1,2,").unwrap();
        discard_partial(&path);
        assert!(!path.exists());

        // A second attempt only logs
        discard_partial(&path);
    }
}

//! End-to-end catalogue generation against in-memory maps

use map2cat::writer::SIGNIFICANT_DIGITS;
use map2cat::{
    format_significant, pixel_to_radec, write_catalogue, ExecutionMode, GenerationConfig,
    Healpix, HealpixMap, IniConfig, JobConfig, MapTriplet, Ordering, ParallelOptions,
    RedshiftBounds, SkyMap,
};
use std::path::Path;

/// One-pixel map placed away from the poles
struct OnePixel {
    value: f64,
}

impl SkyMap for OnePixel {
    fn npix(&self) -> usize {
        1
    }

    fn value_at(&self, _index: usize) -> f64 {
        self.value
    }

    fn pixel_to_angle(&self, _index: usize) -> (f64, f64) {
        (1.1, 2.3)
    }
}

fn one_pixel_maps(count: f64, e1: f64, e2: f64) -> MapTriplet<OnePixel> {
    MapTriplet::new(
        OnePixel { value: count },
        OnePixel { value: e1 },
        OnePixel { value: e2 },
    )
    .unwrap()
}

fn ring_maps(nside: u64, counts: Vec<f64>) -> MapTriplet<HealpixMap> {
    let geometry = Healpix::new(nside, Ordering::Ring).unwrap();
    MapTriplet::new(
        HealpixMap::new(geometry, counts).unwrap(),
        HealpixMap::filled(geometry, 0.02),
        HealpixMap::filled(geometry, -0.01),
    )
    .unwrap()
}

fn config(path: &Path, z: (f64, f64), seed: u64, sigma_e: f64) -> GenerationConfig {
    let bounds = RedshiftBounds::new(z.0, z.1).unwrap();
    GenerationConfig::new(bounds, seed, sigma_e, path, ",").unwrap()
}

fn rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .skip(1)
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[test]
fn test_single_pixel_without_noise() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.dat");
    let maps = one_pixel_maps(2.0, 0.1, -0.2);

    let summary = write_catalogue(
        &config(&path, (0.5, 0.6), 1234, 0.0),
        &maps,
        ExecutionMode::Sequential,
    )
    .unwrap();
    assert_eq!(summary.galaxies, 2);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("#ra,dec,z,e1,e2"));

    let position = pixel_to_radec(maps.counts(), 0);
    let ra = format_significant(position.ra, SIGNIFICANT_DIGITS);
    let dec = format_significant(position.dec, SIGNIFICANT_DIGITS);

    let rows = rows(&text);
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.len(), 5);
        assert_eq!(row[0], ra);
        assert_eq!(row[1], dec);
        let z: f64 = row[2].parse().unwrap();
        assert!((0.5..0.6).contains(&z), "z = {z}");
        assert_eq!(row[3], "0.1");
        assert_eq!(row[4], "-0.2");
    }
}

#[test]
fn test_same_seed_gives_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.dat");
    let second = dir.path().join("second.dat");
    let counts = (0..48).map(|i| (i % 4) as f64).collect::<Vec<_>>();
    let maps = ring_maps(2, counts);

    write_catalogue(
        &config(&first, (0.0, 2.0), 7, 0.25),
        &maps,
        ExecutionMode::Sequential,
    )
    .unwrap();
    write_catalogue(
        &config(&second, (0.0, 2.0), 7, 0.25),
        &maps,
        ExecutionMode::Sequential,
    )
    .unwrap();

    let a = std::fs::read(&first).unwrap();
    let b = std::fs::read(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_negative_count_pixel_emits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.dat");
    let maps = one_pixel_maps(-3.0, 0.1, 0.1);

    let summary = write_catalogue(
        &config(&path, (0.5, 0.6), 1, 0.3),
        &maps,
        ExecutionMode::Sequential,
    )
    .unwrap();

    assert_eq!(summary.galaxies, 0);
    assert_eq!(summary.clamped_pixels, 1);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "#ra,dec,z,e1,e2\n");
}

#[test]
fn test_parallel_rows_stay_in_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.dat");
    let counts = (0..192).map(|i| (i % 3) as f64).collect::<Vec<_>>();
    let maps = ring_maps(4, counts);
    let mode = ExecutionMode::Parallel(ParallelOptions {
        chunk_pixels: 16,
        threads: Some(3),
    });

    let summary = write_catalogue(&config(&path, (0.9, 1.1), 99, 0.2), &maps, mode).unwrap();
    assert_eq!(summary.galaxies, 192);

    let text = std::fs::read_to_string(&path).unwrap();
    let rows = rows(&text);
    assert_eq!(rows.len(), 192);
    for row in rows {
        let ra: f64 = row[0].parse().unwrap();
        let dec: f64 = row[1].parse().unwrap();
        let z: f64 = row[2].parse().unwrap();
        assert!((0.0..360.0).contains(&ra));
        assert!((-90.0..=90.0).contains(&dec));
        assert!((0.9..1.1).contains(&z), "z = {z}");
    }
}

#[test]
fn test_ini_config_drives_generation() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("from_ini.dat");
    let text = format!(
        "[input]\n\
         data_map_file_name = maps.fits\n\
         z_bounds = 0.2, 0.4\n\
         rand_seed = 5\n\
         sigma_e = 0.0\n\
         \n\
         [output]\n\
         {} = {}\n\
         delimiter = |\n",
        map2cat::config::LEGACY_CATALOGUE_KEY,
        output.display()
    );

    let job = JobConfig::from_source(&IniConfig::parse(&text).unwrap()).unwrap();
    assert_eq!(job.map_file, Path::new("maps.fits"));
    assert_eq!(job.generation.output_path(), output.as_path());

    let maps = one_pixel_maps(3.0, 0.25, 0.5);
    write_catalogue(&job.generation, &maps, ExecutionMode::Sequential).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("#ra|dec|z|e1|e2"));
    let body: Vec<&str> = lines.collect();
    assert_eq!(body.len(), 3);
    for line in body {
        let fields: Vec<&str> = line.split('|').collect();
        assert_eq!(fields[3], "0.25");
        assert_eq!(fields[4], "0.5");
    }
}

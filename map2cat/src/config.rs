//! Run configuration.
//!
//! Values are read once from a sectioned key/value store through
//! [`ConfigSource`] and frozen into a [`JobConfig`] before any map is touched.
//! The on-disk format is an INI file:
//!
//! ```ini
//! [input]
//! data_map_file_name = maps.fits
//! z_bounds = 0.5,1.0
//! rand_seed = 42
//! sigma_e = 0.3
//!
//! [output]
//! catalogue_file_name = catalogue.dat
//! delimiter = ,
//! ```

use crate::bounds::{parse_bounds, RedshiftBounds};
use crate::error::CatalogueError;
use ini::Ini;
use std::path::{Path, PathBuf};

/// Key under which older config files name the output catalogue
pub const LEGACY_CATALOGUE_KEY: &str = "catlogue_file_name";

/// Typed lookups into a sectioned configuration store
pub trait ConfigSource {
    /// Raw string value of `section.key`, if present
    fn get_str(&self, section: &str, key: &str) -> Option<&str>;

    /// String value of `section.key`, failing if absent
    fn require_str(&self, section: &str, key: &str) -> Result<&str, CatalogueError> {
        self.get_str(section, key)
            .ok_or_else(|| CatalogueError::config(format!("Missing required key {section}.{key}")))
    }

    fn require_f64(&self, section: &str, key: &str) -> Result<f64, CatalogueError> {
        let raw = self.require_str(section, key)?;
        raw.trim().parse::<f64>().map_err(|_| {
            CatalogueError::config(format!("{section}.{key} = '{raw}' is not a number"))
        })
    }

    fn require_u64(&self, section: &str, key: &str) -> Result<u64, CatalogueError> {
        let raw = self.require_str(section, key)?;
        raw.trim().parse::<u64>().map_err(|_| {
            CatalogueError::config(format!(
                "{section}.{key} = '{raw}' is not a non-negative integer"
            ))
        })
    }
}

/// Configuration store backed by an INI document
#[derive(Debug, Clone)]
pub struct IniConfig {
    ini: Ini,
}

impl IniConfig {
    /// Load an INI file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| {
            CatalogueError::config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Ok(Self { ini })
    }

    /// Parse an INI document held in memory
    pub fn parse(text: &str) -> Result<Self, CatalogueError> {
        let ini = Ini::load_from_str(text)
            .map_err(|e| CatalogueError::config(format!("Malformed config: {e}")))?;
        Ok(Self { ini })
    }
}

impl ConfigSource for IniConfig {
    fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }
}

/// Immutable parameters of one catalogue generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    bounds: RedshiftBounds,
    seed: u64,
    sigma_e: f64,
    output_path: PathBuf,
    delimiter: String,
}

impl GenerationConfig {
    /// Validate and freeze the generation parameters
    pub fn new(
        bounds: RedshiftBounds,
        seed: u64,
        sigma_e: f64,
        output_path: impl Into<PathBuf>,
        delimiter: impl Into<String>,
    ) -> Result<Self, CatalogueError> {
        if !sigma_e.is_finite() || sigma_e < 0.0 {
            return Err(CatalogueError::config(format!(
                "sigma_e must be a finite non-negative number, got {sigma_e}"
            )));
        }
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(CatalogueError::config("output.delimiter must not be empty"));
        }
        let output_path = output_path.into();
        if output_path.as_os_str().is_empty() {
            return Err(CatalogueError::config(
                "output.catalogue_file_name must not be empty",
            ));
        }
        Ok(Self {
            bounds,
            seed,
            sigma_e,
            output_path,
            delimiter,
        })
    }

    /// Read the `[input]` sampling keys and `[output]` keys from `source`
    pub fn from_source<C: ConfigSource + ?Sized>(source: &C) -> Result<Self, CatalogueError> {
        let bounds = parse_bounds(source.require_str("input", "z_bounds")?)?;
        let seed = source.require_u64("input", "rand_seed")?;
        let sigma_e = source.require_f64("input", "sigma_e")?;
        let output_path = match source.get_str("output", "catalogue_file_name") {
            Some(path) => path,
            None => source.require_str("output", LEGACY_CATALOGUE_KEY).map_err(|_| {
                CatalogueError::config("Missing required key output.catalogue_file_name")
            })?,
        };
        let delimiter = source.require_str("output", "delimiter")?;
        Self::new(bounds, seed, sigma_e, output_path.trim(), delimiter)
    }

    pub fn bounds(&self) -> RedshiftBounds {
        self.bounds
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sigma_e(&self) -> f64 {
        self.sigma_e
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

/// Everything one run reads from the configuration store
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    /// Map container holding the count and shape fields
    pub map_file: PathBuf,
    pub generation: GenerationConfig,
}

impl JobConfig {
    pub fn from_source<C: ConfigSource + ?Sized>(source: &C) -> Result<Self, CatalogueError> {
        let map_file = source.require_str("input", "data_map_file_name")?.trim();
        if map_file.is_empty() {
            return Err(CatalogueError::config(
                "input.data_map_file_name must not be empty",
            ));
        }
        Ok(Self {
            map_file: PathBuf::from(map_file),
            generation: GenerationConfig::from_source(source)?,
        })
    }
}

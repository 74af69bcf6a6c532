//! HEALPix map I/O for FITS binary tables
//!
//! A HEALPix map file keeps its pixels in the binary table of the second HDU,
//! with `NSIDE` and `ORDERING` header keywords. The count field is the first
//! column; the two shape fields are the second and third columns (the Q and U
//! polarisation slots of a standard polarised map). Columns stored with a
//! repeat count (`1024E` style) are read as one flat sequence of pixels.

use crate::error::CatalogueError;
use crate::healpix::{Healpix, Ordering};
use crate::sky_map::{HealpixMap, MapTriplet};
use fitsio::hdu::HduInfo;
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;
use std::path::Path;
use tracing::info;

/// Zero-based index of the HDU holding the map table
pub const MAP_HDU: usize = 1;

/// Column names used by [`write_healpix_maps`]
pub const COLUMN_NAMES: [&str; 3] = ["N", "E1", "E2"];

fn fits_error(path: &Path, what: &str, err: fitsio::errors::Error) -> CatalogueError {
    CatalogueError::map_load(format!("{} ({}): {err}", what, path.display()))
}

/// Read the count map and both shape maps from a HEALPix FITS file
pub fn read_healpix_maps<P: AsRef<Path>>(
    path: P,
) -> Result<MapTriplet<HealpixMap>, CatalogueError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogueError::map_load(format!(
            "map file {} does not exist",
            path.display()
        )));
    }

    let mut fptr = FitsFile::open(path).map_err(|e| fits_error(path, "cannot open", e))?;
    let hdu = fptr
        .hdu(MAP_HDU)
        .map_err(|e| fits_error(path, "no map table", e))?;

    let nside: i64 = hdu
        .read_key(&mut fptr, "NSIDE")
        .map_err(|e| fits_error(path, "missing NSIDE", e))?;
    let ordering: String = hdu
        .read_key(&mut fptr, "ORDERING")
        .map_err(|e| fits_error(path, "missing ORDERING", e))?;
    let ordering: Ordering = ordering.parse().map_err(CatalogueError::MapLoad)?;
    if nside <= 0 {
        return Err(CatalogueError::map_load(format!(
            "NSIDE = {nside} in {}",
            path.display()
        )));
    }
    let geometry = Healpix::new(nside as u64, ordering)?;

    let (columns, num_rows) = match &hdu.info {
        HduInfo::TableInfo {
            column_descriptions,
            num_rows,
        } => (column_descriptions.as_slice(), *num_rows),
        _ => {
            return Err(CatalogueError::map_load(format!(
                "HDU {MAP_HDU} of {} is not a table",
                path.display()
            )))
        }
    };
    if columns.len() < 3 {
        return Err(CatalogueError::map_load(format!(
            "{} has {} columns, need a count column and two shape columns",
            path.display(),
            columns.len()
        )));
    }
    let columns = &columns[..3];
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    // Column reads run over elements, continuing into the next row once a
    // row's repeat count is exhausted, so each field must hold exactly npix
    // elements.
    let npix = geometry.npix() as usize;
    for column in columns {
        let elements = num_rows * column.data_type.repeat;
        if elements != npix {
            return Err(CatalogueError::map_load(format!(
                "column {} of {} holds {} values ({} rows of {}), nside {} needs {}",
                column.name,
                path.display(),
                elements,
                num_rows,
                column.data_type.repeat,
                geometry.nside(),
                npix
            )));
        }
    }

    info!(
        "Map table has nside {} ({} ordering), fields {:?}",
        geometry.nside(),
        geometry.ordering(),
        names
    );

    let mut fields = Vec::with_capacity(3);
    for name in names {
        let values: Vec<f64> = hdu
            .read_col_range(&mut fptr, name, &(0..npix))
            .map_err(|e| fits_error(path, &format!("cannot read column {name}"), e))?;
        fields.push(HealpixMap::new(geometry, values)?);
    }

    let mut fields = fields.into_iter();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(counts), Some(e1), Some(e2)) => MapTriplet::new(counts, e1, e2),
        _ => Err(CatalogueError::map_load("map table is incomplete")),
    }
}

/// Write three aligned maps as a HEALPix FITS binary table, one pixel per row
pub fn write_healpix_maps<P: AsRef<Path>>(
    maps: &MapTriplet<HealpixMap>,
    path: P,
) -> Result<(), CatalogueError> {
    write_healpix_maps_packed(maps, path, 1)
}

/// Write three aligned maps with `values_per_row` pixels in each table row.
///
/// Full-sky HEALPix files conventionally pack 1024 pixels per row (`1024D`).
/// `values_per_row` must divide the pixel count.
pub fn write_healpix_maps_packed<P: AsRef<Path>>(
    maps: &MapTriplet<HealpixMap>,
    path: P,
    values_per_row: usize,
) -> Result<(), CatalogueError> {
    let path = path.as_ref();
    let geometry = maps.counts().geometry();
    if values_per_row == 0 || maps.npix() % values_per_row != 0 {
        return Err(CatalogueError::map_load(format!(
            "cannot pack {} pixels into rows of {}",
            maps.npix(),
            values_per_row
        )));
    }

    let mut fptr = FitsFile::create(path)
        .overwrite()
        .open()
        .map_err(|e| fits_error(path, "cannot create", e))?;

    let mut descriptions = Vec::with_capacity(COLUMN_NAMES.len());
    for name in COLUMN_NAMES {
        let description = ColumnDescription::new(name)
            .with_type(ColumnDataType::Double)
            .that_repeats(values_per_row)
            .create()
            .map_err(|e| fits_error(path, "bad column description", e))?;
        descriptions.push(description);
    }

    let hdu = fptr
        .create_table("MAP".to_string(), &descriptions)
        .map_err(|e| fits_error(path, "cannot create table", e))?;
    hdu.write_key(&mut fptr, "PIXTYPE", "HEALPIX")
        .map_err(|e| fits_error(path, "cannot write PIXTYPE", e))?;
    hdu.write_key(&mut fptr, "ORDERING", geometry.ordering().to_string())
        .map_err(|e| fits_error(path, "cannot write ORDERING", e))?;
    hdu.write_key(&mut fptr, "NSIDE", geometry.nside() as i64)
        .map_err(|e| fits_error(path, "cannot write NSIDE", e))?;

    // Element-wise writes fill each row's repeat slots before the next row
    for (name, map) in COLUMN_NAMES
        .into_iter()
        .zip([maps.counts(), maps.shape1(), maps.shape2()])
    {
        hdu.write_col(&mut fptr, name, map.values())
            .map_err(|e| fits_error(path, &format!("cannot write column {name}"), e))?;
    }

    info!(
        "Wrote {} pixels per field to {} ({} per row)",
        maps.npix(),
        path.display(),
        values_per_row
    );
    Ok(())
}

//! Map container I/O

pub mod fits;

pub use fits::{read_healpix_maps, write_healpix_maps, write_healpix_maps_packed};

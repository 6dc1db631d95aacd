//! Reads GRIB2 files into datasets of named, coordinate-indexed variables.
//!
//! Fields sharing a parameter and a kind of surface are stacked along time
//! and level axes into one [`Variable`]; latitude and longitude come from the
//! grid definition. Variables can then be selected by coordinate value,
//! combined with scalars, and written back as GRIB2.
//!
//! ```no_run
//! use grib_dataset::SelectOptions;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ds = grib_dataset::open("era5.grib2")?;
//!     let celsius = &ds - 273.15;
//!     let point = celsius.sel(
//!         &[("latitude", 35.7), ("longitude", 139.7)],
//!         SelectOptions::nearest(),
//!     )?;
//!     println!("{:?}", point.get("t2m")?.values());
//!     Ok(())
//! }
//! ```

mod arithmetic;
mod assemble;
mod axis;
pub mod codetables;
mod config;
mod coords;
mod dataset;
mod decoders;
mod encoder;
mod error;
mod grid;
mod reader;
mod sections;
mod utils;
mod variable;

pub use crate::{
    arithmetic::ScalarOp,
    axis::{CoordinateAxis, Method, SelectOptions, TIME_UNITS},
    config::{DecodeOptions, EncodeOptions, Packing},
    coords::Coordinates,
    dataset::Dataset,
    encoder::{to_bytes, write},
    error::*,
    grid::{LatLonGridDefinition, ScanningMode},
    reader::{
        from_bytes, from_bytes_with_options, from_reader, from_reader_with_options, open,
        open_with_options,
    },
    variable::{Attributes, Parameter, Variable},
};

use std::{
    io::{self, Write},
    sync::Arc,
};

use chrono::{TimeZone, Utc};
use grib_dataset::{CoordinateAxis, Dataset, EncodeOptions, Variable};
use ndarray::{ArrayD, IxDyn};
use tempfile::NamedTempFile;

fn field_bytes(name: &str, values: Vec<f64>) -> Vec<u8> {
    let time = CoordinateAxis::from_datetimes(
        "time",
        &[Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()],
    )
    .unwrap();
    let lat = CoordinateAxis::new("latitude", vec![10., 0.]).unwrap();
    let lon = CoordinateAxis::new("longitude", vec![0., 10.]).unwrap();
    let data = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2]), values).unwrap();
    let var = Variable::new(name, vec![Arc::new(time), Arc::new(lat), Arc::new(lon)], data)
        .unwrap();
    let ds = Dataset::from_variables([var]).unwrap();
    grib_dataset::to_bytes(&ds, &EncodeOptions::default()).unwrap()
}

/// GRIB2 bytes of 2 metre temperature on a 2x2 grid at 2024-01-01T00:00Z.
pub(crate) fn t2m_bytes() -> Vec<u8> {
    field_bytes("t2m", vec![270., 271., 272., 273.])
}

// Offset of the template number of Section 5 in a message written by the
// encoder.
const SECT5_TEMPLATE_NUM_OFFSET: usize = 16 + 21 + 72 + 34 + 5 + 4;

/// 2 metre temperature packed with the unsupported template 5.3, followed by
/// mean sea level pressure on the same grid.
pub(crate) fn partly_unsupported_file() -> Result<NamedTempFile, io::Error> {
    let mut t2m = t2m_bytes();
    t2m[SECT5_TEMPLATE_NUM_OFFSET..SECT5_TEMPLATE_NUM_OFFSET + 2].copy_from_slice(&[0, 3]);
    let msl = field_bytes("msl", vec![101325., 101300., 100900., 101010.]);
    write_to_tempfile(&[t2m, msl].concat())
}

pub(crate) fn t2m_file() -> Result<NamedTempFile, io::Error> {
    write_to_tempfile(&t2m_bytes())
}

pub(crate) fn non_grib_file() -> Result<NamedTempFile, io::Error> {
    write_to_tempfile(b"this is not a GRIB2 file\n")
}

fn write_to_tempfile(bytes: &[u8]) -> Result<NamedTempFile, io::Error> {
    let mut out = NamedTempFile::new()?;
    out.write_all(bytes)?;
    Ok(out)
}

#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::Arc,
};

use chrono::{DateTime, TimeZone, Utc};
use flate2::{write::GzEncoder, Compression};
use grib_dataset::{CoordinateAxis, Dataset, EncodeOptions, Parameter, Variable};
use ndarray::{ArrayD, IxDyn};
use tempfile::NamedTempFile;

pub(crate) fn hours(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
}

fn axis(name: &str, values: Vec<f64>) -> Arc<CoordinateAxis> {
    Arc::new(CoordinateAxis::new(name, values).unwrap())
}

fn time_axis(times: &[DateTime<Utc>]) -> Arc<CoordinateAxis> {
    Arc::new(CoordinateAxis::from_datetimes("time", times).unwrap())
}

fn variable(name: &str, axes: Vec<Arc<CoordinateAxis>>, values: Vec<f64>) -> Variable {
    let shape = axes.iter().map(|a| a.len()).collect::<Vec<_>>();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values).unwrap();
    Variable::new(name, axes, data).unwrap()
}

/// 2 metre temperature on a 2x2 grid at a single time.
pub(crate) fn t2m_dataset() -> Dataset {
    let t2m = variable(
        "t2m",
        vec![
            time_axis(&[hours(0)]),
            axis("latitude", vec![10., 0.]),
            axis("longitude", vec![0., 10.]),
        ],
        vec![270., 271., 272., 273.],
    );
    Dataset::from_variables([t2m]).unwrap()
}

/// Mean sea level pressure on the grid of [`t2m_dataset`].
pub(crate) fn msl_dataset() -> Dataset {
    let msl = variable(
        "msl",
        vec![
            time_axis(&[hours(0)]),
            axis("latitude", vec![10., 0.]),
            axis("longitude", vec![0., 10.]),
        ],
        vec![101325., 101300., 100900., 101010.],
    );
    Dataset::from_variables([msl]).unwrap()
}

/// Temperature on two isobaric levels and two times, with a missing point.
pub(crate) fn upper_air_dataset() -> Dataset {
    let values = (0..2 * 2 * 3 * 2)
        .map(|n| if n == 5 { f64::NAN } else { 200. + n as f64 * 0.5 })
        .collect();
    let t = variable(
        "t",
        vec![
            time_axis(&[hours(0), hours(6)]),
            axis("isobaricInhPa", vec![850., 500.]),
            axis("latitude", vec![20., 10., 0.]),
            axis("longitude", vec![100., 110.]),
        ],
        values,
    );
    Dataset::from_variables([t]).unwrap()
}

/// Temperature on two isobaric levels at a single time, missing the same
/// point on both.
pub(crate) fn isobaric_pair_dataset() -> Dataset {
    let t = variable(
        "t",
        vec![
            time_axis(&[hours(0)]),
            axis("isobaricInhPa", vec![850., 500.]),
            axis("latitude", vec![10., 0.]),
            axis("longitude", vec![0., 10.]),
        ],
        vec![280., f64::NAN, 282., 283., 250., f64::NAN, 252., 253.],
    );
    Dataset::from_variables([t]).unwrap()
}

/// Temperature on a single surface of type `surface_type` (Code Table 4.5).
pub(crate) fn temperature_on_surface(surface_type: u8) -> Dataset {
    let t = variable(
        "t",
        vec![
            time_axis(&[hours(0)]),
            axis("latitude", vec![10., 0.]),
            axis("longitude", vec![0., 10.]),
        ],
        vec![220., 221., 222., 223.],
    )
    .with_parameter(Parameter {
        discipline: 0,
        category: 0,
        number: 0,
        surface_type,
        surface_value: None,
    });
    Dataset::from_variables([t]).unwrap()
}

/// Relative and specific humidity, each on two levels of its own surface
/// type without a conventional name.
pub(crate) fn unnamed_levels_dataset() -> Dataset {
    let lat = axis("latitude", vec![10., 0.]);
    let lon = axis("longitude", vec![0., 10.]);
    let time = time_axis(&[hours(0)]);
    let r = variable(
        "r",
        vec![time.clone(), axis("level200", vec![1., 2.]), lat.clone(), lon.clone()],
        vec![10., 20., 30., 40., 50., 60., 70., 80.],
    );
    let q = variable(
        "q",
        vec![time, axis("level204", vec![3., 4.]), lat, lon],
        vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8],
    );
    Dataset::from_variables([r, q]).unwrap()
}

pub(crate) fn encode(ds: &Dataset) -> Vec<u8> {
    grib_dataset::to_bytes(ds, &EncodeOptions::default()).unwrap()
}

/// Splits a stream into its messages.
pub(crate) fn messages(bytes: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let len = u64::from_be_bytes(bytes[pos + 8..pos + 16].try_into().unwrap()) as usize;
        out.push(&bytes[pos..pos + len]);
        pos += len;
    }
    out
}

/// Splits a message into Sections 1 to 7, leaving out Sections 0 and 8.
pub(crate) fn sections(message: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut pos = 16;
    while &message[pos..pos + 4] != b"7777" {
        let len = u32::from_be_bytes(message[pos..pos + 4].try_into().unwrap()) as usize;
        out.push(&message[pos..pos + len]);
        pos += len;
    }
    out
}

/// Builds a message with the indicator of `model` around `sections`.
pub(crate) fn message(model: &[u8], sections: &[&[u8]]) -> Vec<u8> {
    let body = sections.concat();
    let total_length = (16 + body.len() + 4) as u64;
    let mut out = model[..8].to_vec();
    out.extend_from_slice(&total_length.to_be_bytes());
    out.extend(body);
    out.extend_from_slice(b"7777");
    out
}

pub(crate) fn write_to_tempfile(bytes: &[u8]) -> Result<NamedTempFile, io::Error> {
    let mut out = NamedTempFile::new()?;
    out.write_all(bytes)?;
    Ok(out)
}

pub(crate) fn gzip(bytes: &[u8]) -> Result<Vec<u8>, io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Asserts that both datasets have the same variables, axes and values,
/// treating NaN as equal to NaN.
pub(crate) fn assert_same_values(actual: &Dataset, expected: &Dataset) {
    assert_eq!(
        actual.names().collect::<Vec<_>>(),
        expected.names().collect::<Vec<_>>()
    );
    for (name, e) in expected {
        let a = actual.get(name).unwrap();
        assert_eq!(a.dims(), e.dims(), "dims of {name}");
        for (a_axis, e_axis) in a.axes().iter().zip(e.axes()) {
            assert_eq!(a_axis.values(), e_axis.values(), "axis {}", e_axis.name());
        }
        assert_eq!(a.shape(), e.shape());
        for (a, e) in a.values().iter().zip(e.values().iter()) {
            assert!(
                (a.is_nan() && e.is_nan()) || a == e,
                "{name}: {a} != {e}"
            );
        }
    }
}

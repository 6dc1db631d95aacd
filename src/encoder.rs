//! Writes datasets as GRIB2, one message per two-dimensional field.

use std::io::Write;

use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::Axis;
use num::ToPrimitive;
use tracing::debug;

use crate::{
    codetables::{
        lookup_short_name, parse_fallback_short_name, surface_type_of_dim, FixedSurfaceType,
    },
    config::{EncodeOptions, Packing},
    dataset::Dataset,
    decoders::SimplePackingParam,
    error::*,
    grid::LatLonGridDefinition,
    sections::{SECT0_IS_MAGIC, SECT0_IS_SIZE, SECT8_ES_MAGIC, SECT8_ES_SIZE, SECT_HEADER_SIZE},
    utils::{GribUint, NBitwiseWriter},
    variable::{Parameter, Variable},
};

const MASTER_TABLE_VERSION: u8 = 2;

/// Encodes every variable of `dataset` as GRIB2.
///
/// Variables must have the dimensions `(time, latitude, longitude)` or
/// `(time, level, latitude, longitude)` with evenly spaced latitudes and
/// longitudes. NaN values are written as points masked by a bitmap.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use chrono::{TimeZone, Utc};
/// use grib_dataset::{CoordinateAxis, Dataset, EncodeOptions, Variable};
/// use ndarray::{ArrayD, IxDyn};
///
/// let time = CoordinateAxis::from_datetimes(
///     "time",
///     &[Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()],
/// )
/// .unwrap();
/// let lat = CoordinateAxis::new("latitude", vec![10.0, 0.0]).unwrap();
/// let lon = CoordinateAxis::new("longitude", vec![0.0, 10.0]).unwrap();
/// let data = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2]), vec![270.0, 271.0, 272.0, 273.0]).unwrap();
/// let t2m = Variable::new("t2m", vec![Arc::new(time), Arc::new(lat), Arc::new(lon)], data).unwrap();
/// let ds = Dataset::from_variables([t2m]).unwrap();
///
/// let bytes = grib_dataset::to_bytes(&ds, &EncodeOptions::default()).unwrap();
/// let decoded = grib_dataset::from_bytes(&bytes).unwrap();
/// assert_eq!(decoded.get("t2m").unwrap().values(), ds.get("t2m").unwrap().values());
/// ```
pub fn to_bytes(dataset: &Dataset, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for var in dataset.variables() {
        encode_variable(var, options, &mut buf)?;
    }
    Ok(buf)
}

/// Encodes `dataset` as GRIB2 into `writer`.
pub fn write<W: Write>(dataset: &Dataset, mut writer: W, options: &EncodeOptions) -> Result<()> {
    let bytes = to_bytes(dataset, options)?;
    writer.write_all(&bytes)?;
    Ok(())
}

fn encode_variable(var: &Variable, options: &EncodeOptions, buf: &mut Vec<u8>) -> Result<()> {
    let unsupported = || EncodeError::UnsupportedDimensions(var.name().to_owned());
    let dims = var.dims();
    let n = dims.len();
    if !(n == 3 || n == 4)
        || dims[0] != "time"
        || dims[n - 2] != "latitude"
        || dims[n - 1] != "longitude"
    {
        return Err(unsupported().into());
    }

    let axes = var.axes();
    let times = axes[0]
        .datetimes()
        .ok_or(EncodeError::MissingReferenceTime)?;
    let level = (n == 4).then(|| &axes[1]);
    let (lat, lon) = (&axes[n - 2], &axes[n - 1]);
    let grid = LatLonGridDefinition::from_axes(lat.values(), lon.values()).ok_or_else(|| {
        let irregular = if LatLonGridDefinition::from_axes(lat.values(), &[0.]).is_none() {
            lat.name()
        } else {
            lon.name()
        };
        EncodeError::IrregularAxis(irregular.to_owned())
    })?;
    let parameter = resolve_parameter(var, level.map(|a| a.name()))?;
    let surface = FixedSurfaceType::try_from(parameter.surface_type).ok();

    let data = var.values();
    for (t, time) in times.iter().enumerate() {
        let at_time = data.index_axis(Axis(0), t);
        let levels = match level {
            Some(axis) => axis
                .values()
                .iter()
                .map(|v| Some(surface.map_or(*v, |s| s.from_axis_value(*v))))
                .collect(),
            None => vec![parameter.surface_value],
        };
        for (l, surface_value) in levels.into_iter().enumerate() {
            let field = if level.is_some() {
                at_time.index_axis(Axis(0), l)
            } else {
                at_time.view()
            };
            let values = field.iter().copied().collect::<Vec<_>>();
            let field_parameter = Parameter {
                surface_value,
                ..parameter
            };
            encode_message(buf, *time, &grid, &field_parameter, &values, options)
                .map_err(|e| match e {
                    Error::Encode(EncodeError::UnsupportedDimensions(_)) => {
                        Error::from(unsupported())
                    }
                    e => e,
                })?;
            debug!(
                name = var.name(),
                time = %time,
                level = ?surface_value,
                "encoded field"
            );
        }
    }
    Ok(())
}

/// Identity of the fields of `var`, from its decoded parameter or, failing
/// that, from its name.
fn resolve_parameter(var: &Variable, level_dim: Option<&str>) -> Result<Parameter> {
    if let Some(parameter) = var.parameter() {
        return Ok(*parameter);
    }

    let unknown = || EncodeError::UnknownParameter(var.name().to_owned());
    let mut parameter = if let Some(entry) = lookup_short_name(var.name()) {
        Parameter {
            discipline: entry.discipline,
            category: entry.category,
            number: entry.number,
            surface_type: entry
                .surface
                .map_or(FixedSurfaceType::Missing, |(s, _)| s)
                .into(),
            surface_value: entry.surface.and_then(|(_, v)| v),
        }
    } else {
        let (discipline, category, number) =
            parse_fallback_short_name(var.name()).ok_or_else(unknown)?;
        Parameter {
            discipline,
            category,
            number,
            surface_type: FixedSurfaceType::Missing.into(),
            surface_value: None,
        }
    };

    if let Some(dim) = level_dim {
        parameter.surface_type = surface_type_of_dim(dim)
            .ok_or_else(|| EncodeError::UnsupportedDimensions(var.name().to_owned()))?;
        parameter.surface_value = None;
    }
    Ok(parameter)
}

fn encode_message(
    buf: &mut Vec<u8>,
    time: DateTime<Utc>,
    grid: &LatLonGridDefinition,
    parameter: &Parameter,
    values: &[f64],
    options: &EncodeOptions,
) -> Result<()> {
    let mut body = Vec::new();
    push_sect(&mut body, 1, &identification(time, options.centre)?);
    push_sect(&mut body, 3, &grid_definition(grid));
    push_sect(&mut body, 4, &product_definition(parameter)?);

    let present = values.iter().copied().filter(|v| !v.is_nan()).collect::<Vec<_>>();
    let (repr, data) = pack(&present, options.packing)?;
    push_sect(&mut body, 5, &repr);
    push_sect(&mut body, 6, &bitmap(values));
    push_sect(&mut body, 7, &data);

    let total_length = SECT0_IS_SIZE + body.len() + SECT8_ES_SIZE;
    buf.extend_from_slice(SECT0_IS_MAGIC);
    buf.extend_from_slice(&[0, 0, parameter.discipline, 2]);
    buf.extend_from_slice(&(total_length as u64).to_be_bytes());
    buf.extend(body);
    buf.extend_from_slice(SECT8_ES_MAGIC);
    Ok(())
}

fn push_sect(buf: &mut Vec<u8>, num: u8, payload: &[u8]) {
    let size = (payload.len() + SECT_HEADER_SIZE) as u32;
    buf.extend_from_slice(&size.to_be_bytes());
    buf.push(num);
    buf.extend_from_slice(payload);
}

fn identification(time: DateTime<Utc>, centre: u16) -> Result<Vec<u8>> {
    let year = u16::try_from(time.year())
        .map_err(|_| EncodeError::UnsupportedDimensions(format!("time {time}")))?;
    let mut payload = Vec::with_capacity(16);
    payload.extend_from_slice(&centre.to_be_bytes());
    payload.extend_from_slice(&0_u16.to_be_bytes());
    payload.extend_from_slice(&[MASTER_TABLE_VERSION, 0, 1]);
    payload.extend_from_slice(&year.to_be_bytes());
    payload.extend_from_slice(&[
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        0,
        1,
    ]);
    Ok(payload)
}

fn grid_definition(grid: &LatLonGridDefinition) -> Vec<u8> {
    let increment = |first: i32, last: i32, n: u32| {
        if n > 1 {
            ((i64::from(last) - i64::from(first)).unsigned_abs() / u64::from(n - 1)) as u32
        } else {
            u32::MAX
        }
    };

    let mut payload = vec![0];
    payload.extend_from_slice(&(grid.ni * grid.nj).to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0_u16.to_be_bytes());
    // shape of the earth: spherical, radius 6,371,229.0 m
    payload.extend_from_slice(&[6, 0xff, 0xff, 0xff, 0xff, 0xff]);
    payload.extend_from_slice(&[0xff; 10]);
    payload.extend_from_slice(&grid.ni.to_be_bytes());
    payload.extend_from_slice(&grid.nj.to_be_bytes());
    payload.extend_from_slice(&0_u32.to_be_bytes());
    payload.extend_from_slice(&u32::MAX.to_be_bytes());
    payload.extend_from_slice(&grid.first_point_lat.as_grib_uint().to_be_bytes());
    payload.extend_from_slice(&grid.first_point_lon.as_grib_uint().to_be_bytes());
    payload.push(0b0011_0000);
    payload.extend_from_slice(&grid.last_point_lat.as_grib_uint().to_be_bytes());
    payload.extend_from_slice(&grid.last_point_lon.as_grib_uint().to_be_bytes());
    let di = increment(grid.first_point_lon, grid.last_point_lon, grid.ni);
    let dj = increment(grid.first_point_lat, grid.last_point_lat, grid.nj);
    payload.extend_from_slice(&di.to_be_bytes());
    payload.extend_from_slice(&dj.to_be_bytes());
    payload.push(grid.scanning_mode.0);
    payload
}

fn product_definition(parameter: &Parameter) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(29);
    payload.extend_from_slice(&0_u16.to_be_bytes());
    payload.extend_from_slice(&0_u16.to_be_bytes());
    payload.extend_from_slice(&[parameter.category, parameter.number, 2, 0xff, 0xff]);
    payload.extend_from_slice(&u16::MAX.to_be_bytes());
    // cut-off minutes, then a forecast time of 0 hours
    payload.extend_from_slice(&[0xff, 1]);
    payload.extend_from_slice(&0_u32.to_be_bytes());
    payload.push(parameter.surface_type);
    match parameter.surface_value {
        Some(value) => {
            let (scale, scaled) = scaled_value(value).ok_or_else(|| {
                EncodeError::UnsupportedDimensions(format!("level {value}"))
            })?;
            payload.push(scale);
            payload.extend_from_slice(&scaled.as_grib_uint().to_be_bytes());
        }
        None => {
            payload.push(0xff);
            payload.extend_from_slice(&u32::MAX.to_be_bytes());
        }
    }
    payload.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    Ok(payload)
}

/// Finds the smallest decimal scale factor giving an integral scaled value.
fn scaled_value(value: f64) -> Option<(u8, i32)> {
    (0..=9).find_map(|scale| {
        let scaled = value * 10_f64.powi(scale);
        let rounded = scaled.round();
        let exact = (scaled - rounded).abs() <= 1e-9 * rounded.abs().max(1.);
        if !exact {
            return None;
        }
        let rounded = rounded.to_i32()?;
        // sign-and-magnitude leaves 31 bits
        (rounded != i32::MIN).then_some((scale as u8, rounded))
    })
}

fn bitmap(values: &[f64]) -> Vec<u8> {
    if !values.iter().any(|v| v.is_nan()) {
        return vec![0xff];
    }
    let mut writer = NBitwiseWriter::new(1);
    for v in values {
        writer.push(u32::from(!v.is_nan()));
    }
    let mut payload = vec![0x00];
    payload.extend(writer.finish());
    payload
}

/// Returns the payloads of Sections 5 and 7.
fn pack(values: &[f64], packing: Packing) -> Result<(Vec<u8>, Vec<u8>)> {
    let num_points = u32::try_from(values.len())
        .map_err(|_| EncodeError::InvalidPacking("too many grid points".to_owned()))?;
    let mut repr = num_points.to_be_bytes().to_vec();
    let data = match packing {
        Packing::Ieee64 => {
            repr.extend_from_slice(&4_u16.to_be_bytes());
            repr.push(2);
            values.iter().flat_map(|v| v.to_be_bytes()).collect()
        }
        Packing::Ieee32 => {
            repr.extend_from_slice(&4_u16.to_be_bytes());
            repr.push(1);
            values.iter().flat_map(|v| (*v as f32).to_be_bytes()).collect()
        }
        Packing::Simple {
            decimal_scale,
            nbit,
        } => {
            let (param, data) = pack_simple(values, decimal_scale, nbit)?;
            repr.extend_from_slice(&0_u16.to_be_bytes());
            repr.extend_from_slice(&param.ref_val.to_be_bytes());
            repr.extend_from_slice(&param.exp.as_grib_uint().to_be_bytes());
            repr.extend_from_slice(&param.dig.as_grib_uint().to_be_bytes());
            repr.extend_from_slice(&[param.nbit, param.value_type]);
            data
        }
    };
    Ok((repr, data))
}

fn pack_simple(values: &[f64], decimal_scale: i16, nbit: u8) -> Result<(SimplePackingParam, Vec<u8>)> {
    let invalid = |s: &str| EncodeError::InvalidPacking(s.to_owned());
    if nbit > 32 {
        return Err(invalid("bit width over 32").into());
    }

    let scale = 10_f64.powi(decimal_scale.into());
    let scaled = values.iter().map(|v| v * scale).collect::<Vec<_>>();
    let (min, max) = scaled
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
            None => Some((*v, *v)),
        })
        .unwrap_or((0., 0.));
    let ref_val = min
        .to_f32()
        .filter(|r| r.is_finite())
        .ok_or_else(|| invalid("reference value out of range"))?;
    let range = max - f64::from(ref_val);
    if nbit == 0 && range > 0. {
        return Err(invalid("a non-constant field needs a bit width over 0").into());
    }

    let max_packed = ((1_u64 << nbit) - 1) as f64;
    let exp = if nbit == 0 || range <= 0. {
        0
    } else {
        (range / max_packed)
            .log2()
            .ceil()
            .to_i16()
            .ok_or_else(|| invalid("binary scale factor out of range"))?
    };
    let factor = 2_f64.powi(-i32::from(exp));

    let mut writer = NBitwiseWriter::new(usize::from(nbit));
    for v in &scaled {
        let packed = ((v - f64::from(ref_val)) * factor)
            .round()
            .clamp(0., max_packed)
            .to_u32()
            .ok_or_else(|| invalid("value cannot be packed"))?;
        writer.push(packed);
    }
    let data = if nbit == 0 { Vec::new() } else { writer.finish() };
    Ok((SimplePackingParam::new(ref_val, exp, decimal_scale, nbit), data))
}

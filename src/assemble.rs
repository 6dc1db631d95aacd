use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use ndarray::{ArrayD, IxDyn};
use tracing::{debug, warn};

use crate::{
    axis::CoordinateAxis,
    codetables::{
        fallback_short_name, lookup_parameter, surface_dim_name, FixedSurfaceType, ParameterEntry,
    },
    config::DecodeOptions,
    dataset::Dataset,
    decoders::{self, EncodedField},
    error::*,
    grid::LatLonGridDefinition,
    reader::Submessage,
    sections::{Bitmap, GridDefinition, ProdDefinition, ReprDefinition},
    variable::{Attributes, Parameter, Variable},
};

/// A field whose headers have been interpreted but whose data is still
/// encoded.
struct FieldHeader<'a> {
    message_index: usize,
    submessage_index: usize,
    short_name: String,
    entry: Option<&'static ParameterEntry>,
    parameter: Parameter,
    surface: FixedSurfaceType,
    valid_time: DateTime<Utc>,
    grid: LatLonGridDefinition,
    encoded: EncodedField<'a>,
    bitmap: Bitmap<'a>,
}

impl<'a> FieldHeader<'a> {
    fn from_submessage(sub: Submessage<'a>) -> Result<Self> {
        let prod = ProdDefinition::from_section(&sub.prod)?;
        let forecast = Duration::seconds(prod.forecast_seconds()?);
        let valid_time = sub
            .identification
            .ref_time
            .checked_add_signed(forecast)
            .ok_or_else(|| FormatError::InvalidValue("valid time out of range".to_owned()))?;

        let grid_def = GridDefinition::from_section(&sub.grid)?;
        let grid = LatLonGridDefinition::from_definition(&grid_def)?;

        let repr = ReprDefinition::from_section(&sub.repr)?;
        let previous = sub
            .previous_bitmap
            .map(|s| Bitmap::from_section(&s, None))
            .transpose()?;
        let bitmap = Bitmap::from_section(&sub.bitmap, previous)?;
        let encoded = EncodedField {
            repr,
            data: sub.data,
        };

        let discipline = sub.indicator.discipline;
        let (category, number) = (prod.parameter_category, prod.parameter_number);
        let surface = FixedSurfaceType::try_from(prod.first_surface_type)
            .unwrap_or(FixedSurfaceType::Missing);
        let entry = lookup_parameter(
            discipline,
            category,
            number,
            surface,
            prod.first_surface_value,
        );
        let short_name = entry
            .map(|e| e.short_name.to_owned())
            .unwrap_or_else(|| fallback_short_name(discipline, category, number));

        Ok(Self {
            message_index: sub.message_index,
            submessage_index: sub.submessage_index,
            short_name,
            entry,
            parameter: Parameter {
                discipline,
                category,
                number,
                surface_type: prod.first_surface_type,
                surface_value: prod.first_surface_value,
            },
            surface,
            valid_time,
            grid,
            encoded,
            bitmap,
        })
    }

    /// Fails unless the data can be decoded into the grid from the bytes
    /// present.
    fn check(&self) -> Result<()> {
        decoders::check_support(&self.encoded.repr)?;
        decoders::check_lengths(&self.encoded, self.bitmap, self.grid.num_points())
    }

    fn dim_name(&self) -> String {
        surface_dim_name(self.parameter.surface_type).into_owned()
    }

    fn level(&self) -> Option<f64> {
        self.parameter
            .surface_value
            .map(|v| self.surface.to_axis_value(v))
    }

    fn decode(&self) -> Result<Vec<f64>> {
        let values = decoders::dispatch(&self.encoded, self.bitmap, self.grid.num_points())?;
        self.grid.to_row_major(values)
    }
}

fn is_skippable(e: &Error, options: &DecodeOptions) -> bool {
    options.skip_unsupported && matches!(e, Error::UnsupportedEncoding(_))
}

/// Groups the fields of a stream into the variables of a [`Dataset`].
pub(crate) fn assemble<'a, I>(submessages: I, options: &DecodeOptions) -> Result<Dataset>
where
    I: Iterator<Item = Result<Submessage<'a>>>,
{
    let mut groups: BTreeMap<(String, u8), Vec<FieldHeader<'a>>> = BTreeMap::new();
    for sub in submessages {
        let sub = sub?;
        let (message_index, submessage_index) = (sub.message_index, sub.submessage_index);
        let header = match FieldHeader::from_submessage(sub) {
            Ok(header) => header,
            Err(e) if is_skippable(&e, options) => {
                warn!(
                    message = message_index,
                    submessage = submessage_index,
                    error = %e,
                    "skipping field"
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        debug!(
            message = header.message_index,
            submessage = header.submessage_index,
            name = header.short_name,
            valid_time = %header.valid_time,
            level = ?header.parameter.surface_value,
            "read field header"
        );
        let key = (header.short_name.clone(), header.parameter.surface_type);
        groups.entry(key).or_default().push(header);
    }

    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for (short_name, _) in groups.keys() {
        *name_counts.entry(short_name.clone()).or_default() += 1;
    }
    let mut named = BTreeMap::new();
    for ((short_name, _), fields) in groups {
        let name = if name_counts[&short_name] > 1 {
            format!("{short_name}_{}", fields[0].dim_name())
        } else {
            short_name
        };
        if !options.wants(&name) {
            continue;
        }
        let fields = checked_fields(fields, options)?;
        if fields.is_empty() {
            continue;
        }
        if named.insert(name.clone(), fields).is_some() {
            return Err(FormatError::DuplicateField(name).into());
        }
    }

    let Some(grid) = named.values().flat_map(|f| f.iter()).map(|f| &f.grid).next() else {
        return Ok(Dataset::default());
    };
    if named.values().flat_map(|f| f.iter()).any(|f| f.grid != *grid) {
        return Err(FormatError::InconsistentGrid.into());
    }
    let lat = CoordinateAxis::new("latitude", grid.latitudes()?)?.with_units("degrees_north");
    let lon = CoordinateAxis::new("longitude", grid.longitudes()?)?.with_units("degrees_east");
    let (lat, lon) = (Arc::new(lat), Arc::new(lon));

    let mut times = named
        .values()
        .flat_map(|f| f.iter())
        .map(|f| f.valid_time)
        .collect::<Vec<_>>();
    times.sort_unstable();
    times.dedup();
    let time = Arc::new(CoordinateAxis::from_datetimes("time", &times)?);

    let mut level_values: BTreeMap<u8, (FixedSurfaceType, Vec<f64>)> = BTreeMap::new();
    let mut level_dims = BTreeMap::new();
    for (name, fields) in &named {
        if has_level_dim(name, fields)? {
            let surface_type = fields[0].parameter.surface_type;
            let (_, values) = level_values
                .entry(surface_type)
                .or_insert_with(|| (fields[0].surface, Vec::new()));
            values.extend(fields.iter().filter_map(|f| f.level()));
            level_dims.insert(name.clone(), surface_type);
        }
    }
    let mut level_axes = HashMap::new();
    for (surface_type, (surface, mut values)) in level_values {
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        if surface == FixedSurfaceType::IsobaricSurface {
            values.reverse();
        }
        let mut axis = CoordinateAxis::new(surface_dim_name(surface_type), values)?;
        if let Some(units) = surface.axis_units() {
            axis = axis.with_units(units);
        }
        level_axes.insert(surface_type, Arc::new(axis));
    }

    let mut variables = Vec::with_capacity(named.len());
    for (name, fields) in named {
        let level = level_dims.get(&name).map(|surface_type| &level_axes[surface_type]);
        let var = build_variable(&name, &fields, &time, level, &lat, &lon, options)?;
        debug!(name, shape = ?var.shape(), "assembled variable");
        variables.push(var);
    }
    Dataset::from_variables(variables)
}

/// Drops the fields that cannot be decoded if unsupported ones are to be
/// skipped, and fails on them otherwise.
fn checked_fields<'a>(
    fields: Vec<FieldHeader<'a>>,
    options: &DecodeOptions,
) -> Result<Vec<FieldHeader<'a>>> {
    let mut checked = Vec::with_capacity(fields.len());
    for field in fields {
        match field.check() {
            Ok(()) => checked.push(field),
            Err(e) if is_skippable(&e, options) => {
                warn!(
                    message = field.message_index,
                    submessage = field.submessage_index,
                    error = %e,
                    "skipping field"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(checked)
}

/// Whether a variable has a level dimension. Variables on isobaric surfaces,
/// or on more than one level, have one.
fn has_level_dim(name: &str, fields: &[FieldHeader]) -> Result<bool> {
    let surface = fields[0].surface;
    let mut levels = fields.iter().map(|f| f.level()).collect::<Vec<_>>();
    levels.sort_by(|a, b| match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        _ => a.is_some().cmp(&b.is_some()),
    });
    levels.dedup();
    if surface != FixedSurfaceType::IsobaricSurface && levels.len() < 2 {
        return Ok(false);
    }
    if levels.contains(&None) {
        return Err(FormatError::InvalidValue(format!(
            "fields of variable '{name}' without level value"
        ))
        .into());
    }
    Ok(true)
}

fn build_variable(
    name: &str,
    fields: &[FieldHeader],
    time: &Arc<CoordinateAxis>,
    level: Option<&Arc<CoordinateAxis>>,
    lat: &Arc<CoordinateAxis>,
    lon: &Arc<CoordinateAxis>,
    options: &DecodeOptions,
) -> Result<Variable> {
    let times = time.datetimes().unwrap_or_default();
    let num_levels = level.map_or(1, |axis| axis.len());
    let num_points = lat.len() * lon.len();
    let mut data = vec![f64::NAN; times.len() * num_levels * num_points];
    let mut filled = vec![false; times.len() * num_levels];

    for field in fields {
        let t = times.binary_search(&field.valid_time).map_err(|_| {
            FormatError::InvalidValue(format!("valid time {} not on time axis", field.valid_time))
        })?;
        let l = match (level, field.level()) {
            (Some(axis), Some(value)) => {
                axis.values().iter().position(|v| *v == value).ok_or_else(|| {
                    FormatError::InvalidValue(format!("level {value} not on level axis"))
                })?
            }
            _ => 0,
        };
        let slot = t * num_levels + l;
        if filled[slot] {
            return Err(FormatError::DuplicateField(format!(
                "{name} at {} level {:?}",
                field.valid_time,
                field.level()
            ))
            .into());
        }
        filled[slot] = true;

        let values = match field.decode() {
            Ok(values) => values,
            Err(e) if is_skippable(&e, options) => {
                warn!(
                    message = field.message_index,
                    submessage = field.submessage_index,
                    error = %e,
                    "skipping field data"
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        data[slot * num_points..(slot + 1) * num_points].copy_from_slice(&values);
    }

    let mut axes = vec![time.clone()];
    axes.extend(level.cloned());
    axes.push(lat.clone());
    axes.push(lon.clone());
    let shape = axes.iter().map(|a| a.len()).collect::<Vec<_>>();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| FormatError::InvalidValue(e.to_string()))?;

    let first = &fields[0];
    let attrs = Attributes {
        long_name: first.entry.map(|e| e.long_name.to_owned()),
        units: first.entry.map(|e| e.units.to_owned()),
    };
    let parameter = Parameter {
        surface_value: if level.is_some() {
            None
        } else {
            first.parameter.surface_value
        },
        ..first.parameter
    };
    Ok(Variable::new(name, axes, data)?
        .with_attributes(attrs)
        .with_parameter(parameter))
}

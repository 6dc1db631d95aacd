//! Subsets of the WMO GRIB2 code tables needed to name variables and build
//! their axes.

use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Code Table 4.5: fixed surface types and units.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FixedSurfaceType {
    GroundOrWater = 1,
    CloudBase,
    CloudTop,
    ZeroDegreeIsotherm,
    AdiabaticCondensation,
    MaximumWind,
    Tropopause,
    NominalTopOfAtmosphere,
    SeaBottom,
    EntireAtmosphere,
    IsobaricSurface = 100,
    MeanSeaLevel,
    AltitudeAboveMeanSeaLevel,
    HeightAboveGround,
    SigmaLevel,
    HybridLevel,
    DepthBelowLandSurface,
    Missing = 255,
}

impl FixedSurfaceType {
    /// Units of the level axis after [`to_axis_value`] is applied.
    ///
    /// [`to_axis_value`]: FixedSurfaceType::to_axis_value
    pub fn axis_units(&self) -> Option<&'static str> {
        match self {
            Self::IsobaricSurface => Some("hPa"),
            Self::AltitudeAboveMeanSeaLevel
            | Self::HeightAboveGround
            | Self::DepthBelowLandSurface => Some("m"),
            _ => None,
        }
    }

    /// Converts a level in the units of Code Table 4.5 into the value stored
    /// on the level axis. Isobaric surfaces are stored in hPa.
    pub fn to_axis_value(&self, value: f64) -> f64 {
        match self {
            Self::IsobaricSurface => value / 100.,
            _ => value,
        }
    }

    pub fn from_axis_value(&self, value: f64) -> f64 {
        match self {
            Self::IsobaricSurface => value * 100.,
            _ => value,
        }
    }
}

const SURFACE_NAMES: &[(FixedSurfaceType, &str)] = &[
    (FixedSurfaceType::GroundOrWater, "surface"),
    (FixedSurfaceType::CloudBase, "cloudBase"),
    (FixedSurfaceType::CloudTop, "cloudTop"),
    (FixedSurfaceType::ZeroDegreeIsotherm, "isothermZero"),
    (FixedSurfaceType::AdiabaticCondensation, "adiabaticCondensation"),
    (FixedSurfaceType::MaximumWind, "maxWind"),
    (FixedSurfaceType::Tropopause, "tropopause"),
    (FixedSurfaceType::NominalTopOfAtmosphere, "nominalTop"),
    (FixedSurfaceType::SeaBottom, "seaBottom"),
    (FixedSurfaceType::EntireAtmosphere, "entireAtmosphere"),
    (FixedSurfaceType::IsobaricSurface, "isobaricInhPa"),
    (FixedSurfaceType::MeanSeaLevel, "meanSea"),
    (FixedSurfaceType::AltitudeAboveMeanSeaLevel, "heightAboveSea"),
    (FixedSurfaceType::HeightAboveGround, "heightAboveGround"),
    (FixedSurfaceType::SigmaLevel, "sigma"),
    (FixedSurfaceType::HybridLevel, "hybrid"),
    (FixedSurfaceType::DepthBelowLandSurface, "depthBelowLandLayer"),
];

/// Name of the dimension spanned by fields on surfaces of type `code`. The
/// name also tells apart variables sharing a short name. Types without a name
/// of their own are called `level{code}`.
///
/// # Examples
///
/// ```
/// use grib_dataset::codetables::{surface_dim_name, surface_type_of_dim};
///
/// assert_eq!(surface_dim_name(100), "isobaricInhPa");
/// assert_eq!(surface_dim_name(7), "tropopause");
/// assert_eq!(surface_dim_name(204), "level204");
/// assert_eq!(surface_type_of_dim("level204"), Some(204));
/// ```
pub fn surface_dim_name(code: u8) -> Cow<'static, str> {
    SURFACE_NAMES
        .iter()
        .find(|(surface, _)| u8::from(*surface) == code)
        .map_or_else(|| Cow::Owned(format!("level{code}")), |(_, name)| Cow::Borrowed(*name))
}

/// Inverse of [`surface_dim_name`].
pub fn surface_type_of_dim(name: &str) -> Option<u8> {
    if let Some((surface, _)) = SURFACE_NAMES.iter().find(|(_, n)| *n == name) {
        return Some((*surface).into());
    }
    let code = name.strip_prefix("level")?;
    if code.starts_with('+') {
        return None;
    }
    code.parse().ok()
}

/// Code Table 4.4: indicator of unit of time range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TimeUnit {
    Minute = 0,
    Hour,
    Day,
    Month,
    Year,
    Decade,
    Normal,
    Century,
    ThreeHours = 10,
    SixHours,
    TwelveHours,
    Second,
    Missing = 255,
}

impl TimeUnit {
    /// Length of the unit in seconds, or `None` for calendar-dependent units.
    pub fn seconds(&self) -> Option<i64> {
        match self {
            Self::Minute => Some(60),
            Self::Hour => Some(3_600),
            Self::Day => Some(86_400),
            Self::ThreeHours => Some(10_800),
            Self::SixHours => Some(21_600),
            Self::TwelveHours => Some(43_200),
            Self::Second => Some(1),
            _ => None,
        }
    }
}

/// A row of the built-in parameter table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterEntry {
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    /// Surface type and value this name is restricted to, if any.
    pub surface: Option<(FixedSurfaceType, Option<f64>)>,
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
}

macro_rules! parameter_table {
    ($(($d:expr, $c:expr, $n:expr, $surface:expr, $short:expr, $long:expr, $units:expr),)*) => {
        pub(crate) const PARAMETERS: &[ParameterEntry] = &[$(
            ParameterEntry {
                discipline: $d,
                category: $c,
                number: $n,
                surface: $surface,
                short_name: $short,
                long_name: $long,
                units: $units,
            },
        )*];
    };
}

use FixedSurfaceType::{GroundOrWater, HeightAboveGround, MeanSeaLevel};

parameter_table! {
    (0, 0, 0, Some((HeightAboveGround, Some(2.))), "t2m", "2 metre temperature", "K"),
    (0, 0, 6, Some((HeightAboveGround, Some(2.))), "d2m", "2 metre dewpoint temperature", "K"),
    (0, 2, 2, Some((HeightAboveGround, Some(10.))), "u10", "10 metre U wind component", "m s**-1"),
    (0, 2, 3, Some((HeightAboveGround, Some(10.))), "v10", "10 metre V wind component", "m s**-1"),
    (0, 3, 0, Some((MeanSeaLevel, None)), "msl", "Mean sea level pressure", "Pa"),
    (0, 3, 0, Some((GroundOrWater, None)), "sp", "Surface pressure", "Pa"),
    (0, 0, 17, Some((GroundOrWater, None)), "skt", "Skin temperature", "K"),
    (0, 1, 8, Some((GroundOrWater, None)), "tp", "Total precipitation", "kg m**-2"),
    (0, 6, 1, Some((GroundOrWater, None)), "tcc", "Total cloud cover", "%"),
    (10, 3, 0, Some((GroundOrWater, None)), "sst", "Sea surface temperature", "K"),
    (2, 0, 0, Some((GroundOrWater, None)), "lsm", "Land-sea mask", "(0 - 1)"),
    (0, 0, 0, None, "t", "Temperature", "K"),
    (0, 0, 6, None, "dpt", "Dew point temperature", "K"),
    (0, 1, 0, None, "q", "Specific humidity", "kg kg**-1"),
    (0, 1, 1, None, "r", "Relative humidity", "%"),
    (0, 2, 2, None, "u", "U component of wind", "m s**-1"),
    (0, 2, 3, None, "v", "V component of wind", "m s**-1"),
    (0, 2, 8, None, "w", "Vertical velocity", "Pa s**-1"),
    (0, 2, 12, None, "vo", "Relative vorticity", "s**-1"),
    (0, 3, 0, None, "pres", "Pressure", "Pa"),
    (0, 3, 4, None, "z", "Geopotential", "m**2 s**-2"),
    (0, 3, 5, None, "gh", "Geopotential height", "gpm"),
}

/// Looks up the parameter table. Entries restricted to the given surface
/// (and, where they name one, the given surface value) take precedence over
/// unrestricted ones.
///
/// # Examples
///
/// ```
/// use grib_dataset::codetables::{lookup_parameter, FixedSurfaceType};
///
/// let entry = lookup_parameter(0, 0, 0, FixedSurfaceType::HeightAboveGround, Some(2.));
/// assert_eq!(entry.map(|e| e.short_name), Some("t2m"));
///
/// let entry = lookup_parameter(0, 0, 0, FixedSurfaceType::IsobaricSurface, Some(85000.));
/// assert_eq!(entry.map(|e| e.short_name), Some("t"));
/// ```
pub fn lookup_parameter(
    discipline: u8,
    category: u8,
    number: u8,
    surface: FixedSurfaceType,
    value: Option<f64>,
) -> Option<&'static ParameterEntry> {
    let candidates = || {
        PARAMETERS
            .iter()
            .filter(move |e| (e.discipline, e.category, e.number) == (discipline, category, number))
    };
    candidates()
        .find(|e| match e.surface {
            Some((s, Some(v))) => s == surface && value == Some(v),
            Some((s, None)) => s == surface,
            None => false,
        })
        .or_else(|| candidates().find(|e| e.surface.is_none()))
}

pub fn lookup_short_name(short_name: &str) -> Option<&'static ParameterEntry> {
    PARAMETERS.iter().find(|e| e.short_name == short_name)
}

/// Name given to parameters missing from the table.
pub fn fallback_short_name(discipline: u8, category: u8, number: u8) -> String {
    format!("p{discipline}.{category}.{number}")
}

/// Parses a name produced by [`fallback_short_name`].
pub(crate) fn parse_fallback_short_name(name: &str) -> Option<(u8, u8, u8)> {
    let mut parts = name.strip_prefix('p')?.split('.');
    let discipline = parts.next()?.parse().ok()?;
    let category = parts.next()?.parse().ok()?;
    let number = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((discipline, category, number))
}

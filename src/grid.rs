use crate::{
    error::*,
    sections::GridDefinition,
    utils::{read_as, GribInt},
};

const MICRO_DEGREES: f64 = 1_000_000.;
const FULL_CIRCLE: i64 = 360_000_000;

/// Grid Definition Template 3.0 (latitude/longitude, or equidistant
/// cylindrical). Angles are in micro-degrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatLonGridDefinition {
    pub ni: u32,
    pub nj: u32,
    pub first_point_lat: i32,
    pub first_point_lon: i32,
    pub last_point_lat: i32,
    pub last_point_lon: i32,
    pub scanning_mode: ScanningMode,
}

impl LatLonGridDefinition {
    pub(crate) const TEMPLATE_SIZE: usize = 58;

    pub(crate) fn from_definition(def: &GridDefinition) -> Result<Self> {
        if def.template_num != 0 {
            return Err(UnsupportedEncoding::GridTemplate(def.template_num).into());
        }
        let buf = def.template;
        if buf.len() < Self::TEMPLATE_SIZE {
            return Err(Error::TruncatedData {
                offset: def.offset,
                needed: Self::TEMPLATE_SIZE + 14,
                available: buf.len() + 14,
            });
        }
        let grid = Self {
            ni: read_as!(u32, buf, 16),
            nj: read_as!(u32, buf, 20),
            first_point_lat: read_as!(u32, buf, 32).as_grib_int(),
            first_point_lon: read_as!(u32, buf, 36).as_grib_int(),
            last_point_lat: read_as!(u32, buf, 41).as_grib_int(),
            last_point_lon: read_as!(u32, buf, 45).as_grib_int(),
            scanning_mode: ScanningMode(buf[57]),
        };
        if grid.ni == 0 || grid.nj == 0 {
            return Err(FormatError::InvalidValue(format!(
                "grid of {}x{} points",
                grid.ni, grid.nj
            ))
            .into());
        }
        if u64::from(grid.ni) * u64::from(grid.nj) != u64::from(def.num_points) {
            return Err(FormatError::InvalidValue(format!(
                "grid of {}x{} points declares {} points",
                grid.ni, grid.nj, def.num_points
            ))
            .into());
        }
        Ok(grid)
    }

    /// Returns the shape of the grid, i.e. a tuple of the number of grids in
    /// the j and i directions, which is the shape of [`to_row_major`] output.
    ///
    /// [`to_row_major`]: LatLonGridDefinition::to_row_major
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.nj as usize, self.ni as usize)
    }

    pub fn num_points(&self) -> usize {
        self.ni as usize * self.nj as usize
    }

    /// Latitudes of the grid rows in the order the data is scanned in the j
    /// direction.
    ///
    /// # Examples
    ///
    /// ```
    /// let def = grib_dataset::LatLonGridDefinition {
    ///     ni: 2,
    ///     nj: 3,
    ///     first_point_lat: 90_000_000,
    ///     first_point_lon: 0,
    ///     last_point_lat: 88_000_000,
    ///     last_point_lon: 1_000_000,
    ///     scanning_mode: grib_dataset::ScanningMode(0b00000000),
    /// };
    /// assert_eq!(def.latitudes().unwrap(), vec![90.0, 89.0, 88.0]);
    /// ```
    pub fn latitudes(&self) -> Result<Vec<f64>> {
        let (first, last) = (
            i64::from(self.first_point_lat),
            i64::from(self.last_point_lat),
        );
        if self.nj > 1 && (first == last || (last > first) != self.scanning_mode.scans_positively_for_j()) {
            return Err(FormatError::InvalidValue(
                "latitudes of first/last grid points are not consistent with scanning mode"
                    .to_owned(),
            )
            .into());
        }
        Ok(evenly_spaced(first, last, self.nj as usize))
    }

    /// Longitudes of the grid columns in the order the data is scanned in the
    /// i direction. A grid crossing the meridian where longitudes wrap
    /// continues past 360 (or below 0) so that the values stay monotonic.
    pub fn longitudes(&self) -> Result<Vec<f64>> {
        let (first, mut last) = (
            i64::from(self.first_point_lon),
            i64::from(self.last_point_lon),
        );
        if self.ni > 1 {
            let positive = self.scanning_mode.scans_positively_for_i();
            if positive && last <= first {
                last += FULL_CIRCLE;
            } else if !positive && last >= first {
                last -= FULL_CIRCLE;
            }
        }
        Ok(evenly_spaced(first, last, self.ni as usize))
    }

    /// Reorders values given in scanning order into a row-major `(j, i)`
    /// grid whose rows follow [`latitudes`] and columns follow
    /// [`longitudes`].
    ///
    /// [`latitudes`]: LatLonGridDefinition::latitudes
    /// [`longitudes`]: LatLonGridDefinition::longitudes
    pub fn to_row_major(&self, values: Vec<f64>) -> Result<Vec<f64>> {
        if self.scanning_mode.has_unsupported_flags() {
            let ScanningMode(mode) = self.scanning_mode;
            return Err(UnsupportedEncoding::ScanningMode(mode).into());
        }
        let (nj, ni) = self.grid_shape();
        if values.len() != ni * nj {
            return Err(FormatError::InvalidValue(format!(
                "{} values decoded for a grid of {} points",
                values.len(),
                ni * nj
            ))
            .into());
        }
        if self.scanning_mode.is_consecutive_for_i() && !self.scanning_mode.scans_alternating_rows()
        {
            return Ok(values);
        }

        let mut out = vec![f64::NAN; values.len()];
        for ((i, j), value) in GridPointIndexIterator::new(ni, nj, self.scanning_mode).zip(values) {
            out[j * ni + i] = value;
        }
        Ok(out)
    }

    /// Inverse of [`to_row_major`] for the default scanning mode used when
    /// encoding.
    ///
    /// [`to_row_major`]: LatLonGridDefinition::to_row_major
    pub(crate) fn from_axes(latitudes: &[f64], longitudes: &[f64]) -> Option<Self> {
        let (first_point_lat, last_point_lat) = micro_degree_ends(latitudes)?;
        let (first_point_lon, last_point_lon) = micro_degree_ends(longitudes)?;
        let mut mode = 0b0000_0000;
        if latitudes.len() > 1 && last_point_lat > first_point_lat {
            mode |= 0b0100_0000;
        }
        if longitudes.len() > 1 && last_point_lon < first_point_lon {
            mode |= 0b1000_0000;
        }
        let grid = Self {
            ni: u32::try_from(longitudes.len()).ok()?,
            nj: u32::try_from(latitudes.len()).ok()?,
            first_point_lat,
            first_point_lon,
            last_point_lat,
            last_point_lon,
            scanning_mode: ScanningMode(mode),
        };
        let round_trips = same_in_micro_degrees(&grid.latitudes().ok()?, latitudes)
            && same_in_micro_degrees(&grid.longitudes().ok()?, longitudes);
        round_trips.then_some(grid)
    }
}

fn evenly_spaced(first: i64, last: i64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![first as f64 / MICRO_DEGREES; n];
    }
    let span = (last - first) as f64;
    let div = (n - 1) as f64;
    (0..n)
        .map(|k| (first as f64 + span * k as f64 / div) / MICRO_DEGREES)
        .collect()
}

fn same_in_micro_degrees(a: &[f64], b: &[f64]) -> bool {
    let to_micro = |v: &f64| (v * MICRO_DEGREES).round();
    a.len() == b.len() && a.iter().map(to_micro).eq(b.iter().map(to_micro))
}

fn micro_degree_ends(values: &[f64]) -> Option<(i32, i32)> {
    let to_micro = |v: f64| {
        let scaled = (v * MICRO_DEGREES).round();
        (scaled.abs() < f64::from(i32::MAX)).then_some(scaled as i32)
    };
    Some((to_micro(*values.first()?)?, to_micro(*values.last()?)?))
}

/// Flag table 3.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanningMode(pub u8);

impl ScanningMode {
    pub fn scans_positively_for_i(&self) -> bool {
        self.0 & 0b10000000 == 0
    }

    pub fn scans_positively_for_j(&self) -> bool {
        self.0 & 0b01000000 != 0
    }

    pub fn is_consecutive_for_i(&self) -> bool {
        self.0 & 0b00100000 == 0
    }

    pub fn scans_alternating_rows(&self) -> bool {
        self.0 & 0b00010000 != 0
    }

    pub(crate) fn has_unsupported_flags(&self) -> bool {
        self.0 & 0b00001111 != 0
    }
}

/// An iterator over `(i, j)` of grid points in scanning order.
#[derive(Clone)]
pub(crate) struct GridPointIndexIterator {
    major_len: usize,
    minor_len: usize,
    scanning_mode: ScanningMode,
    major_pos: usize,
    minor_pos: usize,
    increments: bool,
}

impl GridPointIndexIterator {
    pub(crate) fn new(ni: usize, nj: usize, scanning_mode: ScanningMode) -> Self {
        let (major_len, minor_len) = if scanning_mode.is_consecutive_for_i() {
            (nj, ni)
        } else {
            (ni, nj)
        };
        Self {
            major_len,
            minor_len,
            scanning_mode,
            major_pos: 0,
            minor_pos: 0,
            increments: true,
        }
    }
}

impl Iterator for GridPointIndexIterator {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.major_pos == self.major_len || self.minor_len == 0 {
            return None;
        }

        let minor = if self.increments {
            self.minor_pos
        } else {
            self.minor_len - self.minor_pos - 1
        };
        let major = self.major_pos;

        self.minor_pos += 1;
        if self.minor_pos == self.minor_len {
            self.major_pos += 1;
            self.minor_pos = 0;
            if self.scanning_mode.scans_alternating_rows() {
                self.increments = !self.increments;
            }
        }

        if self.scanning_mode.is_consecutive_for_i() {
            Some((minor, major))
        } else {
            Some((major, minor))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.major_len - self.major_pos) * self.minor_len - self.minor_pos;
        (len, Some(len))
    }
}

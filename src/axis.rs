use std::ops::Range;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::*;

/// Units of time axes. Values are seconds since the Unix epoch.
pub const TIME_UNITS: &str = "seconds since 1970-01-01T00:00:00Z";

/// How a coordinate value is matched against axis values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// Only an axis value equal to the requested one matches.
    #[default]
    Exact,
    /// The closest axis value matches. Midpoint ties go to the lower index.
    Nearest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub method: Method,
    /// Lets [`Method::Nearest`] clamp values outside the axis to its edges.
    pub extrapolate: bool,
}

impl SelectOptions {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn nearest() -> Self {
        Self {
            method: Method::Nearest,
            extrapolate: false,
        }
    }

    pub fn extrapolate(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

/// A named, strictly monotonic sequence of coordinate values.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateAxis {
    name: String,
    values: Vec<f64>,
    units: Option<String>,
    ascending: bool,
}

impl CoordinateAxis {
    /// Creates an axis. Values must be non-empty, free of NaN, and strictly
    /// increasing or strictly decreasing.
    ///
    /// # Examples
    ///
    /// ```
    /// use grib_dataset::CoordinateAxis;
    ///
    /// let axis = CoordinateAxis::new("latitude", vec![90.0, 45.0, 0.0]).unwrap();
    /// assert!(!axis.is_ascending());
    /// assert!(CoordinateAxis::new("latitude", vec![0.0, 1.0, 1.0]).is_err());
    /// ```
    pub fn new<S: Into<String>>(name: S, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(Error::InvalidAxis(format!("axis '{name}' has no values")));
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(Error::InvalidAxis(format!("axis '{name}' contains NaN")));
        }
        let ascending = values.len() == 1 || values[1] > values[0];
        let monotonic = values
            .windows(2)
            .all(|w| if ascending { w[0] < w[1] } else { w[0] > w[1] });
        if !monotonic {
            return Err(Error::InvalidAxis(format!(
                "axis '{name}' is not strictly monotonic"
            )));
        }
        Ok(Self {
            name,
            values,
            units: None,
            ascending,
        })
    }

    pub fn with_units<S: Into<String>>(mut self, units: S) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Creates a time axis from instants.
    pub fn from_datetimes<S: Into<String>>(name: S, times: &[DateTime<Utc>]) -> Result<Self> {
        let values = times
            .iter()
            .map(|t| t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9)
            .collect();
        Ok(Self::new(name, values)?.with_units(TIME_UNITS))
    }

    /// Values of a time axis as instants, or `None` if this is not a time
    /// axis.
    pub fn datetimes(&self) -> Option<Vec<DateTime<Utc>>> {
        if !self.is_time() {
            return None;
        }
        self.values.iter().map(|v| to_datetime(*v)).collect()
    }

    pub fn is_time(&self) -> bool {
        self.units.as_deref() == Some(TIME_UNITS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Only axes produced by label slicing can be empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Smallest and largest values, or `None` for an empty axis.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let (first, last) = (*self.values.first()?, *self.values.last()?);
        Some(if self.ascending {
            (first, last)
        } else {
            (last, first)
        })
    }

    /// Finds the index matching `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use grib_dataset::{CoordinateAxis, SelectOptions};
    ///
    /// let axis = CoordinateAxis::new("x", vec![0.0, 10.0, 20.0]).unwrap();
    /// assert_eq!(axis.index_of(4.0, SelectOptions::nearest()).unwrap(), 0);
    /// assert_eq!(axis.index_of(5.0, SelectOptions::nearest()).unwrap(), 0);
    /// assert_eq!(axis.index_of(10.0, SelectOptions::exact()).unwrap(), 1);
    /// assert!(axis.index_of(25.0, SelectOptions::nearest()).is_err());
    /// ```
    pub fn index_of(&self, value: f64, options: SelectOptions) -> Result<usize> {
        let out_of_range = || {
            let (min, max) = self.bounds().unwrap_or((f64::NAN, f64::NAN));
            Error::CoordinateOutOfRange {
                axis: self.name.clone(),
                value,
                min,
                max,
            }
        };
        let Some((min, max)) = self.bounds() else {
            return Err(out_of_range());
        };
        if value.is_nan() {
            return Err(out_of_range());
        }
        if value < min || value > max {
            return match options {
                SelectOptions {
                    method: Method::Nearest,
                    extrapolate: true,
                } => Ok(self.nearest_index(value)),
                _ => Err(out_of_range()),
            };
        }

        match options.method {
            Method::Exact => {
                let i = self.lower_bound(value);
                match self.values.get(i) {
                    Some(v) if *v == value => Ok(i),
                    _ => Err(Error::CoordinateNotFound {
                        axis: self.name.clone(),
                        value,
                    }),
                }
            }
            Method::Nearest => Ok(self.nearest_index(value)),
        }
    }

    /// Index of the value closest to `value`, clamped to the axis. Midpoint
    /// ties resolve to the lower index.
    pub fn nearest_index(&self, value: f64) -> usize {
        let i = self.lower_bound(value);
        if i == 0 {
            return 0;
        }
        if i == self.values.len() {
            return i - 1;
        }
        let below = (value - self.values[i - 1]).abs();
        let above = (self.values[i] - value).abs();
        if above < below {
            i
        } else {
            i - 1
        }
    }

    /// Index of the first value not before `value` in axis order.
    fn lower_bound(&self, value: f64) -> usize {
        if self.ascending {
            self.values.partition_point(|v| *v < value)
        } else {
            self.values.partition_point(|v| *v > value)
        }
    }

    /// Indices of the values between `a` and `b`, both inclusive, in either
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use grib_dataset::CoordinateAxis;
    ///
    /// let axis = CoordinateAxis::new("latitude", vec![60.0, 50.0, 40.0, 30.0]).unwrap();
    /// assert_eq!(axis.slice_range(35.0, 50.0), 1..3);
    /// assert_eq!(axis.slice_range(50.0, 35.0), 1..3);
    /// assert_eq!(axis.slice_range(0.0, 10.0), 4..4);
    /// ```
    pub fn slice_range(&self, a: f64, b: f64) -> Range<usize> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (start, end) = if self.ascending {
            (
                self.values.partition_point(|v| *v < lo),
                self.values.partition_point(|v| *v <= hi),
            )
        } else {
            (
                self.values.partition_point(|v| *v > hi),
                self.values.partition_point(|v| *v >= lo),
            )
        };
        start..end.max(start)
    }

    /// A new axis holding the values in `range`.
    pub(crate) fn subset(&self, range: Range<usize>) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values[range].to_vec(),
            units: self.units.clone(),
            ascending: self.ascending,
        }
    }
}

pub(crate) fn to_datetime(value: f64) -> Option<DateTime<Utc>> {
    let secs = value.floor();
    let nanos = ((value - secs) * 1e9).round() as u32;
    Utc.timestamp_opt(secs as i64, nanos).single()
}

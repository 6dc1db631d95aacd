use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Axis, Slice};

use crate::{
    axis::{CoordinateAxis, SelectOptions},
    coords::Coordinates,
    error::*,
};

/// Descriptive attributes of a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub long_name: Option<String>,
    pub units: Option<String>,
}

/// GRIB2 identity of the fields a variable was decoded from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    /// Code Table 0.0
    pub discipline: u8,
    /// Code Table 4.1
    pub category: u8,
    /// Code Table 4.2
    pub number: u8,
    /// Type of first fixed surface (Code Table 4.5)
    pub surface_type: u8,
    /// Value of first fixed surface in the units of Code Table 4.5, for
    /// variables without a level dimension.
    pub surface_value: Option<f64>,
}

/// An N-dimensional array whose dimensions are indexed by coordinate axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    axes: Vec<Arc<CoordinateAxis>>,
    data: ArrayD<f64>,
    attrs: Attributes,
    parameter: Option<Parameter>,
}

impl Variable {
    /// Creates a variable. The `i`-th axis indexes the `i`-th dimension of
    /// `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use grib_dataset::{CoordinateAxis, Error, Variable};
    /// use ndarray::{ArrayD, IxDyn};
    ///
    /// let x = Arc::new(CoordinateAxis::new("x", vec![0.0, 10.0, 20.0]).unwrap());
    /// let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap();
    /// let var = Variable::new("v", vec![x.clone()], data).unwrap();
    /// assert_eq!(var.shape(), &[3]);
    ///
    /// let data = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0]).unwrap();
    /// assert!(matches!(
    ///     Variable::new("v", vec![x], data),
    ///     Err(Error::ShapeMismatch { .. })
    /// ));
    /// ```
    pub fn new<S: Into<String>>(
        name: S,
        axes: Vec<Arc<CoordinateAxis>>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let expected = axes.iter().map(|a| a.len()).collect::<Vec<_>>();
        if expected != data.shape() {
            return Err(Error::ShapeMismatch {
                variable: name,
                expected,
                actual: data.shape().to_vec(),
            });
        }
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|a| a.name() == axis.name()) {
                return Err(Error::InvalidAxis(format!(
                    "dimension '{}' appears twice in variable '{name}'",
                    axis.name()
                )));
            }
        }
        Ok(Self {
            name,
            axes,
            data,
            attrs: Attributes::default(),
            parameter: None,
        })
    }

    pub fn with_attributes(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameter = Some(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.name()).collect()
    }

    pub fn axes(&self) -> &[Arc<CoordinateAxis>] {
        &self.axes
    }

    pub fn axis(&self, dim: &str) -> Option<&Arc<CoordinateAxis>> {
        self.axes.iter().find(|a| a.name() == dim)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        self.parameter.as_ref()
    }

    /// The only element of a single-element variable.
    pub fn item(&self) -> Option<f64> {
        if self.data.len() == 1 {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// Selects one index along each given dimension by coordinate value.
    /// The selected dimensions are removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use grib_dataset::{CoordinateAxis, SelectOptions, Variable};
    /// use ndarray::{ArrayD, IxDyn};
    ///
    /// let lat = Arc::new(CoordinateAxis::new("latitude", vec![10.0, 0.0]).unwrap());
    /// let lon = Arc::new(CoordinateAxis::new("longitude", vec![0.0, 1.0]).unwrap());
    /// let data = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// let var = Variable::new("v", vec![lat, lon], data).unwrap();
    ///
    /// let row = var.sel(&[("latitude", 1.0)], SelectOptions::nearest()).unwrap();
    /// assert_eq!(row.dims(), vec!["longitude"]);
    /// assert_eq!(row.values().as_slice(), Some(&[3.0, 4.0][..]));
    ///
    /// let point = var
    ///     .sel(&[("latitude", 10.0), ("longitude", 1.0)], SelectOptions::exact())
    ///     .unwrap();
    /// assert_eq!(point.item(), Some(2.0));
    /// ```
    pub fn sel(&self, selectors: &[(&str, f64)], options: SelectOptions) -> Result<Variable> {
        let mut picks = Vec::with_capacity(selectors.len());
        for (dim, value) in selectors {
            let pos = self.position(dim, &picks)?;
            picks.push((pos, self.axes[pos].index_of(*value, options)?));
        }
        Ok(self.take(picks))
    }

    /// Selects along the `time` dimension.
    pub fn sel_time(&self, time: DateTime<Utc>, options: SelectOptions) -> Result<Variable> {
        let value = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9;
        self.sel(&[("time", value)], options)
    }

    /// Selects one index along each given dimension by position.
    pub fn isel(&self, selectors: &[(&str, usize)]) -> Result<Variable> {
        let mut picks = Vec::with_capacity(selectors.len());
        for (dim, index) in selectors {
            let pos = self.position(dim, &picks)?;
            let len = self.axes[pos].len();
            if *index >= len {
                return Err(Error::IndexOutOfBounds {
                    axis: dim.to_string(),
                    index: *index,
                    len,
                });
            }
            picks.push((pos, *index));
        }
        Ok(self.take(picks))
    }

    /// Keeps the part of dimension `dim` whose coordinates lie between `a`
    /// and `b`, both inclusive, in either order.
    pub fn sel_range(&self, dim: &str, a: f64, b: f64) -> Result<Variable> {
        let pos = self.position(dim, &[])?;
        let range = self.axes[pos].slice_range(a, b);
        let axis = Arc::new(self.axes[pos].subset(range.clone()));
        Ok(self.slice_axis(pos, axis, range))
    }

    fn position(&self, dim: &str, picked: &[(usize, usize)]) -> Result<usize> {
        let pos = self
            .axes
            .iter()
            .position(|a| a.name() == dim)
            .ok_or_else(|| Error::DimensionNotFound(dim.to_owned()))?;
        if picked.iter().any(|(p, _)| *p == pos) {
            return Err(Error::DuplicateSelector(dim.to_owned()));
        }
        Ok(pos)
    }

    fn take(&self, mut picks: Vec<(usize, usize)>) -> Variable {
        picks.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        let mut view = self.data.view();
        let mut axes = self.axes.clone();
        for (pos, index) in picks {
            view = view.index_axis_move(Axis(pos), index);
            axes.remove(pos);
        }
        Variable {
            name: self.name.clone(),
            axes,
            data: view.to_owned(),
            attrs: self.attrs.clone(),
            parameter: self.parameter,
        }
    }

    pub(crate) fn slice_axis(
        &self,
        pos: usize,
        axis: Arc<CoordinateAxis>,
        range: std::ops::Range<usize>,
    ) -> Variable {
        let mut axes = self.axes.clone();
        axes[pos] = axis;
        Variable {
            name: self.name.clone(),
            axes,
            data: self.data.slice_axis(Axis(pos), Slice::from(range)).to_owned(),
            attrs: self.attrs.clone(),
            parameter: self.parameter,
        }
    }

    /// Applies `f` to every element, keeping the axes.
    pub(crate) fn map_values<F>(&self, f: F, attrs: Attributes) -> Variable
    where
        F: Fn(f64) -> f64,
    {
        Variable {
            name: self.name.clone(),
            axes: self.axes.clone(),
            data: self.data.mapv(f),
            attrs,
            parameter: self.parameter,
        }
    }

    /// Points the axes at the ones stored in `coords`, adding those missing.
    pub(crate) fn share_axes(mut self, coords: &mut Coordinates) -> Result<Self> {
        for axis in self.axes.iter_mut() {
            *axis = coords.insert(axis.clone())?;
        }
        Ok(self)
    }
}

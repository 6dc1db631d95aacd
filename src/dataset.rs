use std::{collections::BTreeMap, sync::Arc};

use crate::{axis::SelectOptions, coords::Coordinates, error::*, variable::Variable};

/// Named variables sharing one set of coordinate axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    coords: Coordinates,
    variables: BTreeMap<String, Variable>,
}

impl Dataset {
    /// Builds a dataset from variables. Axes of the same name must be equal
    /// across variables; every variable ends up holding the same shared axis
    /// for a name.
    pub fn from_variables<I>(variables: I) -> Result<Self>
    where
        I: IntoIterator<Item = Variable>,
    {
        let mut coords = Coordinates::new();
        let mut map = BTreeMap::new();
        for var in variables {
            let var = var.share_axes(&mut coords)?;
            let name = var.name().to_owned();
            if map.insert(name.clone(), var).is_some() {
                return Err(Error::DuplicateVariable(name));
            }
        }
        Ok(Self {
            coords,
            variables: map,
        })
    }

    /// Combines the variables of both datasets.
    pub fn merge(&self, other: &Dataset) -> Result<Dataset> {
        let mut coords = self.coords.merge(&other.coords)?;
        let mut variables = self.variables.clone();
        for (name, var) in &other.variables {
            if variables.contains_key(name) {
                return Err(Error::DuplicateVariable(name.clone()));
            }
            variables.insert(name.clone(), var.clone().share_axes(&mut coords)?);
        }
        Ok(Self { coords, variables })
    }

    pub fn coords(&self) -> &Coordinates {
        &self.coords
    }

    /// Names and lengths of the dimensions.
    pub fn dims(&self) -> Vec<(&str, usize)> {
        self.coords.dims()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Like [`variable`], but fails with [`Error::VariableNotFound`].
    ///
    /// [`variable`]: Dataset::variable
    pub fn get(&self, name: &str) -> Result<&Variable> {
        self.variable(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_owned()))
    }

    /// Variable names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Selects by coordinate value in every variable having the selected
    /// dimensions. Other variables are kept as they are.
    pub fn sel(&self, selectors: &[(&str, f64)], options: SelectOptions) -> Result<Dataset> {
        for (i, (dim, _)) in selectors.iter().enumerate() {
            if !self.coords.contains(dim) {
                return Err(Error::DimensionNotFound(dim.to_string()));
            }
            if selectors[..i].iter().any(|(d, _)| d == dim) {
                return Err(Error::DuplicateSelector(dim.to_string()));
            }
        }

        let mut variables = BTreeMap::new();
        for (name, var) in &self.variables {
            let own = selectors
                .iter()
                .filter(|(dim, _)| var.axis(dim).is_some())
                .copied()
                .collect::<Vec<_>>();
            let selected = if own.is_empty() {
                var.clone()
            } else {
                var.sel(&own, options)?
            };
            variables.insert(name.clone(), selected);
        }

        let mut coords = self.coords.clone();
        coords.retain(|a| !selectors.iter().any(|(dim, _)| a.name() == *dim));
        Ok(Self { coords, variables })
    }

    /// Keeps the part of dimension `dim` whose coordinates lie between `a`
    /// and `b`, both inclusive, in either order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use grib_dataset::{CoordinateAxis, Dataset, Variable};
    /// use ndarray::{ArrayD, IxDyn};
    ///
    /// let lat = Arc::new(CoordinateAxis::new("latitude", vec![50.0, 40.0, 30.0]).unwrap());
    /// let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap();
    /// let ds = Dataset::from_variables([Variable::new("v", vec![lat], data).unwrap()]).unwrap();
    ///
    /// let north = ds.sel_range("latitude", 55.0, 40.0).unwrap();
    /// assert_eq!(north.dims(), vec![("latitude", 2)]);
    /// ```
    pub fn sel_range(&self, dim: &str, a: f64, b: f64) -> Result<Dataset> {
        let axis = self
            .coords
            .get(dim)
            .ok_or_else(|| Error::DimensionNotFound(dim.to_owned()))?;
        let range = axis.slice_range(a, b);
        let sliced = Arc::new(axis.subset(range.clone()));

        let mut variables = BTreeMap::new();
        for (name, var) in &self.variables {
            let var = match var.dims().iter().position(|d| *d == dim) {
                Some(pos) => var.slice_axis(pos, sliced.clone(), range.clone()),
                None => var.clone(),
            };
            variables.insert(name.clone(), var);
        }

        let mut coords = self.coords.clone();
        coords.replace(sliced);
        Ok(Self { coords, variables })
    }

    pub(crate) fn from_parts(coords: Coordinates, variables: BTreeMap<String, Variable>) -> Self {
        Self { coords, variables }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = (&'a String, &'a Variable);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

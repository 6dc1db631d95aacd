use std::sync::Arc;

use crate::{axis::CoordinateAxis, error::*};

/// The coordinate axes of a dataset, keyed by name in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    axes: Vec<Arc<CoordinateAxis>>,
}

impl Coordinates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from axes. Axes sharing a name must be equal.
    pub fn from_axes<I>(axes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<CoordinateAxis>>,
    {
        let mut coords = Self::new();
        for axis in axes {
            coords.insert(axis)?;
        }
        Ok(coords)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CoordinateAxis>> {
        self.axes.iter().find(|a| a.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<CoordinateAxis>> {
        self.axes.iter()
    }

    /// Names and lengths of the axes.
    pub fn dims(&self) -> Vec<(&str, usize)> {
        self.axes.iter().map(|a| (a.name(), a.len())).collect()
    }

    /// Union of both sets. Axes present in both must be equal; the axis of
    /// `self` is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use grib_dataset::{CoordinateAxis, Coordinates};
    ///
    /// let lat = Arc::new(CoordinateAxis::new("latitude", vec![1.0, 0.0]).unwrap());
    /// let lon = Arc::new(CoordinateAxis::new("longitude", vec![0.0, 1.0]).unwrap());
    /// let left = Coordinates::from_axes([lat.clone()]).unwrap();
    /// let right = Coordinates::from_axes([lon, lat.clone()]).unwrap();
    /// let merged = left.merge(&right).unwrap();
    /// assert_eq!(merged.dims(), vec![("latitude", 2), ("longitude", 2)]);
    ///
    /// let other_lat = Arc::new(CoordinateAxis::new("latitude", vec![2.0, 0.0]).unwrap());
    /// let conflicting = Coordinates::from_axes([other_lat]).unwrap();
    /// assert!(left.merge(&conflicting).is_err());
    /// ```
    pub fn merge(&self, other: &Coordinates) -> Result<Coordinates> {
        let mut merged = self.clone();
        for axis in other.iter() {
            merged.insert(axis.clone())?;
        }
        Ok(merged)
    }

    /// Adds `axis` unless an equal axis of the same name is present, and
    /// returns the axis stored under that name.
    pub(crate) fn insert(&mut self, axis: Arc<CoordinateAxis>) -> Result<Arc<CoordinateAxis>> {
        match self.get(axis.name()) {
            Some(existing) if Arc::ptr_eq(existing, &axis) || **existing == *axis => {
                Ok(existing.clone())
            }
            Some(_) => Err(Error::CoordinateConflict(axis.name().to_owned())),
            None => {
                self.axes.push(axis.clone());
                Ok(axis)
            }
        }
    }

    /// Drops the axes for which `keep` returns false.
    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Arc<CoordinateAxis>) -> bool,
    {
        self.axes.retain(keep)
    }

    /// Replaces the axis of the same name.
    pub(crate) fn replace(&mut self, axis: Arc<CoordinateAxis>) {
        if let Some(slot) = self.axes.iter_mut().find(|a| a.name() == axis.name()) {
            *slot = axis;
        }
    }
}

impl<'a> IntoIterator for &'a Coordinates {
    type Item = &'a Arc<CoordinateAxis>;
    type IntoIter = std::slice::Iter<'a, Arc<CoordinateAxis>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

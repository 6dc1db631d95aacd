//! Elementwise arithmetic between datasets (or variables) and scalars.
//!
//! Results are new values; coordinate axes are shared with the operand, not
//! copied.
//!
//! ```
//! use std::sync::Arc;
//!
//! use grib_dataset::{CoordinateAxis, Dataset, Variable};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let x = Arc::new(CoordinateAxis::new("x", vec![0.0, 1.0]).unwrap());
//! let data = ArrayD::from_shape_vec(IxDyn(&[2]), vec![273.15, 300.0]).unwrap();
//! let ds = Dataset::from_variables([Variable::new("t2m", vec![x], data).unwrap()]).unwrap();
//!
//! let celsius = &ds - 273.15;
//! let t2m = celsius.get("t2m").unwrap();
//! assert_eq!(t2m.values()[[0]], 0.0);
//! assert!((t2m.values()[[1]] - 26.85).abs() < 1e-9);
//! ```

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    ops,
};

use num::Float;

use crate::{
    dataset::Dataset,
    variable::{Attributes, Variable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ScalarOp {
    #[inline]
    pub fn apply<F: Float>(self, value: F, operand: F) -> F {
        match self {
            Self::Add => value + operand,
            Self::Sub => value - operand,
            Self::Mul => value * operand,
            Self::Div => value / operand,
        }
    }
}

impl Display for ScalarOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        };
        write!(f, "{s}")
    }
}

impl Variable {
    /// Applies `op` with `operand` to every element. Units and long name are
    /// dropped from the result.
    pub fn apply_scalar(&self, op: ScalarOp, operand: f64) -> Variable {
        self.map_values(|v| op.apply(v, operand), Attributes::default())
    }
}

impl Dataset {
    /// Applies `op` with `operand` to every element of every variable.
    pub fn apply_scalar(&self, op: ScalarOp, operand: f64) -> Dataset {
        let variables = self
            .into_iter()
            .map(|(name, var)| (name.clone(), var.apply_scalar(op, operand)))
            .collect::<BTreeMap<_, _>>();
        Dataset::from_parts(self.coords().clone(), variables)
    }
}

macro_rules! impl_scalar_ops {
    ($(($trait:ident, $method:ident, $op:expr),)*) => ($(
        impl ops::$trait<f64> for &Dataset {
            type Output = Dataset;

            fn $method(self, rhs: f64) -> Dataset {
                self.apply_scalar($op, rhs)
            }
        }

        impl ops::$trait<f64> for &Variable {
            type Output = Variable;

            fn $method(self, rhs: f64) -> Variable {
                self.apply_scalar($op, rhs)
            }
        }
    )*);
}

impl_scalar_ops! {
    (Add, add, ScalarOp::Add),
    (Sub, sub, ScalarOp::Sub),
    (Mul, mul, ScalarOp::Mul),
    (Div, div, ScalarOp::Div),
}

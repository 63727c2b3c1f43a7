//! # Named axis positions
//!
//! A [`Position`] is an ordered vector of axis values tagged with the axis names
//! it was built for. It is used for both spaces:
//!
//! - **physical** positions, named after the geometry's axes (or their remapped names),
//! - **pseudo** positions, named after the active engine's pseudo axes.
//!
//! The arity is validated once, at construction; a `Position` is never mutated
//! afterwards. Values are expressed in the calculator's unit system.
//!
//! ```rust
//! use recip_calc::position::Position;
//!
//! let pos = Position::new(vec!["omega".into(), "tth".into()], vec![10.0, 20.0]).unwrap();
//! assert_eq!(pos.get("tth"), Some(20.0));
//! assert_eq!(pos.to_string(), "(omega=10, tth=20)");
//! ```

use std::{fmt, ops::Index};

use itertools::Itertools;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::calc_errors::CalcError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    names: Vec<String>,
    values: Vec<f64>,
}

impl Position {
    /// Build a position from axis names and their values.
    ///
    /// Arguments
    /// -----------------
    /// * `names`: axis names, in canonical order.
    /// * `values`: one value per axis, same order.
    ///
    /// Return
    /// ----------
    /// * The position, or [`CalcError::ArityMismatch`] if the lengths differ.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self, CalcError> {
        if names.len() != values.len() {
            return Err(CalcError::ArityMismatch {
                expected: names.len(),
                got: values.len(),
            });
        }
        Ok(Position { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the axis called `name`, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.values)
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for Position {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl Index<usize> for Position {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})",
            self.iter().map(|(name, v)| format!("{name}={v}")).join(", ")
        )
    }
}

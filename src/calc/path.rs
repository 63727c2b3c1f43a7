//! Paths through pseudo space and lazy conversion along them.

use std::{fmt, iter::FusedIterator, str::FromStr, vec};

use itertools::Itertools;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::{keeper::UsingEngine, CalcRecip};
use crate::{calc_errors::CalcError, position::Position};

/// Shape of a generated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    /// `n` equal steps on the straight segment, both ends included.
    #[default]
    Linear,
}

impl PathKind {
    pub fn name(&self) -> &'static str {
        match self {
            PathKind::Linear => "linear",
        }
    }

    /// Generate the points from `start` to `end` (same length) in `n` steps.
    pub fn generate(&self, start: &[f64], end: &[f64], n: usize) -> Vec<Vec<f64>> {
        match self {
            PathKind::Linear => linear_path(start, end, n),
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PathKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(PathKind::Linear),
            _ => Err(CalcError::UnknownPathType(s.to_string())),
        }
    }
}

impl TryFrom<&str> for PathKind {
    type Error = CalcError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// `n + 1` evenly spaced points, `start` and `end` reproduced exactly.
///
/// With `n == 0` the path is the single point `start`.
fn linear_path(start: &[f64], end: &[f64], n: usize) -> Vec<Vec<f64>> {
    if n == 0 {
        return vec![start.to_vec()];
    }
    let start_v = DVector::from_column_slice(start);
    let end_v = DVector::from_column_slice(end);
    let step = (&end_v - &start_v) / n as f64;

    (0..=n)
        .map(|i| {
            if i == n {
                end.to_vec()
            } else {
                (&start_v + &step * i as f64).as_slice().to_vec()
            }
        })
        .collect()
}

/// Where a path starts: a single pseudo vector, or a ready-made stack of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathStart<'a> {
    Single(&'a [f64]),
    Stack(&'a [Vec<f64>]),
}

impl<'a> From<&'a [f64]> for PathStart<'a> {
    fn from(values: &'a [f64]) -> Self {
        PathStart::Single(values)
    }
}

impl<'a> From<&'a Vec<f64>> for PathStart<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        PathStart::Single(values)
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for PathStart<'a> {
    fn from(values: &'a [f64; N]) -> Self {
        PathStart::Single(values)
    }
}

impl<'a> From<&'a [Vec<f64>]> for PathStart<'a> {
    fn from(rows: &'a [Vec<f64>]) -> Self {
        PathStart::Stack(rows)
    }
}

impl<'a> From<&'a Vec<Vec<f64>>> for PathStart<'a> {
    fn from(rows: &'a Vec<Vec<f64>>) -> Self {
        PathStart::Stack(rows)
    }
}

/// Build a path for an engine with `arity` pseudo axes.
///
/// Accepted shapes
/// -----------------
/// * single `start` and single `end` of length `arity` → `kind` generator (`n + 1` points)
/// * single `start` of length `arity`, no `end` → `[start]`
/// * non-empty stack whose rows all have length `arity`, no `end` → the rows unchanged
///
/// Anything else fails with [`CalcError::InvalidPath`].
pub fn build_path(
    arity: usize,
    start: PathStart<'_>,
    end: Option<&[f64]>,
    n: usize,
    kind: PathKind,
) -> Result<Vec<Vec<f64>>, CalcError> {
    let invalid = |reason: String| Err(CalcError::InvalidPath(reason));
    match (start, end) {
        (PathStart::Single(start), Some(end)) => {
            if start.len() != arity || end.len() != arity {
                return invalid(format!(
                    "start and end need {arity} values, got {} and {}",
                    start.len(),
                    end.len()
                ));
            }
            Ok(kind.generate(start, end, n))
        }
        (PathStart::Single(start), None) => {
            if start.len() != arity {
                return invalid(format!("expected {arity} values, got {}", start.len()));
            }
            Ok(vec![start.to_vec()])
        }
        (PathStart::Stack(rows), None) => {
            if rows.is_empty() {
                return invalid("empty stack of positions".into());
            }
            if let Some(row) = rows.iter().find(|row| row.len() != arity) {
                return invalid(format!(
                    "every row needs {arity} values, found one with {}",
                    row.len()
                ));
            }
            Ok(rows.to_vec())
        }
        (PathStart::Stack(_), Some(_)) => {
            invalid("a stack of positions cannot be combined with an end position".into())
        }
    }
}

impl CalcRecip {
    /// Path of pseudo positions for the active engine.
    ///
    /// Arguments
    /// -----------------
    /// * `start`: a single pseudo position or a stack of them.
    /// * `end`: optional end position; only valid with a single `start`.
    /// * `n`: number of steps when interpolating.
    /// * `kind`: path shape.
    ///
    /// Return
    /// ----------
    /// * The list of pseudo positions, or [`CalcError::InvalidPath`].
    ///
    /// See also
    /// ------------
    /// * [`build_path`] – Shape rules.
    /// * [`CalcRecip::forward_path`] – Convert every point of a path.
    pub fn get_path<'a>(
        &self,
        start: impl Into<PathStart<'a>>,
        end: Option<&[f64]>,
        n: usize,
        kind: PathKind,
    ) -> Result<Vec<Vec<f64>>, CalcError> {
        let arity = self.with_state(|state| state.pseudo_arity())?;
        build_path(arity, start.into(), end, n, kind)
    }

    /// Lazily compute [`CalcRecip::forward`] at every point of a path.
    ///
    /// The path is validated against `engine` (or the active engine) before the
    /// first item is produced. Each item is the candidate list of one point;
    /// iteration stops after the first error.
    ///
    /// With an `engine` override, the override is selected once and stays in
    /// effect until the iterator is exhausted, fails or is dropped. During that
    /// time the iterator holds the calculator's lock: other threads wait, while
    /// the current thread can keep using the calculator.
    pub fn forward_path<'a>(
        &self,
        start: impl Into<PathStart<'a>>,
        end: Option<&[f64]>,
        n: usize,
        kind: PathKind,
        engine: Option<&str>,
    ) -> Result<ForwardPath<'_>, CalcError> {
        let engine_guard = match engine {
            Some(_) => Some(UsingEngine::new(self, engine)?),
            None => None,
        };
        let points = self.get_path(start, end, n, kind)?;
        Ok(ForwardPath {
            calc: self,
            points: points.into_iter(),
            engine: engine.map(str::to_string),
            engine_guard,
            done: false,
        })
    }
}

/// Iterator returned by [`CalcRecip::forward_path`].
pub struct ForwardPath<'a> {
    calc: &'a CalcRecip,
    points: vec::IntoIter<Vec<f64>>,
    engine: Option<String>,
    engine_guard: Option<UsingEngine<'a>>,
    done: bool,
}

impl ForwardPath<'_> {
    /// Points not converted yet.
    pub fn remaining(&self) -> &[Vec<f64>] {
        if self.done {
            &[]
        } else {
            self.points.as_slice()
        }
    }

    /// Stop iterating and give the previous engine back.
    fn finish(&mut self) {
        self.done = true;
        self.engine_guard = None;
    }
}

impl fmt::Debug for ForwardPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardPath")
            .field("engine", &self.engine)
            .field(
                "remaining",
                &self.remaining().iter().map(|p| format!("{p:?}")).join(", "),
            )
            .finish()
    }
}

impl Iterator for ForwardPath<'_> {
    type Item = Result<Vec<Position>, CalcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(point) = self.points.next() else {
            self.finish();
            return None;
        };
        // the override, if any, is already active
        let result = self.calc.forward(&point, None);
        if result.is_err() || self.points.as_slice().is_empty() {
            self.finish();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining().len()))
    }
}

impl FusedIterator for ForwardPath<'_> {}

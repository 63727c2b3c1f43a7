//! # Diffractometer geometry
//!
//! [`Geometry`] is the physical state shared by every engine of a calculator:
//! the ordered list of motor axes with their current values and the source
//! wavelength. Values are stored in internal units (radians, nanometers);
//! conversion to the caller's [`UnitSystem`](crate::units::UnitSystem) happens in
//! the orchestrator.
//!
//! The [`Detector`] is an opaque descriptor handed to the engines when they are
//! bound; only point detectors are modeled.

use crate::{
    calc_errors::CalcError,
    constants::{Nanometer, DEFAULT_WAVELENGTH},
    units::Quantity,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub quantity: Quantity,
    value: f64,
}

impl Axis {
    pub fn new(name: impl Into<String>, quantity: Quantity) -> Self {
        Axis {
            name: name.into(),
            quantity,
            value: 0.0,
        }
    }

    pub fn angle(name: impl Into<String>) -> Self {
        Axis::new(name, Quantity::Angle)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    name: String,
    axes: Vec<Axis>,
    wavelength: Nanometer,
}

impl Geometry {
    /// Create a geometry with every axis at zero and the default wavelength.
    pub fn new(name: impl Into<String>, axes: Vec<Axis>) -> Self {
        Geometry {
            name: name.into(),
            axes,
            wavelength: DEFAULT_WAVELENGTH,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis_names(&self) -> Vec<String> {
        self.axes.iter().map(|axis| axis.name.clone()).collect()
    }

    pub fn quantities(&self) -> Vec<Quantity> {
        self.axes.iter().map(|axis| axis.quantity).collect()
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis.name == name)
    }

    /// Value of the axis `name` in internal units.
    pub fn axis_value(&self, name: &str) -> Option<f64> {
        self.axis_index(name).map(|idx| self.axes[idx].value)
    }

    /// All axis values in canonical order, internal units.
    pub fn values(&self) -> Vec<f64> {
        self.axes.iter().map(Axis::value).collect()
    }

    /// Overwrite every axis value.
    ///
    /// Return
    /// ----------
    /// * [`CalcError::ArityMismatch`] if `values` does not have one entry per axis;
    ///   the geometry is left untouched in that case.
    pub fn set_values(&mut self, values: &[f64]) -> Result<(), CalcError> {
        if values.len() != self.axes.len() {
            return Err(CalcError::ArityMismatch {
                expected: self.axes.len(),
                got: values.len(),
            });
        }
        for (axis, value) in self.axes.iter_mut().zip(values) {
            axis.value = *value;
        }
        Ok(())
    }

    pub fn wavelength(&self) -> Nanometer {
        self.wavelength
    }

    pub fn set_wavelength(&mut self, wavelength: Nanometer) -> Result<(), CalcError> {
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(CalcError::InvalidParameter(format!(
                "wavelength must be positive and finite, got {wavelength}"
            )));
        }
        self.wavelength = wavelength;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detector {
    /// Point detector.
    #[default]
    ZeroD,
}

#[cfg(test)]
mod test_geometry {
    use super::*;

    fn two_circle() -> Geometry {
        Geometry::new("TwoC", vec![Axis::angle("omega"), Axis::angle("tth")])
    }

    #[test]
    fn test_set_values_checks_arity() {
        let mut geometry = two_circle();
        geometry.set_values(&[0.1, 0.2]).unwrap();
        assert_eq!(geometry.values(), vec![0.1, 0.2]);

        let err = geometry.set_values(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            CalcError::ArityMismatch {
                expected: 2,
                got: 1
            }
        );
        assert_eq!(geometry.values(), vec![0.1, 0.2]);
        assert_eq!(geometry.axis_value("tth"), Some(0.2));
    }

    #[test]
    fn test_wavelength_must_be_positive() {
        let mut geometry = two_circle();
        assert_eq!(geometry.wavelength(), DEFAULT_WAVELENGTH);
        assert!(geometry.set_wavelength(0.0).is_err());
        assert!(geometry.set_wavelength(f64::NAN).is_err());
        geometry.set_wavelength(0.1).unwrap();
        assert_eq!(geometry.wavelength(), 0.1);
    }
}

//! # Unit systems
//!
//! Engines and the [`Geometry`](crate::geometry::Geometry) store every value in
//! *internal* units (radians, nanometers). Callers read and write values in the
//! unit system selected at construction:
//!
//! | mode      | angle   | length | inverse length |
//! |-----------|---------|--------|----------------|
//! | `user`    | degrees | nm     | nm⁻¹           |
//! | `default` | radians | nm     | nm⁻¹           |
//!
//! Each axis carries a [`Quantity`] so the conversion factor is looked up per axis.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{calc_errors::CalcError, constants::RADEG};

/// Physical dimension of an axis value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Angle,
    Length,
    InverseLength,
    Dimensionless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Degrees and nanometers.
    #[default]
    User,
    /// Radians and nanometers, the engines' own representation.
    Default,
}

impl UnitSystem {
    /// Number of user units in one internal unit of `quantity`.
    pub fn factor(&self, quantity: Quantity) -> f64 {
        match (self, quantity) {
            (UnitSystem::User, Quantity::Angle) => 1.0 / RADEG,
            _ => 1.0,
        }
    }

    pub fn to_user(&self, quantity: Quantity, internal: f64) -> f64 {
        internal * self.factor(quantity)
    }

    pub fn to_internal(&self, quantity: Quantity, user: f64) -> f64 {
        user / self.factor(quantity)
    }

    /// Convert a whole vector, axis by axis.
    ///
    /// `quantities` and `values` are zipped; the caller checks arity beforehand.
    pub(crate) fn vec_to_user(&self, quantities: &[Quantity], values: &[f64]) -> Vec<f64> {
        quantities
            .iter()
            .zip(values)
            .map(|(q, v)| self.to_user(*q, *v))
            .collect()
    }

    pub(crate) fn vec_to_internal(&self, quantities: &[Quantity], values: &[f64]) -> Vec<f64> {
        quantities
            .iter()
            .zip(values)
            .map(|(q, v)| self.to_internal(*q, *v))
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitSystem::User => "user",
            UnitSystem::Default => "default",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitSystem {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UnitSystem::User),
            "default" => Ok(UnitSystem::Default),
            _ => Err(CalcError::UnknownUnits(s.to_string())),
        }
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = CalcError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod test_units {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_conversion() {
        let user = UnitSystem::User;
        assert_relative_eq!(
            user.to_user(Quantity::Angle, std::f64::consts::PI),
            180.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            user.to_internal(Quantity::Angle, 90.0),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );

        let default = UnitSystem::Default;
        assert_eq!(default.to_user(Quantity::Angle, 1.25), 1.25);
        assert_eq!(user.to_user(Quantity::InverseLength, 3.5), 3.5);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("user".parse::<UnitSystem>(), Ok(UnitSystem::User));
        assert_eq!(UnitSystem::try_from("default"), Ok(UnitSystem::Default));
        assert_eq!(
            "furlong".parse::<UnitSystem>(),
            Err(CalcError::UnknownUnits("furlong".into()))
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&UnitSystem::Default).unwrap();
        assert_eq!(json, "\"default\"");
        let back: UnitSystem = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(back, UnitSystem::User);
    }
}

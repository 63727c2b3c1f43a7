//! Bijective renaming of physical axes.
//!
//! The geometry knows its axes by canonical names (`omega`, `tth`, ...). A beamline
//! usually wants its own motor names instead; [`AxisNameRemap`] keeps both
//! directions of that mapping so lookups from either side are O(1).

use std::collections::HashMap;

use itertools::Itertools;

use crate::calc_errors::CalcError;

#[derive(Debug, Clone, PartialEq)]
pub struct AxisNameRemap {
    to_user: HashMap<String, String>,
    to_canonical: HashMap<String, String>,
    /// User names in canonical axis order.
    ordered: Vec<String>,
}

impl AxisNameRemap {
    /// Build a remap for `canonical` axes from a `{canonical: user}` mapping.
    ///
    /// The mapping must cover exactly the canonical axis set (no missing, no
    /// extra keys) and its values must be pairwise distinct.
    ///
    /// Arguments
    /// -----------------
    /// * `canonical`: the geometry's axis names, in canonical order.
    /// * `mapping`: canonical name → exposed name.
    ///
    /// Return
    /// ----------
    /// * The remap, or [`CalcError::InvalidAxisMapping`] describing the first violation.
    pub fn try_new(
        canonical: &[String],
        mapping: &HashMap<String, String>,
    ) -> Result<Self, CalcError> {
        let missing = canonical
            .iter()
            .filter(|name| !mapping.contains_key(*name))
            .join(", ");
        if !missing.is_empty() {
            return Err(CalcError::InvalidAxisMapping(format!(
                "missing axes: {missing}"
            )));
        }

        let extra = mapping
            .keys()
            .filter(|key| !canonical.contains(key))
            .sorted()
            .join(", ");
        if !extra.is_empty() {
            return Err(CalcError::InvalidAxisMapping(format!(
                "not a physical axis: {extra}"
            )));
        }

        if !mapping.values().all_unique() {
            return Err(CalcError::InvalidAxisMapping(
                "target names are not unique".into(),
            ));
        }

        let ordered = canonical.iter().map(|name| mapping[name].clone()).collect();
        let to_canonical = mapping
            .iter()
            .map(|(canon, user)| (user.clone(), canon.clone()))
            .collect();

        Ok(AxisNameRemap {
            to_user: mapping.clone(),
            to_canonical,
            ordered,
        })
    }

    pub fn user_name(&self, canonical: &str) -> Option<&str> {
        self.to_user.get(canonical).map(String::as_str)
    }

    pub fn canonical_name(&self, user: &str) -> Option<&str> {
        self.to_canonical.get(user).map(String::as_str)
    }

    /// Exposed names, in canonical axis order.
    pub fn names(&self) -> &[String] {
        &self.ordered
    }
}

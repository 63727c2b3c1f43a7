//! # Samples and the sample registry
//!
//! A [`Sample`] bundles the crystal lattice and orientation an engine solves
//! against. Samples are shared as `Arc<Sample>`: the registry owns them, the
//! calculator only keeps a reference to the active one, and two handles denote
//! the same sample iff [`Arc::ptr_eq`] holds.
//!
//! [`SampleRegistry`] enforces unique names and tracks which sample is active.
//! It does not talk to the engines; the calculator re-initializes them whenever
//! the active sample changes.

use std::{collections::BTreeMap, sync::Arc};

use nalgebra::Matrix3;

use crate::{
    calc_errors::CalcError,
    constants::{Degree, Nanometer},
};

/// Direct-space lattice parameters (nm, degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub a: Nanometer,
    pub b: Nanometer,
    pub c: Nanometer,
    pub alpha: Degree,
    pub beta: Degree,
    pub gamma: Degree,
}

impl Lattice {
    /// Build a lattice, rejecting non-positive lengths and angles outside (0, 180).
    pub fn new(
        a: Nanometer,
        b: Nanometer,
        c: Nanometer,
        alpha: Degree,
        beta: Degree,
        gamma: Degree,
    ) -> Result<Self, CalcError> {
        let lengths_ok = [a, b, c].iter().all(|l| l.is_finite() && *l > 0.0);
        let angles_ok = [alpha, beta, gamma]
            .iter()
            .all(|ang| ang.is_finite() && *ang > 0.0 && *ang < 180.0);
        if !lengths_ok || !angles_ok {
            return Err(CalcError::InvalidParameter(format!(
                "invalid lattice ({a}, {b}, {c}, {alpha}, {beta}, {gamma})"
            )));
        }
        Ok(Lattice {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        })
    }

    pub fn cubic(a: Nanometer) -> Result<Self, CalcError> {
        Lattice::new(a, a, a, 90.0, 90.0, 90.0)
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Lattice {
            a: 1.54,
            b: 1.54,
            c: 1.54,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: String,
    pub lattice: Lattice,
    /// Orientation matrix U of the crystal on the sample stage.
    pub orientation: Matrix3<f64>,
}

impl Sample {
    pub fn new(name: impl Into<String>) -> Self {
        Sample {
            name: name.into(),
            lattice: Lattice::default(),
            orientation: Matrix3::identity(),
        }
    }

    pub fn with_lattice(mut self, lattice: Lattice) -> Self {
        self.lattice = lattice;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How the caller designates a sample: by registered name or by handle.
#[derive(Debug, Clone)]
pub enum SampleRef<'a> {
    Name(&'a str),
    Instance(Arc<Sample>),
}

impl<'a> From<&'a str> for SampleRef<'a> {
    fn from(name: &'a str) -> Self {
        SampleRef::Name(name)
    }
}

impl From<Arc<Sample>> for SampleRef<'_> {
    fn from(sample: Arc<Sample>) -> Self {
        SampleRef::Instance(sample)
    }
}

impl From<Sample> for SampleRef<'_> {
    fn from(sample: Sample) -> Self {
        SampleRef::Instance(Arc::new(sample))
    }
}

#[derive(Debug, Default)]
pub struct SampleRegistry {
    samples: BTreeMap<String, Arc<Sample>>,
    active: Option<Arc<Sample>>,
}

impl SampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Arc<Sample>> {
        self.active.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Sample>> {
        self.samples.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.samples.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether this exact handle is registered.
    pub fn contains(&self, sample: &Arc<Sample>) -> bool {
        self.samples
            .get(sample.name())
            .is_some_and(|registered| Arc::ptr_eq(registered, sample))
    }

    /// Register a sample under its own name. Does not activate it.
    pub fn add(&mut self, sample: Arc<Sample>) -> Result<Arc<Sample>, CalcError> {
        if self.samples.contains_key(sample.name()) {
            return Err(CalcError::DuplicateSampleName(sample.name().to_string()));
        }
        self.samples
            .insert(sample.name().to_string(), Arc::clone(&sample));
        Ok(sample)
    }

    /// Resolve a [`SampleRef`] to a registered handle, registering unknown instances.
    pub fn resolve(&mut self, sample: SampleRef<'_>) -> Result<Arc<Sample>, CalcError> {
        match sample {
            SampleRef::Name(name) => self
                .samples
                .get(name)
                .cloned()
                .ok_or_else(|| CalcError::SampleNotFound(name.to_string())),
            SampleRef::Instance(sample) if self.contains(&sample) => Ok(sample),
            SampleRef::Instance(sample) => self.add(sample),
        }
    }

    /// Whether activating `sample` would change nothing.
    pub fn is_active(&self, sample: &SampleRef<'_>) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        match sample {
            SampleRef::Name(name) => active.name() == *name,
            SampleRef::Instance(sample) => {
                Arc::ptr_eq(active, sample) || active.name() == sample.name()
            }
        }
    }

    /// Mark a registered sample as active.
    pub(crate) fn activate(&mut self, sample: Arc<Sample>) {
        self.active = Some(sample);
    }

    /// Rename the active sample; the handle is replaced by a renamed copy.
    pub fn rename_active(&mut self, new_name: &str) -> Result<Arc<Sample>, CalcError> {
        let active = self.active.clone().ok_or(CalcError::NotReady("sample"))?;
        if active.name() == new_name {
            return Ok(active);
        }
        if self.samples.contains_key(new_name) {
            return Err(CalcError::DuplicateSampleName(new_name.to_string()));
        }

        let mut renamed = (*active).clone();
        renamed.name = new_name.to_string();
        let renamed = Arc::new(renamed);

        self.samples.remove(active.name());
        self.samples
            .insert(new_name.to_string(), Arc::clone(&renamed));
        self.active = Some(Arc::clone(&renamed));
        Ok(renamed)
    }

    /// Drop a sample that is not active.
    pub fn remove(&mut self, name: &str) -> Result<Arc<Sample>, CalcError> {
        if self.active.as_ref().is_some_and(|a| a.name() == name) {
            return Err(CalcError::SampleInUse(name.to_string()));
        }
        self.samples
            .remove(name)
            .ok_or_else(|| CalcError::SampleNotFound(name.to_string()))
    }
}

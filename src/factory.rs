//! # Diffractometer factories
//!
//! Each diffractometer type (`"TwoC"`, `"E4CV"`, `"K6C"`, ...) is pure
//! configuration: a tag that yields a fresh [`Geometry`] and the matching
//! [`EngineList`]. [`FactoryRegistry`] maps tags to [`Factory`] implementations;
//! [`FactoryRegistry::builtin`] provides the geometries shipped with the crate
//! (see [`crate::geometries`]), and solver backends register their own.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{calc_errors::CalcError, engine::EngineList, geometry::Geometry};

pub trait Factory: Send + Sync {
    /// Tag under which the factory is registered.
    fn name(&self) -> &str;

    fn create_geometry(&self) -> Geometry;

    fn create_engine_list(&self) -> EngineList;
}

#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: BTreeMap<String, Arc<dyn Factory>>,
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every geometry shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = FactoryRegistry::new();
        registry.register(Arc::new(crate::geometries::TwoCFactory));
        registry
    }

    /// Register `factory` under its own tag, replacing any previous one.
    pub fn register(&mut self, factory: Arc<dyn Factory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    /// Look up a factory by tag.
    ///
    /// Return
    /// ----------
    /// * The factory, or [`CalcError::UnknownGeometryType`] listing the known tags.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Factory>, CalcError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| CalcError::UnknownGeometryType {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.names())
            .finish()
    }
}

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use recip_calc::{
    calc::{CalcParams, CalcRecip},
    engine::{Engine, EngineList, SolverError},
    factory::{Factory, FactoryRegistry},
    geometry::{Axis, Detector, Geometry},
    sample::Sample,
    units::Quantity,
};

pub const MOCK: &str = "MOCK";
pub const BROKEN: &str = "broken";

/// Two dimensionless axes `a` and `b`, so unit systems leave values untouched.
///
/// Engines:
/// - `sum`: pseudo `x = a + b`, two candidates `[x, 0]` and `[0, x]`. A target is
///   reachable when `reachable(x)` holds and it is at most `max_step` away from
///   the current `x`.
/// - `double`: pseudo `y = 2a`, always reachable, keeps `b`.
/// - `bounded`: pseudo `z = a / wavelength`. Computing it fails once `|z|`
///   exceeds `limit`, and binding fails for a sample named [`BROKEN`].
#[derive(Clone)]
pub struct MockFactory {
    pub reachable: fn(f64) -> bool,
    pub max_step: f64,
    pub limit: f64,
    pub inits: Arc<AtomicUsize>,
}

impl Default for MockFactory {
    fn default() -> Self {
        MockFactory {
            reachable: |_| true,
            max_step: f64::INFINITY,
            limit: f64::INFINITY,
            inits: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Factory for MockFactory {
    fn name(&self) -> &str {
        MOCK
    }

    fn create_geometry(&self) -> Geometry {
        Geometry::new(
            MOCK,
            vec![
                Axis::new("a", Quantity::Dimensionless),
                Axis::new("b", Quantity::Dimensionless),
            ],
        )
    }

    fn create_engine_list(&self) -> EngineList {
        EngineList::new(vec![
            Box::new(SumEngine {
                pseudo: [Axis::new("x", Quantity::Dimensionless)],
                solutions: Vec::new(),
                reachable: self.reachable,
                max_step: self.max_step,
                inits: Arc::clone(&self.inits),
            }),
            Box::new(DoubleEngine {
                pseudo: [Axis::new("y", Quantity::Dimensionless)],
                solutions: Vec::new(),
            }),
            Box::new(BoundedEngine {
                pseudo: [Axis::new("z", Quantity::Dimensionless)],
                solutions: Vec::new(),
                limit: self.limit,
            }),
        ])
    }
}

pub struct SumEngine {
    pseudo: [Axis; 1],
    solutions: Vec<Vec<f64>>,
    reachable: fn(f64) -> bool,
    max_step: f64,
    inits: Arc<AtomicUsize>,
}

impl Engine for SumEngine {
    fn name(&self) -> &str {
        "sum"
    }

    fn pseudo_axes(&self) -> &[Axis] {
        &self.pseudo
    }

    fn initialize(
        &mut self,
        _geometry: &Geometry,
        _detector: &Detector,
        _sample: &Sample,
    ) -> Result<(), SolverError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError> {
        self.pseudo[0].set_value(geometry.values().iter().sum());
        Ok(())
    }

    fn set_pseudo_values(
        &mut self,
        geometry: &Geometry,
        values: &[f64],
    ) -> Result<(), SolverError> {
        let x = values[0];
        let current: f64 = geometry.values().iter().sum();
        if !(self.reachable)(x) || (x - current).abs() > self.max_step {
            return Err(SolverError::Unreachable {
                engine: "sum".into(),
                values: values.to_vec(),
            });
        }
        self.pseudo[0].set_value(x);
        self.solutions = vec![vec![x, 0.0], vec![0.0, x]];
        Ok(())
    }

    fn solutions(&self) -> &[Vec<f64>] {
        &self.solutions
    }
}

pub struct DoubleEngine {
    pseudo: [Axis; 1],
    solutions: Vec<Vec<f64>>,
}

impl Engine for DoubleEngine {
    fn name(&self) -> &str {
        "double"
    }

    fn pseudo_axes(&self) -> &[Axis] {
        &self.pseudo
    }

    fn initialize(
        &mut self,
        _geometry: &Geometry,
        _detector: &Detector,
        _sample: &Sample,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError> {
        self.pseudo[0].set_value(2.0 * geometry.values()[0]);
        Ok(())
    }

    fn set_pseudo_values(
        &mut self,
        geometry: &Geometry,
        values: &[f64],
    ) -> Result<(), SolverError> {
        let y = values[0];
        self.pseudo[0].set_value(y);
        self.solutions = vec![vec![y / 2.0, geometry.values()[1]]];
        Ok(())
    }

    fn solutions(&self) -> &[Vec<f64>] {
        &self.solutions
    }
}

pub struct BoundedEngine {
    pseudo: [Axis; 1],
    solutions: Vec<Vec<f64>>,
    limit: f64,
}

impl Engine for BoundedEngine {
    fn name(&self) -> &str {
        "bounded"
    }

    fn pseudo_axes(&self) -> &[Axis] {
        &self.pseudo
    }

    fn initialize(
        &mut self,
        _geometry: &Geometry,
        _detector: &Detector,
        sample: &Sample,
    ) -> Result<(), SolverError> {
        if sample.name() == BROKEN {
            return Err(SolverError::Backend(format!("cannot bind to {BROKEN}")));
        }
        Ok(())
    }

    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError> {
        let z = geometry.values()[0] / geometry.wavelength();
        if z.abs() > self.limit {
            return Err(SolverError::Backend(format!("z={z} out of range")));
        }
        self.pseudo[0].set_value(z);
        Ok(())
    }

    fn set_pseudo_values(
        &mut self,
        geometry: &Geometry,
        values: &[f64],
    ) -> Result<(), SolverError> {
        let z = values[0];
        self.pseudo[0].set_value(z);
        self.solutions = vec![vec![z * geometry.wavelength(), geometry.values()[1]]];
        Ok(())
    }

    fn solutions(&self) -> &[Vec<f64>] {
        &self.solutions
    }
}

pub fn registry(factory: MockFactory) -> FactoryRegistry {
    let mut registry = FactoryRegistry::new();
    registry.register(Arc::new(factory));
    registry
}

/// Calculator on the mock geometry with the `sum` engine active.
pub fn mock_calc(factory: MockFactory) -> CalcRecip {
    mock_calc_with(factory, CalcParams::builder(MOCK).engine("sum"))
}

pub fn mock_calc_with(
    factory: MockFactory,
    params: recip_calc::calc::CalcParamsBuilder,
) -> CalcRecip {
    CalcRecip::with_factories(&registry(factory), params.build().unwrap()).unwrap()
}

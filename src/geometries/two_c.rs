//! # Two-circle diffractometer
//!
//! Axes: `omega` (sample rotation) and `tth` (detector arm, 2θ).
//!
//! Engines:
//!
//! - **`q`**: pseudo axis `q = 4π·sin(tth/2)/λ`. Solving keeps `omega` where it is
//!   and moves `tth`; `|q·λ/4π| > 1` is unreachable.
//! - **`th2th`**: pseudo axis `th`, coupling `omega = th` and `tth = 2·th`;
//!   reachable while `|tth| ≤ π`.

use std::f64::consts::PI;

use crate::{
    constants::FOUR_PI,
    engine::{Engine, EngineList, SolverError},
    factory::Factory,
    geometry::{Axis, Detector, Geometry},
    sample::Sample,
    units::Quantity,
};

pub const TWO_C: &str = "TwoC";
const OMEGA: &str = "omega";
const TTH: &str = "tth";

#[derive(Debug, Clone, Copy, Default)]
pub struct TwoCFactory;

impl Factory for TwoCFactory {
    fn name(&self) -> &str {
        TWO_C
    }

    fn create_geometry(&self) -> Geometry {
        Geometry::new(TWO_C, vec![Axis::angle(OMEGA), Axis::angle(TTH)])
    }

    fn create_engine_list(&self) -> EngineList {
        EngineList::new(vec![Box::new(QEngine::new()), Box::new(Th2ThEngine::new())])
    }
}

/// Index of `name` in `geometry`, as a solver error if it is missing.
fn axis_index(geometry: &Geometry, name: &str) -> Result<usize, SolverError> {
    geometry
        .axis_index(name)
        .ok_or_else(|| SolverError::MissingAxis(name.to_string()))
}

fn check_arity(engine: &str, expected: usize, values: &[f64]) -> Result<(), SolverError> {
    if values.len() != expected {
        return Err(SolverError::Arity {
            engine: engine.to_string(),
            expected,
            got: values.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct QEngine {
    pseudo: [Axis; 1],
    solutions: Vec<Vec<f64>>,
    bound: bool,
}

impl QEngine {
    pub fn new() -> Self {
        QEngine {
            pseudo: [Axis::new("q", Quantity::InverseLength)],
            solutions: Vec::new(),
            bound: false,
        }
    }
}

impl Default for QEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for QEngine {
    fn name(&self) -> &str {
        "q"
    }

    fn pseudo_axes(&self) -> &[Axis] {
        &self.pseudo
    }

    fn initialize(
        &mut self,
        geometry: &Geometry,
        _detector: &Detector,
        _sample: &Sample,
    ) -> Result<(), SolverError> {
        axis_index(geometry, OMEGA)?;
        axis_index(geometry, TTH)?;
        self.solutions.clear();
        self.bound = true;
        Ok(())
    }

    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError> {
        if !self.bound {
            return Err(SolverError::Unbound(self.name().to_string()));
        }
        let tth = geometry.axes()[axis_index(geometry, TTH)?].value();
        let q = FOUR_PI * (tth / 2.0).sin() / geometry.wavelength();
        self.pseudo[0].set_value(q);
        Ok(())
    }

    fn set_pseudo_values(
        &mut self,
        geometry: &Geometry,
        values: &[f64],
    ) -> Result<(), SolverError> {
        if !self.bound {
            return Err(SolverError::Unbound(self.name().to_string()));
        }
        check_arity(self.name(), 1, values)?;

        let q = values[0];
        let sin_theta = q * geometry.wavelength() / FOUR_PI;
        if !(sin_theta.abs() <= 1.0) {
            return Err(SolverError::Unreachable {
                engine: self.name().to_string(),
                values: values.to_vec(),
            });
        }

        let mut solution = geometry.values();
        solution[axis_index(geometry, TTH)?] = 2.0 * sin_theta.asin();

        self.pseudo[0].set_value(q);
        self.solutions = vec![solution];
        Ok(())
    }

    fn solutions(&self) -> &[Vec<f64>] {
        &self.solutions
    }
}

#[derive(Debug, Clone)]
pub struct Th2ThEngine {
    pseudo: [Axis; 1],
    solutions: Vec<Vec<f64>>,
    bound: bool,
}

impl Th2ThEngine {
    pub fn new() -> Self {
        Th2ThEngine {
            pseudo: [Axis::angle("th")],
            solutions: Vec::new(),
            bound: false,
        }
    }
}

impl Default for Th2ThEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Th2ThEngine {
    fn name(&self) -> &str {
        "th2th"
    }

    fn pseudo_axes(&self) -> &[Axis] {
        &self.pseudo
    }

    fn initialize(
        &mut self,
        geometry: &Geometry,
        _detector: &Detector,
        _sample: &Sample,
    ) -> Result<(), SolverError> {
        axis_index(geometry, OMEGA)?;
        axis_index(geometry, TTH)?;
        self.solutions.clear();
        self.bound = true;
        Ok(())
    }

    fn update(&mut self, geometry: &Geometry) -> Result<(), SolverError> {
        if !self.bound {
            return Err(SolverError::Unbound(self.name().to_string()));
        }
        let tth = geometry.axes()[axis_index(geometry, TTH)?].value();
        self.pseudo[0].set_value(tth / 2.0);
        Ok(())
    }

    fn set_pseudo_values(
        &mut self,
        geometry: &Geometry,
        values: &[f64],
    ) -> Result<(), SolverError> {
        if !self.bound {
            return Err(SolverError::Unbound(self.name().to_string()));
        }
        check_arity(self.name(), 1, values)?;

        let th = values[0];
        if !((2.0 * th).abs() <= PI) {
            return Err(SolverError::Unreachable {
                engine: self.name().to_string(),
                values: values.to_vec(),
            });
        }

        let mut solution = geometry.values();
        solution[axis_index(geometry, OMEGA)?] = th;
        solution[axis_index(geometry, TTH)?] = 2.0 * th;

        self.pseudo[0].set_value(th);
        self.solutions = vec![solution];
        Ok(())
    }

    fn solutions(&self) -> &[Vec<f64>] {
        &self.solutions
    }
}

#[cfg(test)]
mod test_two_c {
    use super::*;
    use approx::assert_relative_eq;

    fn bound<E: Engine>(mut engine: E) -> (E, Geometry) {
        let geometry = TwoCFactory.create_geometry();
        engine
            .initialize(&geometry, &Detector::ZeroD, &Sample::new("main"))
            .unwrap();
        (engine, geometry)
    }

    #[test]
    fn test_q_engine_round_trip() {
        let (mut engine, mut geometry) = bound(QEngine::new());
        geometry.set_values(&[0.3, 1.0]).unwrap();
        engine.update(&geometry).unwrap();
        let q = engine.pseudo_values()[0];
        assert_relative_eq!(q, FOUR_PI * 0.5_f64.sin() / 1.54, epsilon = 1e-12);

        engine.set_pseudo_values(&geometry, &[q]).unwrap();
        let solution = &engine.solutions()[0];
        assert_relative_eq!(solution[0], 0.3);
        assert_relative_eq!(solution[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_q_engine_unreachable_keeps_state() {
        let (mut engine, geometry) = bound(QEngine::new());
        engine.set_pseudo_values(&geometry, &[2.0]).unwrap();
        let q_max = FOUR_PI / geometry.wavelength();

        let err = engine
            .set_pseudo_values(&geometry, &[q_max * 1.01])
            .unwrap_err();
        assert!(matches!(err, SolverError::Unreachable { .. }));
        assert_eq!(engine.pseudo_values(), vec![2.0]);
        assert_eq!(engine.solutions().len(), 1);
    }

    #[test]
    fn test_unbound_engine_refuses_to_solve() {
        let geometry = TwoCFactory.create_geometry();
        let mut engine = Th2ThEngine::new();
        assert_eq!(
            engine.set_pseudo_values(&geometry, &[0.1]),
            Err(SolverError::Unbound("th2th".into()))
        );
    }

    #[test]
    fn test_th2th_engine() {
        let (mut engine, geometry) = bound(Th2ThEngine::new());
        engine.set_pseudo_values(&geometry, &[0.4]).unwrap();
        assert_eq!(engine.solutions(), &[vec![0.4, 0.8]]);
        assert!(engine.set_pseudo_values(&geometry, &[2.0]).is_err());
        assert!(matches!(
            engine.set_pseudo_values(&geometry, &[0.1, 0.2]),
            Err(SolverError::Arity { expected: 1, got: 2, .. })
        ));
    }
}

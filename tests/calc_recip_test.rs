mod common;

use std::{
    collections::HashMap,
    sync::{atomic::Ordering, Arc},
    thread,
};

use approx::assert_relative_eq;
use common::{mock_calc, mock_calc_with, MockFactory, MOCK};
use recip_calc::{
    calc::{CalcParams, CalcRecip, TrajectoryParams},
    constants::RADEG,
    units::UnitSystem,
    CalcError, Position,
};

fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_round_trip_two_circle() {
    let calc = CalcRecip::new(CalcParams::builder("TwoC").engine("th2th").build().unwrap()).unwrap();
    for physical in [[5.0, 10.0], [-20.0, -40.0], [45.0, 90.0]] {
        let pseudo = calc.inverse(physical).unwrap();
        let solutions = calc.forward(&pseudo, None).unwrap();
        assert!(solutions.iter().any(|s| {
            s.values()
                .iter()
                .zip(physical)
                .all(|(a, b)| (a - b).abs() < 1e-9)
        }));
    }
}

#[test]
fn test_default_units_are_internal() {
    let params = CalcParams::builder("TwoC")
        .engine("th2th")
        .units(UnitSystem::Default)
        .build()
        .unwrap();
    let calc = CalcRecip::new(params).unwrap();
    assert_eq!(calc.units(), UnitSystem::Default);
    calc.set_physical_positions([0.0, 60.0 * RADEG]).unwrap();
    assert_relative_eq!(calc.axis_value("th").unwrap(), 30.0 * RADEG, epsilon = 1e-12);
}

#[test]
fn test_invalid_remaps_keep_previous_mapping() {
    let calc = mock_calc(MockFactory::default());
    for bad in [
        mapping(&[("a", "alpha")]),
        mapping(&[("a", "alpha"), ("b", "beta"), ("c", "gamma")]),
        mapping(&[("a", "same"), ("b", "same")]),
    ] {
        assert!(matches!(
            calc.set_physical_axis_names(&bad),
            Err(CalcError::InvalidAxisMapping(_))
        ));
        assert_eq!(calc.physical_axis_names(), vec!["a", "b"]);
    }

    calc.set_physical_axis_names(&mapping(&[("a", "alpha"), ("b", "beta")]))
        .unwrap();
    assert!(calc
        .set_physical_axis_names(&mapping(&[("alpha", "x"), ("beta", "y")]))
        .is_err());
    assert_eq!(calc.physical_axis_names(), vec!["alpha", "beta"]);

    calc.set_physical_positions([1.0, 2.0]).unwrap();
    let solutions = calc.forward([5.0], None).unwrap();
    assert_eq!(solutions[0].names(), ["alpha", "beta"]);
}

#[test]
fn test_engine_lock_with_mock_geometry() {
    let factory = MockFactory::default();
    let calc = mock_calc_with(
        factory,
        CalcParams::builder(MOCK).engine("sum").lock_engine(true),
    );
    assert!(calc.set_engine("sum").is_ok());
    assert!(calc.set_engine("sum").is_ok());
    assert_eq!(
        calc.set_engine("double"),
        Err(CalcError::EngineLocked("sum".into()))
    );

    let unlocked = mock_calc(MockFactory::default());
    unlocked.set_engine("double").unwrap();
    assert_eq!(
        unlocked.set_engine("triple"),
        Err(CalcError::EngineNotFound("triple".into()))
    );
    assert_eq!(unlocked.engine().as_deref(), Some("double"));
}

#[test]
fn test_sample_switch_rebinds_engines() {
    let factory = MockFactory::default();
    let inits = Arc::clone(&factory.inits);
    let calc = mock_calc(factory);
    let after_construction = inits.load(Ordering::SeqCst);
    assert_eq!(after_construction, 1);

    calc.new_sample("second", None, true).unwrap();
    assert_eq!(inits.load(Ordering::SeqCst), 2);

    // designating the active sample again does nothing
    calc.set_sample("second").unwrap();
    calc.set_sample(calc.sample().unwrap()).unwrap();
    assert_eq!(inits.load(Ordering::SeqCst), 2);

    calc.set_sample("main").unwrap();
    assert_eq!(inits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_positions_are_validated() {
    let calc = mock_calc(MockFactory::default());
    let physical = calc.physical_position(vec![1.0, 2.0]).unwrap();
    assert_eq!(physical.to_string(), "(a=1, b=2)");
    assert_eq!(
        calc.physical_position(vec![1.0]),
        Err(CalcError::ArityMismatch { expected: 2, got: 1 })
    );
    assert_eq!(calc.pseudo_position(vec![3.0]).unwrap().get("x"), Some(3.0));
    assert_eq!(calc.inverse(&physical).unwrap().values(), &[3.0]);
}

#[test]
fn test_shared_between_threads() {
    let calc = Arc::new(mock_calc(MockFactory::default()));
    calc.set_physical_positions([1.0, 1.0]).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let calc = Arc::clone(&calc);
            thread::spawn(move || {
                for j in 0..50 {
                    let target = (i * 50 + j) as f64;
                    let solutions = calc.forward([target], None).unwrap();
                    assert_eq!(solutions[0].values(), &[target, 0.0]);
                    calc.forward_iter([0.0], [target], &TrajectoryParams::default())
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calc.physical_positions().unwrap().values(), &[1.0, 1.0]);
    assert_eq!(calc.pseudo_positions().unwrap().values(), &[2.0]);
}

#[test]
fn test_serde_round_trip_of_value_types() {
    let position = Position::new(vec!["h".into(), "k".into()], vec![1.0, 0.5]).unwrap();
    let json = serde_json::to_string(&position).unwrap();
    assert_eq!(serde_json::from_str::<Position>(&json).unwrap(), position);

    let params: TrajectoryParams =
        serde_json::from_str(r#"{"max_iters": 12, "threshold": 0.9}"#).unwrap();
    assert_eq!(params.max_iters, 12);
    assert_eq!(
        serde_json::from_str::<UnitSystem>(r#""default""#).unwrap(),
        UnitSystem::Default
    );
}

use param_evolve::{EvolveError, Individual, Parameter, ParameterKind, SearchSpace, Value};
use std::collections::BTreeSet;

// --- Parameters ---

#[test]
fn test_integer_draws_stay_in_range_and_cover_it() {
    let mut p = Parameter::integer("a", 0, 10).unwrap();
    assert_eq!(p.len(), 11);

    let mut seen = BTreeSet::new();
    for _ in 0..1000 {
        let v = p.draw_random();
        assert!(p.validate(&v), "{v} escaped [0, 10]");
        seen.insert(v.as_int().unwrap());
    }
    assert_eq!(seen.len(), 11);
}

#[test]
fn test_stepped_integer_grid() {
    let p = Parameter::integer_stepped("a", 0, 10, 3).unwrap();
    let values: Vec<i64> = p.values().map(|v| v.as_int().unwrap()).collect();
    assert_eq!(values, vec![0, 3, 6, 9]);
    assert!(p.validate(&Value::Int(9)));
    assert!(!p.validate(&Value::Int(10)));
    assert!(!p.validate(&Value::Int(4)));
    assert!(!p.validate(&Value::Int(-3)));
}

#[test]
fn test_integer_extreme_bounds() {
    let mut p = Parameter::integer("wide", i64::MIN / 2, i64::MAX / 2).unwrap();
    for _ in 0..100 {
        let v = p.draw_random();
        assert!(p.validate(&v));
    }
    assert_eq!(p.value_at(0), Some(Value::Int(i64::MIN / 2)));
}

#[test]
fn test_full_i64_range() {
    let mut p = Parameter::integer("all", i64::MIN, i64::MAX).unwrap();
    assert_eq!(p.len(), 1u128 << 64);
    assert_eq!(p.value_at(0), Some(Value::Int(i64::MIN)));
    assert_eq!(p.value_at((1u128 << 64) - 1), Some(Value::Int(i64::MAX)));
    assert_eq!(p.value_at(1u128 << 64), None);
    assert!(p.validate(&Value::Int(0)));
    for _ in 0..100 {
        let v = p.draw_random();
        assert!(p.validate(&v));
    }

    let coarse = Parameter::integer_stepped("coarse", i64::MIN, i64::MAX, i64::MAX).unwrap();
    let values: Vec<i64> = coarse.values().map(|v| v.as_int().unwrap()).collect();
    assert_eq!(values, vec![i64::MIN, -1, i64::MAX - 1]);
}

#[test]
fn test_real_grid_keeps_the_upper_bound() {
    let p = Parameter::real("b", 10.0, 20.0, 0.5).unwrap();
    assert_eq!(p.len(), 21);
    assert_eq!(p.value_at(0), Some(Value::Real(10.0)));
    assert_eq!(p.value_at(20), Some(Value::Real(20.0)));
    assert_eq!(p.value_at(21), None);

    let fine = Parameter::real("c", 10.0, 20.0, 0.1).unwrap();
    assert_eq!(fine.len(), 101);
    assert_eq!(fine.value_at(100), Some(Value::Real(20.0)));
}

#[test]
fn test_real_draws_lie_on_the_grid() {
    let mut p = Parameter::real("b", 10.0, 20.0, 0.5).unwrap();
    for _ in 0..500 {
        let v = p.draw_random().as_real().unwrap();
        assert!((10.0..=20.0).contains(&v));
        assert_eq!((v * 2.0).fract(), 0.0, "{v} is off the 0.5 grid");
    }
}

#[test]
fn test_real_grid_matches_decimal_literals() {
    let mut p = Parameter::real("x", -0.3, 0.3, 0.1).unwrap();
    let values: Vec<Value> = p.values().collect();
    let expected: Vec<Value> = [-0.3, -0.2, -0.1, 0.0, 0.1, 0.2, 0.3]
        .into_iter()
        .map(Value::Real)
        .collect();
    assert_eq!(values, expected);
    for literal in [-0.3, -0.2, -0.1, 0.0, 0.1, 0.2, 0.3] {
        assert!(p.validate(&Value::Real(literal)), "{literal} rejected");
    }
    for _ in 0..200 {
        let v = p.draw_random();
        assert!(expected.contains(&v), "{v} is not a decimal grid point");
    }

    let cents = Parameter::real("cents", 0.0, 1.0, 0.01).unwrap();
    assert_eq!(cents.value_at(7), Some(Value::Real(0.07)));
    assert_eq!(cents.value_at(29), Some(Value::Real(0.29)));

    // Steps without a short decimal form are left unsnapped.
    let thirds = Parameter::real("thirds", 0.0, 1.0, 1.0 / 3.0).unwrap();
    assert_eq!(thirds.len(), 4);
    assert_eq!(thirds.value_at(1), Some(Value::Real(1.0 / 3.0)));
    assert_eq!(thirds.value_at(3), Some(Value::Real(1.0)));
}

#[test]
fn test_real_membership() {
    let p = Parameter::real("b", 10.0, 20.0, 0.5).unwrap();
    assert!(p.validate(&Value::Real(15.5)));
    assert!(!p.validate(&Value::Real(15.25)));
    assert!(!p.validate(&Value::Real(20.5)));
    assert!(!p.validate(&Value::Real(f64::NAN)));
    // Kinds are not coerced.
    assert!(!p.validate(&Value::Int(15)));
}

#[test]
fn test_single_value_domains() {
    let mut p = Parameter::integer("one", 7, 7).unwrap();
    assert_eq!(p.draw_random(), Value::Int(7));
    let mut r = Parameter::real("point", 1.5, 1.5, 0.1).unwrap();
    assert_eq!(r.len(), 1);
    assert_eq!(r.draw_random(), Value::Real(1.5));
}

#[test]
fn test_categorical_and_flag() {
    let mut p = Parameter::categorical("c", 'a'..='z').unwrap();
    assert_eq!(p.len(), 26);
    assert_eq!(p.kind(), &ParameterKind::Categorical);
    for _ in 0..200 {
        let v = p.draw_random();
        let s = v.as_str().unwrap();
        assert!(s.len() == 1 && s.chars().all(|c| c.is_ascii_lowercase()));
    }
    assert!(!p.validate(&Value::from("A")));

    let mixed = Parameter::categorical("m", [Value::Int(1), Value::from("one"), Value::Real(1.0)])
        .unwrap();
    assert!(mixed.validate(&Value::Real(1.0)));
    assert!(!mixed.validate(&Value::Int(2)));

    let flag = Parameter::flag("f").unwrap();
    let values: Vec<Value> = flag.values().collect();
    assert_eq!(values, vec![Value::Int(0), Value::Int(1)]);
}

#[test]
fn test_same_seed_same_stream() {
    let mut a = Parameter::integer("a", -100, 100).unwrap().with_seed(9);
    let mut b = Parameter::integer("a", -100, 100).unwrap().with_seed(9);
    let first: Vec<Value> = (0..50).map(|_| a.draw_random()).collect();
    let second: Vec<Value> = (0..50).map(|_| b.draw_random()).collect();
    assert_eq!(first, second);

    a.reseed(9);
    let replay: Vec<Value> = (0..50).map(|_| a.draw_random()).collect();
    assert_eq!(first, replay);
    assert_eq!(a.seed(), 9);
}

#[test]
fn test_streams_are_independent() {
    let mut alone = Parameter::integer("a", 0, 1000).unwrap();
    let expected: Vec<Value> = (0..20).map(|_| alone.draw_random()).collect();

    let mut a = Parameter::integer("a", 0, 1000).unwrap();
    let mut b = Parameter::real("b", 0.0, 1.0, 0.01).unwrap();
    let interleaved: Vec<Value> = (0..20)
        .map(|_| {
            b.draw_random();
            a.draw_random()
        })
        .collect();
    assert_eq!(expected, interleaved);
}

#[test]
fn test_invalid_domains_are_rejected() {
    let cases = [
        Parameter::integer("a", 10, 0),
        Parameter::integer_stepped("a", 0, 10, 0),
        Parameter::integer_stepped("a", 0, 10, -2),
        Parameter::real("a", 1.0, 0.0, 0.1),
        Parameter::real("a", 0.0, 1.0, 0.0),
        Parameter::real("a", 0.0, 1.0, -0.5),
        Parameter::real("a", f64::NAN, 1.0, 0.1),
        Parameter::real("a", 0.0, f64::INFINITY, 0.1),
        Parameter::categorical("a", Vec::<i64>::new()),
        Parameter::categorical("a", [1, 2, 1]),
        Parameter::integer("", 0, 1),
    ];
    for case in cases {
        assert!(
            matches!(case, Err(EvolveError::InvalidDomain { .. })),
            "{case:?}"
        );
    }
}

#[test]
fn test_invalid_domain_names_the_parameter() {
    let err = Parameter::real("learning_rate", 1.0, 0.0, 0.1).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("InvalidDomain"), "{message}");
    assert!(message.contains("learning_rate"), "{message}");
}

// --- Search space ---

#[test]
fn test_search_space_rejects_duplicates_and_emptiness() {
    let err = SearchSpace::new(vec![
        Parameter::integer("a", 0, 1).unwrap(),
        Parameter::flag("b").unwrap(),
        Parameter::integer("a", 5, 9).unwrap(),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        EvolveError::DuplicateParameterName {
            name: "a".to_owned()
        }
    );

    assert_eq!(SearchSpace::new(Vec::new()).unwrap_err(), EvolveError::NoParameters);
}

#[test]
fn test_search_space_validates_value_vectors() {
    let space = SearchSpace::new(vec![
        Parameter::integer("a", 0, 10).unwrap(),
        Parameter::categorical("c", ["x", "y"]).unwrap(),
    ])
    .unwrap();
    assert_eq!(space.layout().names(), ["a", "c"]);
    assert_eq!(space.layout().position("c"), Some(1));
    assert!(space.get("c").is_some());
    assert!(space.get("z").is_none());

    space.validate(&[Value::Int(3), Value::from("y")]).unwrap();
    assert_eq!(
        space.validate(&[Value::Int(3)]).unwrap_err(),
        EvolveError::ShapeMismatch {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(
        space
            .validate(&[Value::Int(3), Value::from("z")])
            .unwrap_err(),
        EvolveError::ValueOutOfDomain {
            name: "c".to_owned(),
            value: Value::from("z"),
        }
    );
}

// --- Individuals ---

fn wide_space(n: usize) -> SearchSpace {
    SearchSpace::new(
        (0..n)
            .map(|i| {
                Parameter::integer(&format!("p{i}"), 0, 1_000_000)
                    .unwrap()
                    .with_seed(100 + i as u64)
            })
            .collect(),
    )
    .unwrap()
}

fn changed_positions(a: &Individual, b: &Individual) -> usize {
    a.values()
        .iter()
        .zip(b.values())
        .filter(|(x, y)| x != y)
        .count()
}

#[test]
fn test_new_individual_is_uninitialized() {
    let mut space = wide_space(3);
    let mut individual = Individual::new(&space, 1);
    assert!(!individual.is_initialized());
    assert_eq!(individual.len(), 3);
    assert_eq!(
        individual.mutate(&mut space, 1, 1.0).unwrap_err(),
        EvolveError::UninitializedIndividual
    );
    assert_eq!(
        individual.as_named_mapping().unwrap_err(),
        EvolveError::UninitializedIndividual
    );

    individual.randomize(&mut space).unwrap();
    assert!(individual.is_initialized());
    individual.validate(&space).unwrap();
}

#[test]
fn test_mutation_changes_exactly_k_positions_at_certainty() {
    let mut space = wide_space(6);
    for seed in 0..20 {
        let mut individual = Individual::random(&mut space, seed);
        let before = individual.clone();
        individual.mutate(&mut space, 3, 1.0).unwrap();
        assert_eq!(changed_positions(&before, &individual), 3, "seed {seed}");
        individual.validate(&space).unwrap();
    }
}

#[test]
fn test_mutation_size_is_clamped() {
    let mut space = wide_space(3);
    let mut individual = Individual::random(&mut space, 4);
    let before = individual.clone();
    individual.mutate(&mut space, 10, 1.0).unwrap();
    assert_eq!(changed_positions(&before, &individual), 3);
}

#[test]
fn test_mutation_at_zero_probability_is_a_no_op() {
    let mut space = wide_space(4);
    let mut individual = Individual::random(&mut space, 4);
    let before = individual.clone();
    individual.mutate(&mut space, 4, 0.0).unwrap();
    assert_eq!(before, individual);
}

#[test]
fn test_mutation_rejects_bad_probability() {
    let mut space = wide_space(2);
    let mut individual = Individual::random(&mut space, 4);
    assert!(matches!(
        individual.mutate(&mut space, 1, 1.5),
        Err(EvolveError::InvalidConfig {
            field: "mutation_probability",
            ..
        })
    ));
}

#[test]
fn test_individual_rejects_foreign_space() {
    let mut space = wide_space(3);
    let mut other = wide_space(2);
    let mut individual = Individual::random(&mut space, 1);
    assert!(matches!(
        individual.mutate(&mut other, 1, 1.0),
        Err(EvolveError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        individual.randomize(&mut other),
        Err(EvolveError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_from_values_and_named_mapping() {
    let space = SearchSpace::new(vec![
        Parameter::integer("a", 0, 10).unwrap(),
        Parameter::real("b", 10.0, 20.0, 0.5).unwrap(),
        Parameter::categorical("c", 'a'..='z').unwrap(),
    ])
    .unwrap();
    let individual = Individual::from_values(
        &space,
        vec![Value::Int(4), Value::Real(12.5), Value::from('q')],
        0,
    )
    .unwrap();

    let mapping = individual.as_named_mapping().unwrap();
    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.int("a"), Some(4));
    assert_eq!(mapping.real("a"), Some(4.0));
    assert_eq!(mapping.real("b"), Some(12.5));
    assert_eq!(mapping.text("c"), Some("q"));
    assert_eq!(individual.get("b"), Some(&Value::Real(12.5)));
    assert!(individual.get("missing").is_none());

    assert!(matches!(
        Individual::from_values(&space, vec![Value::Int(11), Value::Real(12.5), Value::from('q')], 0),
        Err(EvolveError::ValueOutOfDomain { .. })
    ));
}

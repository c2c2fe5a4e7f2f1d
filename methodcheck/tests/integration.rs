//! Integration tests for Methodcheck
//!
//! These tests drive whole sessions through the public API, with members
//! registered via `#[member]`.

use methodcheck::prelude::*;
use methodcheck::{
    ArgumentMismatch, CheckConfig, NullReturnPolicy, Primitive, SessionError, SessionState,
    TypeTag,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> SessionConfig {
    SessionConfig::default()
        .with_timeout(Duration::from_millis(250))
        .with_workers(4)
}

// ============================================================================
// Reference solutions
// ============================================================================

mod solution {
    use methodcheck::member;

    #[member(owner = "Solution", name = "solveTrainProblem")]
    fn solve_train_problem(east_speed: f64, west_speed: f64, distance: f64) -> f64 {
        let combined_speed = east_speed + west_speed;
        distance / combined_speed * 60.0
    }

    #[member(owner = "Solution", name = "isMultiple")]
    fn is_multiple(a: i32, b: i32) -> bool {
        b != 0 && a % b == 0
    }

    #[member(owner = "Solution", name = "collatzCount")]
    fn collatz_count(mut input: i32) -> i32 {
        if input < 1 {
            return -1;
        }
        let mut count = 0;
        while input > 1 {
            count += 1;
            input = if input % 2 == 0 { input / 2 } else { 3 * input + 1 };
        }
        count
    }

    #[member(owner = "Solution", name = "strictMultiple")]
    fn strict_multiple(a: i32, b: i32) -> bool {
        a % b == 0
    }

    #[member(owner = "Solution", name = "greet", visibility = "private")]
    fn greet(name: String) -> String {
        format!("Hello, {name}!")
    }

    #[member(owner = "Solution", name = "record")]
    fn record(_value: i32) {}
}

// ============================================================================
// Candidate submissions
// ============================================================================

mod practice {
    use methodcheck::member;
    use std::thread;
    use std::time::Duration;

    #[member(owner = "Practice", name = "solveTrainProblem")]
    fn solve_train_problem(east_speed: f64, west_speed: f64, distance: f64) -> f64 {
        let combined_speed = east_speed + west_speed;
        distance / combined_speed * 60.0
    }

    #[member(owner = "Practice", name = "isMultiple")]
    fn is_multiple_float(a: f64, b: f64) -> bool {
        a % b == 0.0
    }

    #[member(owner = "Practice", name = "isMultiple")]
    fn is_multiple(a: i32, b: i32) -> bool {
        a % b == 0
    }

    // Loops forever for inputs below one.
    #[member(owner = "Practice", name = "collatzCount")]
    fn collatz_count(mut input: i32) -> i32 {
        let mut count = 0;
        while input != 1 {
            if input < 1 {
                thread::sleep(Duration::from_millis(5));
                continue;
            }
            count += 1;
            input = if input % 2 == 0 { input / 2 } else { 3 * input + 1 };
        }
        count
    }

    #[member(owner = "Practice", name = "strictMultiple")]
    fn strict_multiple(a: i32, b: i32) -> bool {
        a % b == 0
    }

    #[member(owner = "Practice", name = "greet", visibility = "private")]
    fn greet(name: String) -> String {
        format!("Hello, {name}!")
    }

    #[member(owner = "Practice", name = "record")]
    fn record(_value: i32) {}
}

mod wrong_shapes {
    use methodcheck::member;

    #[member(owner = "WrongShapes", name = "isMultiple")]
    fn is_multiple(a: i64, b: i32) -> i64 {
        a % b as i64
    }

    #[member(owner = "WrongShapes", name = "solveTrainProblem")]
    fn solve_train_problem(east_speed: f64, west_speed: f64, distance: f64) -> f32 {
        (distance / (east_speed + west_speed) * 60.0) as f32
    }
}

fn train_problem_generator() -> impl FnMut() -> TestCase + Send {
    let mut rng = StdRng::from_entropy();
    move || {
        let mut next = || rng.gen_range(0.0..1.0) * f64::from(rng.gen_range(0..100_i32));
        test_case![next(), next(), next()]
    }
}

// ============================================================================
// End-to-end sessions
// ============================================================================

#[test]
fn test_train_problem_end_to_end() {
    init_tracing();

    let mut session = SessionBuilder::from_registry("Practice", "Solution", "solveTrainProblem")
        .unwrap()
        .case(test_case![0.0, 0.0, 0.0])
        .case(test_case![-100.0, 100.0, 0.3])
        .generator(train_problem_generator(), 10)
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 13);
    assert_eq!(
        results[0],
        TestResult::HeaderSuccess {
            method: "solveTrainProblem".to_string()
        }
    );

    match &results[1] {
        TestResult::TestCaseSuccess { output, .. } => {
            assert!(output.as_f64().unwrap().is_nan());
        }
        other => panic!("expected success for (0, 0, 0), got {other}"),
    }
    match &results[2] {
        TestResult::TestCaseSuccess { output, .. } => {
            assert!(output.as_f64().unwrap().is_infinite());
        }
        other => panic!("expected success for (-100, 100, 0.3), got {other}"),
    }

    assert!(results.iter().all(TestResult::is_success));
    let summary = summarize(&results);
    assert!(summary.all_passed());
    assert_eq!(summary.total_cases(), 12);
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn test_missing_member_runs_no_cases() {
    let mut session = SessionBuilder::from_registry("NoSuchOwner", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![4, 2])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(
        results,
        vec![TestResult::MethodNotFound {
            method: "isMultiple".to_string()
        }]
    );
}

#[test]
fn test_unknown_reference_is_fatal() {
    let err = SessionBuilder::from_registry("Practice", "Solution", "noSuchMethod")
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::ReferenceNotFound { .. }));
}

#[test]
fn test_parameter_types_checked_before_return_type() {
    let mut session = SessionBuilder::from_registry("WrongShapes", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![4, 2])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        TestResult::WrongParameterTypes { actual, .. }
            if actual == &[TypeTag::Primitive(Primitive::Long), TypeTag::Primitive(Primitive::Int)]
    ));
}

#[test]
fn test_wrong_return_type() {
    let mut session = SessionBuilder::from_registry("WrongShapes", "Solution", "solveTrainProblem")
        .unwrap()
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(
        results,
        vec![TestResult::WrongReturnType {
            method: "solveTrainProblem".to_string(),
            expected: TypeTag::Primitive(Primitive::Double),
            actual: TypeTag::Primitive(Primitive::Float),
        }]
    );
}

#[test]
fn test_overload_resolution_prefers_matching_parameters() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![9, 3])
        .case(test_case![10, 3])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(TestResult::is_success));
    assert_eq!(results[1].arguments(), Some(&test_case![9, 3]));
}

#[test]
fn test_hanging_candidate_does_not_leak_into_other_cases() {
    init_tracing();

    let mut session = SessionBuilder::from_registry("Practice", "Solution", "collatzCount")
        .unwrap()
        .case(test_case![27])
        .case(test_case![0])
        .case(test_case![6])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(
        results[1],
        TestResult::TestCaseSuccess {
            method: "collatzCount".to_string(),
            arguments: test_case![27],
            output: Value::Int(111),
        }
    );
    assert_eq!(
        results[2],
        TestResult::InfiniteLoop {
            method: "collatzCount".to_string(),
            arguments: test_case![0],
            expected: Value::Int(-1),
        }
    );
    assert_eq!(
        results[3],
        TestResult::TestCaseSuccess {
            method: "collatzCount".to_string(),
            arguments: test_case![6],
            output: Value::Int(8),
        }
    );
}

#[test]
fn test_candidate_panic_is_a_failure_not_an_error() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![4, 0])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(
        results[1],
        TestResult::TestCaseFailure {
            method: "isMultiple".to_string(),
            arguments: test_case![4, 0],
            expected: Value::Boolean(false),
            actual: None,
        }
    );
}

#[test]
fn test_broken_reference_is_not_blamed_on_candidate() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "strictMultiple")
        .unwrap()
        .case(test_case![4, 2])
        .case(test_case![4, 0])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert!(results[1].is_success());
    assert_eq!(
        results[2],
        TestResult::Error {
            method: "strictMultiple".to_string()
        }
    );

    let summary = summarize(&results);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn test_mistyped_explicit_case_prevents_session() {
    let err = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![1, "x"])
        .config(fast_config())
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, SessionError::InvalidTestCase { index: 0, .. }));
}

#[test]
fn test_unreceivable_explicit_cases_prevent_session() {
    let length = || Member::from_fn("length", |s: String| s.len() as i32);
    let err = SessionBuilder::new(MemberTable::new("Practice").with_member(length()), length())
        .case(TestCase::new(vec![Value::Null]))
        .config(fast_config())
        .build()
        .err()
        .unwrap();
    assert!(matches!(
        err,
        SessionError::InvalidTestCase {
            source: ArgumentMismatch::UnexpectedNull { index: 0, .. },
            ..
        }
    ));

    let total = || Member::from_fn("total", |xs: Vec<i32>| xs.iter().sum::<i32>());
    let mislabelled = Value::Array {
        element: TypeTag::Primitive(Primitive::Int),
        items: vec![Value::Str("x".to_string())],
    };
    let err = SessionBuilder::new(MemberTable::new("Practice").with_member(total()), total())
        .case(TestCase::new(vec![mislabelled]))
        .config(fast_config())
        .build()
        .err()
        .unwrap();
    assert!(matches!(
        err,
        SessionError::InvalidTestCase {
            source: ArgumentMismatch::Element { index: 0, position: 0, .. },
            ..
        }
    ));
}

#[test]
fn test_optional_string_parameter_accepts_null() {
    let describe = || {
        Member::from_fn("describe", |name: Option<String>| {
            name.unwrap_or_else(|| "anonymous".to_string())
        })
    };
    let mut session =
        SessionBuilder::new(MemberTable::new("Practice").with_member(describe()), describe())
            .case(TestCase::new(vec![Value::Null]))
            .case(test_case!["Ada"])
            .config(fast_config())
            .build()
            .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert!(summarize(&results).all_passed());
    assert_eq!(results.len(), 3);
}

#[test]
fn test_boxed_arguments_accepted_for_primitive_parameters() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(TestCase::new(vec![Value::Int(8), Value::Int(4)]))
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert!(summarize(&results).all_passed());
}

#[test]
fn test_generator_disagreeing_with_signature_is_fatal() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![4, 2])
        .generator(|| test_case![1, 2, 3], 5)
        .config(fast_config())
        .build()
        .unwrap();

    let err = session.run_all_tests_then_end().unwrap_err();
    assert!(matches!(err, SessionError::GeneratorMismatch { round: 0, .. }));
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn test_private_members_and_access_control() {
    let mut forced = SessionBuilder::from_registry("Practice", "Solution", "greet")
        .unwrap()
        .case(test_case!["Ada"])
        .config(fast_config())
        .build()
        .unwrap();
    let results = forced.run_all_tests_then_end().unwrap();
    assert_eq!(
        results[1],
        TestResult::TestCaseSuccess {
            method: "greet".to_string(),
            arguments: test_case!["Ada"],
            output: Value::Str("Hello, Ada!".to_string()),
        }
    );

    // The reference is private too, so forbidding access is fatal.
    let err = SessionBuilder::from_registry("Practice", "Solution", "greet")
        .unwrap()
        .config(fast_config().with_private_access(false))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::ReferenceInaccessible { .. }));

    let reference = Member::from_fn("greet", |name: String| format!("Hello, {name}!"));
    let mut guarded =
        SessionBuilder::new(MemberTable::from_registry("Practice"), reference)
            .config(fast_config().with_private_access(false))
            .build()
            .unwrap();
    assert_eq!(
        guarded.run_all_tests_then_end().unwrap(),
        vec![TestResult::MethodSecurity {
            method: "greet".to_string()
        }]
    );
}

#[test]
fn test_void_member_skips_comparison() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "record")
        .unwrap()
        .cases((0..3).map(|i| test_case![i]))
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(TestResult::is_success));
}

#[test]
fn test_null_return_policy() {
    let reference = Member::from_fn("lookup", |key: i32| Some(key.to_string()));
    let candidates = || {
        MemberTable::new("Practice")
            .with_member(Member::from_fn("lookup", |_key: i32| -> Option<String> { None }))
    };

    let mut strict = SessionBuilder::new(candidates(), reference.clone())
        .case(test_case![7])
        .config(fast_config())
        .build()
        .unwrap();
    let results = strict.run_all_tests_then_end().unwrap();
    assert_eq!(
        results[1],
        TestResult::TestCaseFailure {
            method: "lookup".to_string(),
            arguments: test_case![7],
            expected: Value::Str("7".to_string()),
            actual: Some(Value::Null),
        }
    );

    let mut lenient = SessionBuilder::new(candidates(), reference)
        .case(test_case![7])
        .config(fast_config().with_null_returns(NullReturnPolicy::Lenient))
        .build()
        .unwrap();
    assert!(summarize(&lenient.run_all_tests_then_end().unwrap()).all_passed());
}

#[test]
fn test_teardown_is_idempotent() {
    let mut session = SessionBuilder::from_registry("Practice", "Solution", "isMultiple")
        .unwrap()
        .case(test_case![6, 3])
        .config(fast_config())
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    let snapshot = results.clone();
    session.end();
    session.end();
    assert_eq!(results, snapshot);
    assert_eq!(session.state(), SessionState::Done);
    assert!(matches!(
        session.run_test_cases(),
        Err(SessionError::SessionEnded)
    ));
}

#[test]
fn test_session_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("methodcheck.toml");
    std::fs::write(
        &path,
        r#"
[runner]
timeout = "200ms"
workers = 2
generation_rounds = 4
"#,
    )
    .unwrap();

    let check = CheckConfig::load(&path).unwrap();
    let config = SessionConfig::from_check_config(&check).unwrap();
    assert_eq!(config.timeout, Duration::from_millis(200));

    let mut session = SessionBuilder::from_registry("Practice", "Solution", "solveTrainProblem")
        .unwrap()
        .generator(train_problem_generator(), check.runner.generation_rounds)
        .config(config)
        .build()
        .unwrap();

    let results = session.run_all_tests_then_end().unwrap();
    assert_eq!(results.len(), 5);
    assert!(summarize(&results).all_passed());
}

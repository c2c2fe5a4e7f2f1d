//! Methodcheck Example Session
//!
//! Checks a student's `solveTrainProblem` against the reference solution and
//! prints every result.
//!
//! Run with:
//!   cargo run --example train_problem
//!   RUST_LOG=methodcheck_runner=debug cargo run --example train_problem

use methodcheck::prelude::*;
use methodcheck::{CheckConfig, SessionError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reference solution
#[member(owner = "Solution", name = "solveTrainProblem")]
fn solve_train_problem(east_speed: f64, west_speed: f64, distance: f64) -> f64 {
    let combined_speed = east_speed + west_speed;
    distance / combined_speed * 60.0
}

/// Student submission: forgets to convert hours to minutes
#[member(owner = "Practice", name = "solveTrainProblem")]
fn student_solve_train_problem(east_speed: f64, west_speed: f64, distance: f64) -> f64 {
    distance / (east_speed + west_speed)
}

fn main() -> Result<(), SessionError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let check = CheckConfig::discover().unwrap_or_default();
    let config = SessionConfig::from_check_config(&check).unwrap_or_default();

    let mut rng = StdRng::from_entropy();
    let generator = move || {
        let mut next = || rng.gen_range(0.0..1.0) * f64::from(rng.gen_range(0..100_i32));
        test_case![next(), next(), next()]
    };

    let results = SessionBuilder::from_registry("Practice", "Solution", "solveTrainProblem")?
        .case(test_case![0.0, 0.0, 0.0])
        .case(test_case![-100.0, 100.0, 0.3])
        .generator(generator, check.runner.generation_rounds)
        .config(config)
        .build()?
        .run_all_tests_then_end()?;

    for result in &results {
        println!("{result}");
    }

    let summary = summarize(&results);
    println!(
        "\n{} passed, {} failed, {} timed out, {} errors",
        summary.passed, summary.failed, summary.timed_out, summary.errors
    );
    Ok(())
}

//! Integration tests for the benchmark harness: splitting, evaluation,
//! failure isolation and importance extraction

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regbench::benchmark::{Benchmark, BenchmarkConfig, Evaluator};
use regbench::data::{Dataset, FeatureMatrix, TargetVector};
use regbench::training::{
    default_registry, train_test_split, DecisionTree, Estimator, LinearRegression, ModelRegistry,
    RandomForest, TrainTestSplit, DECISION_TREE, GRADIENT_BOOSTING, LINEAR_REGRESSION,
    RANDOM_FOREST, SVM,
};

// ============================================================================
// Fixtures
// ============================================================================

const WEIGHTS: [f64; 5] = [3.0, -2.0, 1.5, 0.5, 4.0];

fn noisy_linear(n: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((n, WEIGHTS.len()), |_| rng.gen_range(-1.0..1.0));
    let y = Array1::from_shape_fn(n, |i| {
        let signal: f64 = WEIGHTS.iter().enumerate().map(|(j, w)| w * x[[i, j]]).sum();
        signal + 1.0 + rng.gen_range(-0.5..0.5)
    });

    let names = (0..WEIGHTS.len()).map(|j| format!("x{}", j)).collect();
    Dataset::new(
        FeatureMatrix::new(names, x).unwrap(),
        TargetVector::new("y", y),
    )
    .unwrap()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_default_registry_end_to_end() {
    let dataset = noisy_linear(1000, 0);
    let config = BenchmarkConfig::new("y").with_test_fraction(0.2).with_random_state(42);
    let report = Benchmark::new(config).run_dataset(&dataset).unwrap();

    assert_eq!(report.n_test, 200);
    assert_eq!(report.n_train, 800);
    assert!(report.failures.is_empty());
    assert_eq!(
        report.results.model_names(),
        vec![LINEAR_REGRESSION, DECISION_TREE, RANDOM_FOREST, SVM, GRADIENT_BOOSTING]
    );

    let linear = report.results.get(LINEAR_REGRESSION).unwrap();
    assert!(linear.r2 > 0.8, "linear r2 = {}", linear.r2);

    for record in report.results.records() {
        assert!((record.rmse - record.mse.sqrt()).abs() < 1e-12);
        assert!(record.mae >= 0.0);
    }
    assert_eq!(report.timings.len(), 5);
}

#[test]
fn test_reruns_are_identical() {
    let dataset = noisy_linear(300, 5);
    let run = || {
        Benchmark::new(BenchmarkConfig::new("y").with_random_state(9))
            .run_dataset(&dataset)
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.results, second.results);
    assert_eq!(first.importances, second.importances);
}

#[test]
fn test_parallel_matches_sequential() {
    let dataset = noisy_linear(300, 6);
    let seq = Benchmark::new(BenchmarkConfig::new("y")).run_dataset(&dataset).unwrap();
    let par = Benchmark::new(BenchmarkConfig::new("y").with_parallel(true))
        .run_dataset(&dataset)
        .unwrap();
    assert_eq!(seq.results, par.results);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[test]
fn test_one_failing_model_yields_n_minus_one_records() {
    let dataset = noisy_linear(200, 1);
    let mut registry = default_registry(42);
    registry
        .register("Broken Forest", Estimator::RandomForest(RandomForest::new(0)))
        .unwrap();
    let attempted = registry.len();

    let report = Benchmark::new(BenchmarkConfig::new("y"))
        .with_registry(registry)
        .run_dataset(&dataset)
        .unwrap();

    assert_eq!(report.results.len(), attempted - 1);
    assert!(report.results.get("Broken Forest").is_none());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].model, "Broken Forest");
}

#[test]
fn test_evaluator_on_explicit_partitions() {
    let dataset = noisy_linear(120, 2);
    let split = train_test_split(&dataset.features, &dataset.target, 0.25, 3).unwrap();

    let registry = ModelRegistry::new()
        .with_model("ols", Estimator::Linear(LinearRegression::new()))
        .unwrap()
        .with_model("stump", Estimator::DecisionTree(DecisionTree::new().with_max_depth(1)))
        .unwrap();

    let eval = Evaluator::new()
        .evaluate(
            registry,
            &split.train_features,
            &split.train_target,
            &split.test_features,
            &split.test_target,
        )
        .unwrap();

    let ols = eval.results().get("ols").unwrap();
    let stump = eval.results().get("stump").unwrap();
    assert!(ols.r2 > stump.r2);
    assert_eq!(eval.results().best_by_r2().unwrap().model, "ols");
}

// ============================================================================
// Splitting
// ============================================================================

#[test]
fn test_split_is_complete_and_disjoint() {
    let split = TrainTestSplit::new(97, 0.2, 11).unwrap();
    let mut all: Vec<usize> = split
        .train_indices()
        .iter()
        .chain(split.test_indices())
        .copied()
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..97).collect::<Vec<_>>());
    assert_eq!(split.n_test(), 20);
}

#[test]
fn test_split_is_deterministic_per_seed() {
    let a = TrainTestSplit::new(50, 0.3, 42).unwrap();
    let b = TrainTestSplit::new(50, 0.3, 42).unwrap();
    let c = TrainTestSplit::new(50, 0.3, 43).unwrap();
    assert_eq!(a.test_indices(), b.test_indices());
    assert_ne!(a.test_indices(), c.test_indices());
}

// ============================================================================
// Importances
// ============================================================================

#[test]
fn test_importance_shape() {
    let dataset = noisy_linear(400, 3);
    let report = Benchmark::new(BenchmarkConfig::new("y").with_importance_model(RANDOM_FOREST))
        .run_dataset(&dataset)
        .unwrap();

    let table = report.importances.expect("random forest importances");
    assert_eq!(table.len(), WEIGHTS.len());
    assert!((table.total() - 1.0).abs() < 1e-6);
    for pair in table.records().windows(2) {
        assert!(pair[0].importance >= pair[1].importance);
    }
    // x4 carries the largest weight
    assert_eq!(table.records()[0].feature, "x4");
}

#[test]
fn test_linear_importance_model_gives_none() {
    let dataset = noisy_linear(100, 4);
    let report = Benchmark::new(BenchmarkConfig::new("y").with_importance_model(LINEAR_REGRESSION))
        .run_dataset(&dataset)
        .unwrap();
    assert!(report.importances.is_none());
    assert_eq!(report.results.len(), 5);
}

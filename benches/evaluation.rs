use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use regbench::benchmark::Evaluator;
use regbench::data::{FeatureMatrix, TargetVector};
use regbench::training::{
    default_registry, train_test_split, DecisionTree, RandomForest, Regressor,
};

fn create_regression_data(n_rows: usize, n_features: usize) -> (FeatureMatrix, TargetVector) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    let y = Array1::from_shape_fn(n_rows, |i| x.row(i).sum() + rng.gen::<f64>() * 0.1);

    let names = (0..n_features).map(|i| format!("feature_{}", i)).collect();
    (
        FeatureMatrix::new(names, x).unwrap(),
        TargetVector::new("target", y),
    )
}

fn bench_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("trees");
    group.sample_size(10);

    for n_rows in [1000, 5000].iter() {
        let (x, y) = create_regression_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("decision_tree", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut tree = DecisionTree::new().with_random_state(0);
                tree.fit(black_box(x.values()), black_box(y.values())).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("random_forest_20", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut forest = RandomForest::new(20).with_random_state(0);
                forest.fit(black_box(x.values()), black_box(y.values())).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    group.sample_size(10);

    let (x, y) = create_regression_data(1000, 5);
    let split = train_test_split(&x, &y, 0.2, 42).unwrap();

    for parallel in [false, true] {
        group.bench_with_input(BenchmarkId::new("default_registry", parallel), &parallel, |b, &parallel| {
            b.iter(|| {
                Evaluator::new()
                    .with_parallel(parallel)
                    .evaluate(
                        default_registry(42),
                        black_box(&split.train_features),
                        &split.train_target,
                        &split.test_features,
                        &split.test_target,
                    )
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_trees, bench_evaluation);
criterion_main!(benches);

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gnmsolver::{MatrixExt, NormalFormGame, SolveConfig, gnm_solve, random_ray};
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand_distr::Uniform;

fn bench_adjoint(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let a = Array::random_using((12, 12), Uniform::new(-1., 1.), &mut rng);
    c.bench_function("adjoint_12", |b| {
        b.iter_batched(
            || a.clone(),
            |mut a| a.adjoint().expect("Random matrix is singular."),
            BatchSize::SmallInput,
        )
    });
}

fn bench_three_players(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let game = NormalFormGame::random(&[3, 3, 3], &mut rng).expect("Cannot create game.");
    let ray = random_ray(&game, &mut rng);
    let config = SolveConfig::default();
    c.bench_function("gnm_3x3x3", |b| {
        b.iter_batched(
            || ray.clone(),
            |ray| gnm_solve(&game, ray, &config, |_, _| {}),
            BatchSize::SmallInput,
        )
    });
}

fn bench_bimatrix(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let game = NormalFormGame::random(&[8, 8], &mut rng).expect("Cannot create game.");
    let ray = random_ray(&game, &mut rng);
    let config = SolveConfig::default();
    c.bench_function("gnm_8x8", |b| {
        b.iter_batched(
            || ray.clone(),
            |ray| gnm_solve(&game, ray, &config, |_, _| {}),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_adjoint, bench_three_players, bench_bimatrix);
criterion_main!(benches);

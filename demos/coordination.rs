//! Traces a few paths through a 2x2 coordination game, which has two pure
//! equilibria and a mixed one, printing every point the solver reports.
use gnmsolver::{BimatrixGame, SolveConfig, gnm_solve};
use ndarray::array;

fn main() {
    env_logger::init();

    let game = match BimatrixGame::new(array![[3., 0.], [0., 1.]], array![[1., 0.], [0., 3.]]) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let config = SolveConfig {
        lambda_min: -50.,
        ..Default::default()
    };

    for ray in [array![1., 0.3, 0.8, 0.1], array![0.1, 0.9, 0.6, 0.2]] {
        println!("Ray {ray}");
        let result = gnm_solve(&game, ray, &config, |sigma, label| {
            println!("  {label:>20} {sigma:.4}");
        });
        match result {
            Ok(solution) => println!(
                "  {} equilibria, {}",
                solution.equilibria.len(),
                solution.termination
            ),
            Err(err) => eprintln!("  {err}"),
        }
    }
}

use gnmsolver::{BimatrixGame, EquilibriumSet, SolveConfig, Strategy, gnm_solve_many};
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;

fn help() {
    println!("Use: random_game <num strategies player 1> <num strategies player 2> [num rays]");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if !(3..=4).contains(&args.len()) {
        help();
        return;
    }
    let Ok(num_strategies0) = args[1].parse::<usize>() else {
        eprintln!("First argument is not an integer.");
        help();
        return;
    };
    let Ok(num_strategies1) = args[2].parse::<usize>() else {
        eprintln!("Second argument is not an integer.");
        help();
        return;
    };
    let num_rays = match args.get(3).map(|n| n.parse::<usize>()) {
        None => 8,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("Third argument is not an integer.");
            help();
            return;
        }
    };

    let a = Array::random((num_strategies0, num_strategies1), Uniform::new(0., 10.));
    let b = Array::random((num_strategies0, num_strategies1), Uniform::new(0., 10.));

    println!("Payoff for player 1:");
    println!("{a}");
    println!("Payoff for player 2:");
    println!("{b}");

    let game = match BimatrixGame::new(a, b) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let rays = (0..num_rays)
        .map(|_| Array::random(num_strategies0 + num_strategies1, Uniform::new(-1., 1.)))
        .collect();
    let config = SolveConfig {
        lambda_min: -50.,
        ..Default::default()
    };

    let mut equilibria = EquilibriumSet::default();
    for solution in gnm_solve_many(&game, rays, &config) {
        match solution {
            Ok(solution) => {
                equilibria.extend_from(&solution);
            }
            Err(err) => eprintln!("Skipping ray: {err}"),
        }
    }

    for (i, sigma) in equilibria.iter().enumerate() {
        let eq = Strategy::from_profile(sigma, num_strategies0);
        let eq_payoff = game.strategy_payoff(&eq);
        println!("Equilibrium {}", i + 1);
        println!("Player 1: {}", eq.0);
        println!("Player 2: {}", eq.1);
        println!("Payoff: {:.4}, {:.4}", eq_payoff.0, eq_payoff.1);
    }
}

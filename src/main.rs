use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use gnmsolver::{
    EquilibriumSet, Game, NormalFormGame, PathStats, Solution, SolveConfig, SolveError,
    StrategyProfile, Termination, gnm_solve, gnm_solve_many, random_ray,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of actions of each player, separated by commas. For example, 2,3,3 is a
    /// three-player game.
    #[arg(short, long, value_parser = parse_shape, default_value = "2,2")]
    actions: Shape,

    /// Seed for the random payoffs and perturbation rays.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of perturbation rays to trace.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Decimals printed per probability.
    #[arg(short, long, default_value_t = 6)]
    decimals: usize,

    /// Print only the equilibria.
    #[arg(short, long)]
    quiet: bool,

    /// Print every point reported along each path.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Print a JSON report instead of plain lines.
    #[arg(long)]
    json: bool,

    /// JSON file with the solver configuration.
    #[arg(short, long)]
    config: Option<String>,

    /// Sub-steps per support region.
    #[arg(long)]
    steps: Option<usize>,

    /// Give up once λ falls below this value.
    #[arg(long, allow_hyphen_values = true)]
    lambda_min: Option<f64>,

    /// Sub-steps between local Newton corrections.
    #[arg(long)]
    lnm_freq: Option<usize>,

    /// Iterations per local Newton correction.
    #[arg(long)]
    lnm_max: Option<usize>,

    /// Residual above which the path is corrected or abandoned.
    #[arg(long)]
    threshold: Option<f64>,

    /// Refit the perturbation ray instead of abandoning a drifting path.
    #[arg(long)]
    wobble: bool,
}

#[derive(Debug, Clone)]
struct Shape(Vec<usize>);

fn parse_shape(s: &str) -> Result<Shape, String> {
    let actions = s
        .split(',')
        .map(|n| {
            n.trim()
                .parse::<usize>()
                .map_err(|_| format!("{n} is not a number of actions."))
        })
        .collect::<Result<Vec<usize>, String>>()?;
    if actions.len() < 2 {
        return Err(format!("At least two players are needed ({s})."));
    }
    if actions.contains(&0) {
        return Err(format!("Every player needs at least one action ({s})."));
    }
    Ok(Shape(actions))
}

fn solver_config(args: &Args) -> Result<SolveConfig, SolveError> {
    let mut config = match &args.config {
        Some(path) => SolveConfig::from_file(path)?,
        None => SolveConfig::default(),
    };
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(lambda_min) = args.lambda_min {
        config.lambda_min = lambda_min;
    }
    if let Some(lnm_freq) = args.lnm_freq {
        config.lnm_freq = lnm_freq;
    }
    if let Some(lnm_max) = args.lnm_max {
        config.lnm_max = lnm_max;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    config.wobble |= args.wobble;
    config.validate()?;
    Ok(config)
}

fn format_profile(label: &str, sigma: &StrategyProfile, decimals: usize) -> String {
    std::iter::once(label.to_string())
        .chain(sigma.iter().map(|p| format!("{p:.decimals$}")))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Serialize)]
struct PathReport {
    ray: Vec<f64>,
    termination: Termination,
    reason: String,
    stats: PathStats,
    equilibria: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct Report {
    actions: Vec<usize>,
    seed: u64,
    config: SolveConfig,
    paths: Vec<PathReport>,
    equilibria: Vec<Vec<f64>>,
}

fn solve_verbose(
    game: &NormalFormGame,
    rays: &[StrategyProfile],
    config: &SolveConfig,
    decimals: usize,
) -> Vec<Result<Solution, SolveError>> {
    rays.iter()
        .enumerate()
        .map(|(i, ray)| {
            println!("Path {}", i + 1);
            gnm_solve(game, ray.clone(), config, |sigma, label| {
                println!("{}", format_profile(label, sigma, decimals));
            })
        })
        .collect()
}

fn solve_quietly(
    game: &NormalFormGame,
    rays: &[StrategyProfile],
    config: &SolveConfig,
    quiet: bool,
) -> Vec<Result<Solution, SolveError>> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {elapsed} {msg}").unwrap());
    pb.set_message(format!("Tracing {} paths", rays.len()));
    pb.enable_steady_tick(Duration::from_millis(100));
    let solutions = gnm_solve_many(game, rays.to_vec(), config);
    pb.finish_and_clear();
    solutions
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match solver_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let game = match NormalFormGame::random(&args.actions.0, &mut rng) {
        Ok(game) => game,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let rays: Vec<StrategyProfile> = (0..args.count)
        .map(|_| random_ray(&game, &mut rng))
        .collect();
    info!(
        "Random game with actions {:?} ({} pure profiles)",
        args.actions.0,
        args.actions.0.iter().product::<usize>()
    );

    let now = Instant::now();
    let solutions = if args.verbose && !args.json {
        solve_verbose(&game, &rays, &config, args.decimals)
    } else {
        solve_quietly(&game, &rays, &config, args.quiet || args.json)
    };
    let elapsed = now.elapsed();

    let mut equilibria = EquilibriumSet::default();
    let mut paths = Vec::new();
    let mut failed = false;
    for (i, (ray, solution)) in rays.iter().zip(solutions).enumerate() {
        match solution {
            Ok(solution) => {
                equilibria.extend_from(&solution);
                if solution.termination.is_error() {
                    error!("Path {}: {}", i + 1, solution.termination);
                }
                paths.push(PathReport {
                    ray: ray.to_vec(),
                    termination: solution.termination,
                    reason: solution.termination.to_string(),
                    stats: solution.stats,
                    equilibria: solution.equilibria.iter().map(|s| s.to_vec()).collect(),
                });
            }
            Err(err) => {
                error!("Path {}: {err}", i + 1);
                failed = true;
            }
        }
    }

    if args.json {
        let report = Report {
            actions: args.actions.0.clone(),
            seed: args.seed,
            config,
            paths,
            equilibria: equilibria.iter().map(|s| s.to_vec()).collect(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for sigma in equilibria.iter() {
            println!("{}", format_profile("NE", sigma, args.decimals));
        }
        if !args.quiet {
            println!(
                "{} equilibria on {} paths, max regret {:.2e}. Elapsed: {:.2?}",
                equilibria.len(),
                paths.len(),
                equilibria
                    .iter()
                    .map(|sigma| game.max_regret(sigma))
                    .fold(0., f64::max),
                elapsed
            );
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

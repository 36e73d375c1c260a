use thiserror::Error;

use crate::game::GameError;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("GNM needs at least two players, the game has {0}.")]
    TooFewPlayers(usize),

    #[error("Perturbation ray has {found} entries, the game has {expected} actions.")]
    RayDimension { expected: usize, found: usize },

    #[error("Perturbation ray has non-finite entries.")]
    NonFiniteRay,

    #[error("Perturbation ray is zero.")]
    ZeroRay,

    #[error("Perturbation ray has tied maximizers for player {player}.")]
    DegenerateRay { player: usize },

    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid game: {0}")]
    InvalidGame(#[from] GameError),

    #[error("Cannot read configuration file: {1}")]
    ConfigFile(#[source] std::io::Error, String),

    #[error("Cannot parse configuration file.")]
    ConfigParse(#[from] serde_json::Error),
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("A game needs at least one player.")]
    NoPlayers,

    #[error("Player {0} has no actions.")]
    NoActions(usize),

    #[error("Payoff tables do not match: {0}")]
    ShapeMismatch(String),

    #[error("Expected {expected} payoffs per profile, found {found}.")]
    PlayerCountMismatch { expected: usize, found: usize },

    #[error("Payoff is not finite: {0}")]
    InvalidPayoff(String),

    #[error("Action ranges do not partition the action space: {0}")]
    InvalidLayout(String),
}

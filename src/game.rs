//! Finite games in strategic form and the simplex retraction they share.
mod strategic_game;
pub use self::strategic_game::*;

pub mod retraction;

mod bimatrix_game;
pub use self::bimatrix_game::*;

mod normal_form_game;
pub use self::normal_form_game::*;

mod game_error;
pub use game_error::GameError;

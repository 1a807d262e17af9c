mod board_state;
mod card;
mod player_state;

pub use board_state::*;
pub use card::*;
pub use player_state::*;

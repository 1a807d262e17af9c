mod get_board_state;
mod reset_board_state;

pub use get_board_state::*;
pub use reset_board_state::*;

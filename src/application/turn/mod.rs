mod events;
mod play_turn;
pub mod prompts;
mod run_turn;

pub use events::*;
pub use play_turn::*;
pub use run_turn::*;

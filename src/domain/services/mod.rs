mod deck_setup;
mod response_parser;
mod state_merge;
mod visibility;

pub use deck_setup::*;
pub use response_parser::*;
pub use state_merge::*;
pub use visibility::*;

pub mod app_state;
pub mod config;
pub mod decks;
pub mod services;

pub use app_state::*;
pub use config::*;

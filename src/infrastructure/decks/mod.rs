mod starter_decks;

pub use starter_decks::*;

mod board_store;
mod llm_service;

pub use board_store::*;
pub use llm_service::*;

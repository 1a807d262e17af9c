pub mod board;
pub mod turn;

mod conversation;
mod turn_result;
mod views;

pub use conversation::*;
pub use turn_result::*;
pub use views::*;

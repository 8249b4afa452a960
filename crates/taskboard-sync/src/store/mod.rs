pub mod board_store;
pub mod lists;

pub use board_store::{BoardStore, MoveOutcome};

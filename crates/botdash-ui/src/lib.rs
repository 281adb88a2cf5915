pub mod board;
pub mod prompt;
pub mod table;

pub use board::{spinner, TerminalBoard};

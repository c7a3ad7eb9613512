pub mod cli;
pub mod output;

pub use cli::{Cli, Commands};
pub use output::ConsoleOutput;

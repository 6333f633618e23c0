//! Command-line interface: argument parsing and logging setup.

pub mod args;
pub mod setup;

pub use args::{Cli, Commands, OutputFormat};
pub use setup::init_logging;

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}

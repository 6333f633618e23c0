use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lintpilot")]
#[command(about = "Apply safe lint fixes and report the rest", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a repository and optionally fix SAFE issues
    #[command(group(ArgGroup::new("mode").args(["apply", "dry_run"])))]
    Run {
        /// Repository to process
        repo: PathBuf,

        /// Write fixes to disk (default is analyze only)
        #[arg(long)]
        apply: bool,

        /// Apply and safety-check fixes in memory without writing
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Ask the configured AI provider for issues without a mechanical fix
        #[arg(long)]
        ai: bool,

        /// Only fix these rule codes (can be repeated)
        #[arg(long = "rule", value_name = "CODE")]
        rules: Vec<String>,

        /// Configuration file (defaults to <repo>/.lintpilot.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Directory for the usage store and run log
        #[arg(long = "state-dir", env = "LINTPILOT_STATE_DIR")]
        state_dir: Option<PathBuf>,
    },

    /// Write an example .lintpilot.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show aggregate statistics from the run log
    Stats {
        /// Directory holding the run log
        #[arg(long = "state-dir", env = "LINTPILOT_STATE_DIR")]
        state_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Explain how a rule code is classified and what its fix does
    Explain {
        /// Rule code, e.g. F401 or no-extra-semi
        code: String,

        /// Language the code comes from
        #[arg(long, default_value = "python")]
        language: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_to_analyze_only() {
        let cli = Cli::try_parse_from(["lintpilot", "run", "repo", "--rule", "F401", "--rule", "W291"])
            .unwrap();
        match cli.command {
            Commands::Run {
                apply,
                dry_run,
                rules,
                format,
                ..
            } => {
                assert!(!apply && !dry_run);
                assert_eq!(rules, vec!["F401", "W291"]);
                assert_eq!(format, OutputFormat::Terminal);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn apply_and_dry_run_conflict() {
        assert!(Cli::try_parse_from(["lintpilot", "run", "repo", "--apply", "--dry-run"]).is_err());
    }

    #[test]
    fn verbosity_counts_before_or_after_subcommand() {
        let cli = Cli::try_parse_from(["lintpilot", "-vv", "stats"]).unwrap();
        assert_eq!(cli.verbosity, 2);
        let cli = Cli::try_parse_from(["lintpilot", "explain", "F401", "-v"]).unwrap();
        assert_eq!(cli.verbosity, 1);
    }
}

use anyhow::Result;
use lintpilot::cli::setup::install_cancel_handler;
use lintpilot::cli::{init_logging, parse_args, Commands};
use lintpilot::commands::{self, RunConfig};
use lintpilot::run_log::RunMode;

fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Run {
            repo,
            apply,
            dry_run,
            ai,
            rules,
            config,
            format,
            state_dir,
        } => {
            let mode = if apply {
                RunMode::Apply
            } else if dry_run {
                RunMode::DryRun
            } else {
                RunMode::Analyze
            };
            let cancel = install_cancel_handler()?;
            commands::run_repository(
                RunConfig {
                    repo,
                    mode,
                    ai,
                    rules,
                    config,
                    format: format.into(),
                    state_dir,
                },
                &cancel,
            )
        }
        Commands::Init { force } => commands::init_config(force),
        Commands::Stats { state_dir, format } => commands::show_stats(state_dir, format.into()),
        Commands::Explain {
            code,
            language,
            format,
        } => commands::explain_rule(&code, &language, format.into()),
    }
}

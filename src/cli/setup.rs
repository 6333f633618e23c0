//! Runtime setup for the binary: logging and Ctrl-C handling.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. `RUST_LOG` takes precedence when set.
pub fn log_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "lintpilot=warn",
        1 => "lintpilot=info",
        _ => "lintpilot=debug",
    }
}

/// Install the tracing subscriber. Logs go to stderr so JSON on stdout stays clean.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbosity)));
    // A second install (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Flag set by Ctrl-C. The current file finishes, the rest are left alone.
pub fn install_cancel_handler() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            // Second Ctrl-C: stop now.
            std::process::exit(130);
        }
        eprintln!("\nCancelling after the current file... (Ctrl-C again to abort)");
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_directives() {
        assert_eq!(log_directive(0), "lintpilot=warn");
        assert_eq!(log_directive(1), "lintpilot=info");
        assert_eq!(log_directive(5), "lintpilot=debug");
    }
}

pub mod explain;
pub mod init;
pub mod run;
pub mod stats;

pub use explain::explain_rule;
pub use init::init_config;
pub use run::{run_repository, RunConfig};
pub use stats::show_stats;

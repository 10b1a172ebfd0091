use clap::Parser;

use walkthru_lib::cli::{self, Cli};

fn main() {
    walkthru_lib::init_tracing();
    tracing::info!("Walkthru v{}", walkthru_lib::config::APP_VERSION);

    if let Err(err) = cli::run(Cli::parse()) {
        tracing::error!(error = %err, "command failed");
        std::process::exit(1);
    }
}

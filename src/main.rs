use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use demo_app::config::load_config;
use demo_app::lifecycle::{startup, EXIT_STARTUP_FAILURE};
use demo_app::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "demo-app", version, about = "Demo web service with coordinated graceful shutdown")]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("demo-app: failed to load configuration: {}", e);
            return ExitCode::from(EXIT_STARTUP_FAILURE);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("demo-app: failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_STARTUP_FAILURE);
    }

    tracing::info!(
        application = %config.app.name,
        version = %config.app.version,
        "Configuration loaded"
    );

    ExitCode::from(startup::run(config).await)
}

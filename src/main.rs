use clap::Parser;
use dshell::configuration::config::{Config, DEFAULT_CONFIG_PATH};
use dshell::container_management::DockerConnector;
use dshell::controller::{Controller, Mode};
use dshell::session_management::invoking_user;
use log::{error, info};
use std::path::PathBuf;

/// Exit status for any unrecoverable error.
const EXIT_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(name = "dshell")]
#[command(version)]
#[command(about = "Throwaway containerized SSH sessions on the least loaded engine")]
struct Args {
    /// Reap containers older than `max_age` instead of opening a session
    #[arg(long)]
    clean: bool,

    /// Configuration file; built-in defaults apply when it is missing
    #[arg(long, env = "DSHELL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .init();

    let config = Config::load_or_default(&args.config);
    let mode = if args.clean {
        Mode::Clean
    } else {
        Mode::Interactive
    };

    let controller = Controller::new(
        config,
        Box::new(DockerConnector::default()),
        invoking_user(),
    );
    if let Err(e) = controller.run(mode).await {
        error!("{}", e);
        std::process::exit(EXIT_FAILURE);
    }
    info!("Done");
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wing::explorer::{self, Explorer, ExplorerConfig};
use wing::{Dispatcher, GitGateway};

/// Browse, diff, commit and push a git working tree from the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Repository to open.
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// How often to re-read git status; `0s` turns periodic refresh off.
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    refresh: Duration,

    #[arg(long, default_value = "default")]
    theme: String,
}

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing()?;

    let gateway = GitGateway::new(&args.repo);
    info!("opening {}", gateway.repo().display());

    let config = ExplorerConfig {
        refresh_period: args.refresh,
        theme: args.theme,
    };
    let dispatcher = Dispatcher::new(Arc::new(gateway));
    let program = explorer::program(Explorer::new(config), dispatcher);

    if let Err(error) = program.run() {
        eprintln!("wing: {error}");
        return Ok(ExitCode::from(1));
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to the file named by `WING_LOG`; without it nothing is logged.
fn init_tracing() -> color_eyre::Result<()> {
    use std::fs::File;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let Some(log_path) = std::env::var_os("WING_LOG").map(PathBuf::from) else {
        return Ok(());
    };

    let file = File::options().create(true).append(true).open(&log_path)?;
    let writer = tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::sync::Mutex::new(file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(EnvFilter::from_default_env())
        .try_init()
        .map_err(|error| color_eyre::eyre::eyre!(error))?;

    Ok(())
}

use std::fs::File;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::info;

use hwfand::{application::Application, cli::Cli, config::Config, logging};

fn into_daemon() -> Result<()> {
    File::create("/var/tmp/hwfand.log")
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

async fn run(config: Config) -> Result<()> {
    info!("hwfand starting");

    Application::builder()
        .with_config(config)
        .build()?
        .run()
        .await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The fork must happen before the runtime exists, so no #[tokio::main].
    if cli.daemonize {
        logging::init_syslog().and(into_daemon())?;
    } else {
        logging::init_stdout()?;
    }

    let config = Config::load(cli.config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?
        .block_on(run(config))
}

mod app;
mod cli;
mod components;
mod event;
mod logging;
mod manager;
mod model;
mod source;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut logging = logging::init(&cli.log_dir)?;
    let status = logging.take_status_rx();

    let result = app::run(cli, status).await;
    if let Err(err) = &result {
        tracing::error!(log_dir = %logging.log_dir().display(), "{err:#}");
    }
    result
}

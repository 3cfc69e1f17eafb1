use clap::Parser;

use classic_pairing_lib::bootstrap::{cli::Cli, tracing::init_tracing_subscriber};
use classic_pairing_lib::run_simulation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = cp_infra::load_config_or_default(cli.config.as_deref())?;
    let report = run_simulation(&cli.options(), &config).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

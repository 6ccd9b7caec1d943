mod commands;
mod external;
mod logging;

use clap::{Parser, Subcommand};
use std::sync::Arc;

/// city2tabula is a batch-processing driver that labels 3D building models with their
/// closest TABULA building-typology match.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run complete setup: external import, core DB-setup queue, data import, supplementary queue.
    CreateDb,
    /// Drop all managed schemas, then run complete setup.
    ResetAll,
    /// Drop and recreate only the source 3D schemas, re-importing files.
    ResetCitydb,
    /// Drop and recreate only the application schemas, keeping source data.
    ResetCity2tabula,
    /// Fetch building IDs for both LOD levels, batch them, and run the feature-extraction queue.
    ExtractFeatures,
}

fn main() -> anyhow::Result<()> {
    // Required in order for sqlx's runtime-tokio-rustls transport to use `rustls` for TLS.
    // See: https://docs.rs/rustls/latest/rustls/crypto/struct.CryptoProvider.html
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("failed to install default crypto provider");

    let cli = Cli::parse();

    let config = city2tabula_sql::Config::from_env()?;
    let _log_guard = logging::init(&config.log_level)?;
    tracing::info!(?cli, "started");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(async_main(cli.command, Arc::new(config)));

    tracing::info!(?result, "shutting down");
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    result
}

async fn async_main(command: Command, config: Arc<city2tabula_sql::Config>) -> anyhow::Result<()> {
    let pool = commands::connect(&config).await?;

    match command {
        Command::CreateDb => commands::create_db(config, pool).await,
        Command::ResetAll => commands::reset_all(config, pool).await,
        Command::ResetCitydb => commands::reset_citydb(config, pool).await,
        Command::ResetCity2tabula => commands::reset_city2tabula(config, pool).await,
        Command::ExtractFeatures => commands::extract_features(config, pool).await,
    }
}

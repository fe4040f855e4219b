mod bootstrap;

use anyhow::Result;
use clap::Parser;
use opstats_core::settings::Settings;
use opstats_data::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("opstats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", settings.database_url);

    let store = Store::connect(&settings.database_url).await?;

    opstats_server::serve(settings.listen, store).await?;

    tracing::info!("opstats stopped");
    Ok(())
}

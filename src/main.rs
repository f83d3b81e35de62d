use anyhow::Result;
use apply_flow::utils::logging;
use apply_flow::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialise logging
    logging::init(config.verbose_logging);

    // Initialise and run the application
    let app = App::initialize(config).await?;
    let result = app.run().await;
    app.shutdown().await;

    result
}

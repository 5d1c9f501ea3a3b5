use clap::Parser;
use wschat::{app, config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), app::AppError> {
    // Logs go to stderr; stdout belongs to the rendered chat.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = config::Cli::parse().into_config()?;
    tracing::info!(endpoint = %config.endpoint, keepalive_secs = config.keepalive.as_secs(), "wschat starting");

    app::run(config).await
}

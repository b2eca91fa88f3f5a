//! Request a chat completion and store the response as an event.
use envconfig::Envconfig;
use tracing_subscriber::EnvFilter;

use gpt_ingest::config::Config;
use gpt_ingest::error::PipelineError;
use gpt_ingest::pipeline;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::init_from_env().expect("Invalid configuration:");

    pipeline::run_from_config(&config).await?;

    Ok(())
}

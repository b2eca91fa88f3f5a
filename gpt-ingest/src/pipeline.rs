use event_common::event::{EventRecord, EventSink};
use event_common::pgevents::PgEventStore;
use tracing::{error, info};

use crate::config::Config;
use crate::error::PipelineError;
use crate::fetch::{CompletionFetcher, EventSource};

/// Fetch one payload from `source` and store it in `sink` as a single event.
///
/// The steps run strictly in order. If the fetch fails nothing is inserted; if the insert fails
/// no completion is reported. On success the stored record is returned.
///
/// # Arguments
///
/// * `source`: Where the event payload comes from.
/// * `sink`: Where the resulting `EventRecord` is written.
/// * `user_id`: Identifier stored alongside the payload.
/// * `event_name`: Name stored alongside the payload.
pub async fn run<S, K>(
    source: &S,
    sink: &K,
    user_id: &str,
    event_name: &str,
) -> Result<EventRecord, PipelineError>
where
    S: EventSource + ?Sized,
    K: EventSink + ?Sized,
{
    let event_data = source.fetch().await?;

    let record = EventRecord::new(user_id, event_name, event_data);
    sink.insert(&record).await?;

    info!("Process completed successfully");

    Ok(record)
}

/// Build the fetcher and the store described by `config` and run the pipeline once.
///
/// Every failure, including building the HTTP client, is logged at ERROR before being returned.
pub async fn run_from_config(config: &Config) -> Result<EventRecord, PipelineError> {
    let result = ingest(config).await;

    if let Err(error) = &result {
        error!("failed to ingest event: {}", error);
    }

    result
}

async fn ingest(config: &Config) -> Result<EventRecord, PipelineError> {
    let fetcher = CompletionFetcher::from_config(&config.openai)?;
    let store = PgEventStore::new(config.database.connect_options());

    run(&fetcher, &store, &config.user_id, &config.event_name).await
}

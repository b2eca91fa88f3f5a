//! # PgEvents
//!
//! Persist `EventRecord`s into the PostgreSQL `events` table.
//!
//! Every insert opens its own connection and closes it before returning, whether or not the
//! statement succeeded. There is no pooling and no transaction around the insert.
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::types::Json;
use sqlx::Connection;
use thiserror::Error;
use tracing::debug;

use crate::event::{EventRecord, EventSink};

/// Enumeration of errors that can occur while inserting an event.
/// Errors that originate from sqlx are wrapped to say which step failed.
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("connection failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError { command: String, error: sqlx::Error },
    #[error("closing connection failed with: {error}")]
    CloseError { error: sqlx::Error },
}

/// A convenience to wrap the result of an insert.
pub type InsertResult<T> = std::result::Result<T, InsertError>;

const INSERT_EVENT_QUERY: &str = r#"
INSERT INTO events
    (user_id, event_name, event_data)
VALUES
    ($1, $2, $3)
"#;

/// Open a connection, insert a single event and close the connection again.
///
/// No validation is done on the inputs: empty strings and a JSON `null` payload are stored as is.
/// The connection is closed even when the insert fails, and in that case the insert error is the
/// one returned.
///
/// # Arguments
///
/// * `options`: Connection options pointing at the database holding the `events` table.
/// * `user_id`: Identifier of the user the event belongs to.
/// * `event_name`: Name describing the event.
/// * `event_data`: The payload, stored as JSONB.
pub async fn insert_event(
    options: &PgConnectOptions,
    user_id: &str,
    event_name: &str,
    event_data: &Value,
) -> InsertResult<()> {
    let mut connection = PgConnection::connect_with(options)
        .await
        .map_err(|error| InsertError::ConnectionError { error })?;

    let inserted = sqlx::query(INSERT_EVENT_QUERY)
        .bind(user_id)
        .bind(event_name)
        .bind(Json(event_data))
        .execute(&mut connection)
        .await;

    let closed = connection.close().await;

    inserted.map_err(|error| InsertError::QueryError {
        command: "INSERT".to_owned(),
        error,
    })?;
    closed.map_err(|error| InsertError::CloseError { error })?;

    debug!(user_id, event_name, "inserted event");

    Ok(())
}

/// An `EventSink` writing to PostgreSQL with one short-lived connection per insert.
#[derive(Clone, Debug)]
pub struct PgEventStore {
    options: PgConnectOptions,
}

impl PgEventStore {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    pub async fn insert(&self, record: &EventRecord) -> InsertResult<()> {
        insert_event(
            &self.options,
            &record.user_id,
            &record.event_name,
            &record.event_data,
        )
        .await
    }
}

#[async_trait]
impl EventSink for PgEventStore {
    async fn insert(&self, record: &EventRecord) -> InsertResult<()> {
        PgEventStore::insert(self, record).await
    }
}

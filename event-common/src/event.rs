use async_trait::async_trait;
use serde_json::Value;

use crate::pgevents::InsertError;

/// A single row of the `events` table. Records are append-only and written once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub user_id: String,
    pub event_name: String,
    /// Whatever payload produced the event, stored without inspection.
    pub event_data: Value,
}

impl EventRecord {
    pub fn new(user_id: &str, event_name: &str, event_data: Value) -> Self {
        Self {
            user_id: user_id.to_owned(),
            event_name: event_name.to_owned(),
            event_data,
        }
    }
}

/// Somewhere an `EventRecord` can be persisted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn insert(&self, record: &EventRecord) -> Result<(), InsertError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_keeps_payload_untouched() {
        let payload = json!({"choices": [{"message": {"content": "hello"}}]});
        let record = EventRecord::new("your-uuid", "GPT Response", payload.clone());

        assert_eq!(record.user_id, "your-uuid");
        assert_eq!(record.event_name, "GPT Response");
        assert_eq!(record.event_data, payload);
    }

    #[test]
    fn test_new_accepts_empty_values() {
        let record = EventRecord::new("", "", Value::Null);

        assert!(record.user_id.is_empty());
        assert!(record.event_name.is_empty());
        assert!(record.event_data.is_null());
    }
}

//! Subscription messages exchanged over the GraphQL websocket
//!
//! Stump speaks the `subscriptions-transport-ws` convention: the client sends
//! `connection_init` and `start`, the server answers with `connection_ack`
//! followed by `data`, `error`, `complete` and keep-alive (`ka`) messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::mediaserver::{BookEvent, MediaServerBookId, MediaServerLibraryId, MediaServerSeriesId};

pub const SUBSCRIPTION_ID: &str = "1";

const CREATED_MEDIA: &str = "CreatedMedia";

#[derive(Debug, Serialize)]
pub struct StartPayload<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage<'a> {
    ConnectionInit,
    Start {
        id: &'a str,
        payload: StartPayload<'a>,
    },
    Stop {
        id: &'a str,
    },
    ConnectionTerminate,
}

impl ClientMessage<'_> {
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionAck,
    ConnectionError {
        #[serde(default)]
        payload: Value,
    },
    Data {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    Error {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    Complete {
        #[serde(default)]
        id: Option<String>,
    },
    Ka,
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn id_field(event: &Value, key: &str) -> Option<String> {
    match event.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract a [BookEvent] from the payload of a `data` message.
///
/// Only `CreatedMedia` events carrying all three ids produce an event;
/// every other event type and any partial record yields `None`.
pub fn book_event_from_payload(payload: &Value) -> Option<BookEvent> {
    let event = payload.get("data")?.get("readEvents")?;
    if event.get("__typename")?.as_str()? != CREATED_MEDIA {
        return None;
    }
    Some(BookEvent {
        book_id: MediaServerBookId::new(id_field(event, "id")?),
        series_id: MediaServerSeriesId::new(id_field(event, "seriesId")?),
        library_id: MediaServerLibraryId::new(id_field(event, "libraryId")?),
    })
}

/// GraphQL errors reported inside a `data` or `error` payload
pub fn payload_errors(payload: &Value) -> Vec<String> {
    let errors = match payload {
        Value::Array(errors) => errors.as_slice(),
        other => match other.get("errors").and_then(Value::as_array) {
            Some(errors) => errors.as_slice(),
            None => return match other.get("message").and_then(Value::as_str) {
                Some(message) => vec![message.to_string()],
                None => Vec::new(),
            },
        },
    };
    errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

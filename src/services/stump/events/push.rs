//! One websocket connection of the push session

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::SessionState;
use super::fanout::EventFanout;
use super::protocol::{
    ClientMessage, SUBSCRIPTION_ID, ServerMessage, StartPayload, book_event_from_payload,
    payload_errors,
};
use super::reconnect::ReconnectPolicy;
use crate::error::{Result, StumpError};
use crate::services::stump::client::StumpClient;
use crate::services::stump::queries::READ_EVENTS_SUBSCRIPTION;

/// Where the subscription socket connects and which headers it sends
#[derive(Clone)]
pub struct SubscriptionEndpoint {
    pub url: Url,
    pub headers: HeaderMap,
}

impl SubscriptionEndpoint {
    pub fn new(url: Url, headers: HeaderMap) -> Self {
        Self { url, headers }
    }

    pub fn from_client(client: &StumpClient) -> Result<Self> {
        Ok(Self::new(client.subscription_url()?, client.auth_headers()))
    }
}

impl std::fmt::Debug for SubscriptionEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionEndpoint")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Connect, subscribe and relay events until the token is cancelled
/// (`Ok`) or the connection fails (`Err`).
pub(super) async fn run_connection(
    endpoint: &SubscriptionEndpoint,
    fanout: &EventFanout,
    policy: &mut ReconnectPolicy,
    state: &RwLock<SessionState>,
    token: &CancellationToken,
    connect_timeout: Duration,
) -> Result<()> {
    let mut request = endpoint.url.as_str().into_client_request()?;
    request.headers_mut().extend(endpoint.headers.clone());

    debug!(url = %endpoint.url, "Connecting to Stump subscription endpoint");
    let (socket, _response) = tokio::select! {
        _ = token.cancelled() => return Ok(()),
        connected = tokio::time::timeout(connect_timeout, connect_async(request)) => {
            connected.map_err(|_| {
                StumpError::WebSocket(format!("connect timed out after {}s", connect_timeout.as_secs()))
            })??
        }
    };
    let (mut sink, mut stream) = socket.split();

    sink.send(Message::Text(ClientMessage::ConnectionInit.to_text()?))
        .await?;
    let start = ClientMessage::Start {
        id: SUBSCRIPTION_ID,
        payload: StartPayload {
            query: READ_EVENTS_SUBSCRIPTION,
        },
    };
    sink.send(Message::Text(start.to_text()?)).await?;

    loop {
        let frame = tokio::select! {
            _ = token.cancelled() => {
                let stop = ClientMessage::Stop { id: SUBSCRIPTION_ID }.to_text()?;
                let terminate = ClientMessage::ConnectionTerminate.to_text()?;
                let _ = sink.send(Message::Text(stop)).await;
                let _ = sink.send(Message::Text(terminate)).await;
                let _ = sink.close().await;
                return Ok(());
            }
            frame = stream.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(reason))) => {
                return Err(StumpError::WebSocket(format!(
                    "connection closed by server: {reason:?}"
                )));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(StumpError::WebSocket("connection closed".into())),
        };

        let message = match ServerMessage::parse(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, message = %text, "Ignoring malformed subscription message");
                continue;
            }
        };

        match message {
            ServerMessage::ConnectionAck => {
                info!(url = %endpoint.url, "Stump event subscription established");
                policy.record_success();
                *state.write() = SessionState::Connected;
            }
            ServerMessage::Data { payload, .. } => {
                let errors = payload_errors(&payload);
                if !errors.is_empty() {
                    warn!(errors = ?errors, "Subscription data carried errors");
                }
                if let Some(event) = book_event_from_payload(&payload) {
                    debug!(
                        library_id = %event.library_id,
                        series_id = %event.series_id,
                        book_id = %event.book_id,
                        "Media created"
                    );
                    fanout.notify_books_added(vec![event]).await;
                }
            }
            ServerMessage::Error { payload, .. } => {
                warn!(errors = ?payload_errors(&payload), "Subscription error reported by server");
            }
            ServerMessage::Complete { .. } => {
                return Err(StumpError::Protocol("subscription completed by server".into()));
            }
            ServerMessage::ConnectionError { payload } => {
                return Err(StumpError::Protocol(format!(
                    "connection rejected: {}",
                    payload_errors(&payload).join(", ")
                )));
            }
            ServerMessage::Ka | ServerMessage::Unknown => {}
        }
    }
}

//! Stump change notifications
//!
//! [StumpEventHandler] owns one background session at a time. Depending on
//! [EventMode] the session either keeps a GraphQL subscription open (push),
//! enumerates the catalog on an interval and diffs it (poll), or starts with
//! push and falls back to polling once the reconnect circuit opens (auto).
//! Discovered changes are handed to the listeners through [EventFanout].

pub mod fanout;
pub mod poll;
pub mod protocol;
pub mod push;
pub mod reconnect;
pub mod seen;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use self::fanout::EventFanout;
use self::poll::{LibraryCatalog, run_poll_loop};
use self::push::{SubscriptionEndpoint, run_connection};
use self::reconnect::{CircuitState, ReconnectConfig, ReconnectDecision, ReconnectPolicy};
use crate::error::{Result, StumpError};
use crate::mediaserver::MediaServerEventListener;
use crate::services::manager::{Service, ServiceHealth};
use crate::services::stump::client::StumpClient;

pub const SERVICE_NAME: &str = "stump-events";

/// How the handler learns about changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    /// GraphQL subscription only
    Push,
    /// Periodic enumeration only
    Poll,
    /// Subscription with polling fallback
    Auto,
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Poll => "poll",
            Self::Auto => "auto",
        })
    }
}

impl FromStr for EventMode {
    type Err = StumpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "poll" => Ok(Self::Poll),
            "auto" => Ok(Self::Auto),
            other => Err(StumpError::Config(format!(
                "unknown event mode '{other}', expected push, poll or auto"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventHandlerConfig {
    pub mode: EventMode,
    pub poll_interval: Duration,
    /// Per-listener timeout during fan-out (None = wait for the listener)
    pub listener_timeout: Option<Duration>,
    pub reconnect: ReconnectConfig,
    /// Timeout for the websocket handshake
    pub connect_timeout: Duration,
}

impl Default for EventHandlerConfig {
    fn default() -> Self {
        Self {
            mode: EventMode::Auto,
            poll_interval: Duration::from_secs(300),
            listener_timeout: None,
            reconnect: ReconnectConfig::default(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// What the background session is doing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Connecting,
    Connected,
    Reconnecting { attempt: u32, circuit: CircuitState },
    Polling,
    PollingFallback,
    GaveUp { attempts: u32 },
}

impl SessionState {
    pub fn health(&self) -> ServiceHealth {
        match self {
            Self::Stopped => ServiceHealth::unhealthy("stopped"),
            Self::Connecting | Self::Connected | Self::Polling => ServiceHealth::healthy(),
            Self::Reconnecting {
                circuit: CircuitState::Closed,
                ..
            } => ServiceHealth::healthy(),
            Self::Reconnecting { attempt, .. } => {
                ServiceHealth::degraded(format!("reconnecting, {attempt} consecutive failures"))
            }
            Self::PollingFallback => ServiceHealth::degraded("polling fallback"),
            Self::GaveUp { attempts } => {
                ServiceHealth::unhealthy(format!("gave up after {attempts} failed connections"))
            }
        }
    }
}

struct HandlerInner {
    endpoint: SubscriptionEndpoint,
    catalog: Arc<dyn LibraryCatalog>,
    fanout: EventFanout,
    config: EventHandlerConfig,
    state: RwLock<SessionState>,
}

impl HandlerInner {
    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    async fn run(&self, token: CancellationToken) {
        match self.config.mode {
            EventMode::Poll => {
                self.set_state(SessionState::Polling);
                run_poll_loop(
                    self.catalog.as_ref(),
                    &self.fanout,
                    self.config.poll_interval,
                    &token,
                )
                .await;
            }
            EventMode::Push | EventMode::Auto => self.run_push(&token).await,
        }

        let mut state = self.state.write();
        if !matches!(*state, SessionState::GaveUp { .. }) {
            *state = SessionState::Stopped;
        }
    }

    async fn run_push(&self, token: &CancellationToken) {
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        while !token.is_cancelled() {
            if policy.consecutive_failures() == 0 {
                self.set_state(SessionState::Connecting);
            }
            let result = run_connection(
                &self.endpoint,
                &self.fanout,
                &mut policy,
                &self.state,
                token,
                self.config.connect_timeout,
            )
            .await;

            if token.is_cancelled() {
                break;
            }
            if let Err(e) = &result {
                warn!(error = %e, url = %self.endpoint.url, "Stump event subscription failed");
            }

            let decision = policy.record_failure();
            let attempts = policy.consecutive_failures();
            let circuit = policy.circuit();

            if self.config.mode == EventMode::Auto
                && (circuit == CircuitState::Open || decision == ReconnectDecision::GiveUp)
            {
                warn!(
                    failures = attempts,
                    "Stump subscriptions unavailable, falling back to polling"
                );
                self.set_state(SessionState::PollingFallback);
                run_poll_loop(
                    self.catalog.as_ref(),
                    &self.fanout,
                    self.config.poll_interval,
                    token,
                )
                .await;
                return;
            }

            match decision {
                ReconnectDecision::GiveUp => {
                    error!(attempts, "Giving up on Stump event subscription");
                    self.set_state(SessionState::GaveUp { attempts });
                    token.cancel();
                    return;
                }
                ReconnectDecision::Retry(delay) => {
                    if circuit == CircuitState::Open {
                        warn!(failures = attempts, "Stump event circuit open");
                    }
                    info!(
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        "Reconnecting to Stump"
                    );
                    self.set_state(SessionState::Reconnecting {
                        attempt: attempts,
                        circuit,
                    });
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

struct Session {
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

async fn wait_until_done(mut done: watch::Receiver<bool>) {
    // a dropped sender means the task ended without reporting
    let _ = done.wait_for(|finished| *finished).await;
}

/// Relays Stump changes to the registered listeners
pub struct StumpEventHandler {
    inner: Arc<HandlerInner>,
    session: Mutex<Option<Session>>,
}

impl StumpEventHandler {
    pub fn new(
        client: Arc<StumpClient>,
        listeners: Vec<Arc<dyn MediaServerEventListener>>,
        config: EventHandlerConfig,
    ) -> Result<Self> {
        let endpoint = SubscriptionEndpoint::from_client(&client)?;
        Ok(Self::with_catalog(endpoint, client, listeners, config))
    }

    /// Build a handler from its parts; the catalog is only used for polling.
    pub fn with_catalog(
        endpoint: SubscriptionEndpoint,
        catalog: Arc<dyn LibraryCatalog>,
        listeners: Vec<Arc<dyn MediaServerEventListener>>,
        config: EventHandlerConfig,
    ) -> Self {
        let fanout = EventFanout::new(listeners, config.listener_timeout);
        Self {
            inner: Arc::new(HandlerInner {
                endpoint,
                catalog,
                fanout,
                config,
                state: RwLock::new(SessionState::Stopped),
            }),
            session: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> EventMode {
        self.inner.config.mode
    }

    /// Begin a session unless one is already active. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let mut session = self.session.lock();
        if session.as_ref().is_some_and(|s| !s.token.is_cancelled()) {
            debug!("Stump event handler already running");
            return;
        }

        let previous = session.take().map(|s| s.done);
        let token = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let task_token = token.clone();

        info!(mode = %inner.config.mode, "Starting Stump event handler");
        tokio::spawn(async move {
            if let Some(previous) = previous {
                wait_until_done(previous).await;
            }
            if !task_token.is_cancelled() {
                inner.run(task_token).await;
            }
            let _ = done_tx.send(true);
        });

        *session = Some(Session {
            token,
            done: done_rx,
        });
    }

    /// Ask the session to end. Returns immediately; the task finishes at its
    /// next checkpoint.
    pub fn stop(&self) {
        let session = self.session.lock();
        if let Some(session) = session.as_ref() {
            if !session.token.is_cancelled() {
                info!("Stopping Stump event handler");
                session.token.cancel();
            }
        }
    }

    /// [stop](Self::stop) and wait for the background task to finish.
    pub async fn shutdown(&self) {
        let done = {
            let session = self.session.lock();
            session.as_ref().map(|s| {
                s.token.cancel();
                s.done.clone()
            })
        };
        if let Some(done) = done {
            wait_until_done(done).await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| !s.token.is_cancelled())
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    pub fn health(&self) -> ServiceHealth {
        self.inner.state.read().health()
    }
}

impl fmt::Debug for StumpEventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StumpEventHandler")
            .field("mode", &self.inner.config.mode)
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl Service for StumpEventHandler {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn start(&self) -> anyhow::Result<()> {
        StumpEventHandler::start(self);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.shutdown().await;
        Ok(())
    }

    async fn health(&self) -> anyhow::Result<ServiceHealth> {
        Ok(StumpEventHandler::health(self))
    }
}

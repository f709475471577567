//! Stump media server integration
//!
//! [StumpClient] speaks Stump's GraphQL API, [StumpMediaServerClientAdapter]
//! maps it onto the vendor-neutral [MediaServerClient](crate::mediaserver::MediaServerClient),
//! and [StumpEventHandler] turns Stump changes into listener notifications.

pub mod adapter;
pub mod auth;
pub mod client;
pub mod events;
pub mod model;
pub mod queries;
pub mod request;

pub use adapter::StumpMediaServerClientAdapter;
pub use auth::{ApiKeyAuthProvider, StumpAuthProvider};
pub use client::StumpClient;
pub use events::{EventHandlerConfig, EventMode, StumpEventHandler};

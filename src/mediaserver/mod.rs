//! Vendor-neutral media server abstraction
//!
//! The host application talks to every media server through [MediaServerClient]
//! and learns about changes through [MediaServerEventListener]. Backend adapters
//! (see [crate::services::stump]) translate to and from these types.

pub mod client;
pub mod events;
pub mod model;

pub use client::MediaServerClient;
pub use events::{BookEvent, MediaServerEventListener, SeriesEvent};
pub use model::*;

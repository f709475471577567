//! Stump media server adapter
//!
//! Exposes a Stump server through the vendor-neutral [mediaserver] traits and
//! relays its change notifications to host listeners.

pub mod config;
pub mod error;
pub mod mediaserver;
pub mod services;

pub use error::{Result, StumpError};

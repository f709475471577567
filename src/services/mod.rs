//! Background services and external integrations

pub mod manager;
pub mod rate_limiter;
pub mod stump;

pub use manager::{HealthStatus, Service, ServiceHealth, ServicesManager};
pub use rate_limiter::{RateLimitConfig, WriteRateLimiter};
pub use stump::{
    ApiKeyAuthProvider, EventHandlerConfig, EventMode, StumpAuthProvider, StumpClient,
    StumpEventHandler, StumpMediaServerClientAdapter,
};

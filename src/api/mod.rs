//! Per-content-type facades dispatching to the mock or remote backend.

pub mod gateway;
pub mod mode;
pub mod policy;
pub mod service;

pub use gateway::{ApiGateway, Backends};
pub use mode::{ApiModeConfig, ApiOptions};
pub use policy::{FallbackPolicy, ReadOp};
pub use service::{ContentService, SingletonService};

/// High-level entry point that assembles storage, assets and the API gateway.
pub mod discovery;

pub use discovery::{from_env, open, Portfolio};

//! HTTP inbound adapter exposing the dispatcher and health probes.

pub mod dispatch;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;

pub use error::ApiResult;

//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The transport-neutral operation dispatcher lives under [`dispatch`]; the
//! actix-web front door under [`http`] forwards envelopes to it.

pub mod dispatch;
pub mod http;

//! OpenAPI schema definitions for domain and dispatcher types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The operation tag is not recognised.
    #[schema(rename = "invalid_operation")]
    InvalidOperation,
    /// The payload does not fit the operation.
    #[schema(rename = "invalid_payload")]
    InvalidPayload,
    /// The referenced account or key does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The secure random source failed while minting a key.
    #[schema(rename = "generation_failed")]
    GenerationFailed,
    /// The storage substrate is unreachable or rejected the request.
    #[schema(rename = "store_failure")]
    StoreFailure,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "user not found")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::inbound::dispatch::DispatchRequest`].
#[derive(ToSchema)]
#[schema(as = crate::inbound::dispatch::DispatchRequest)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DispatchRequestSchema {
    /// Operation tag, for example `getUser` or `callAPI`.
    #[schema(example = "getUser")]
    operation: String,
    /// Tag-specific payload: a bare identifier or an object.
    #[schema(example = json!("u1"))]
    payload: serde_json::Value,
}

//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the dispatch endpoint, the health probes, and the
//! schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`],
//! [`DispatchRequestSchema`]) that describe domain types without coupling
//! them to utoipa.
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::dispatch::DispatchResponse;
use crate::inbound::http::schemas::{DispatchRequestSchema, ErrorCodeSchema, ErrorSchema};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledger backend API",
        description = "Tagged operation dispatch over accounts, API keys, and a transaction ledger."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::dispatch::dispatch,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DispatchRequestSchema,
        DispatchResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "dispatch", description = "Tagged operation entry point"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the registered paths and schema field structure.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const REQUEST_SCHEMA_NAME: &str = "crate.inbound.dispatch.DispatchRequest";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/dispatch")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn openapi_registers_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    #[case(ERROR_SCHEMA_NAME, "code")]
    #[case(ERROR_SCHEMA_NAME, "message")]
    #[case(ERROR_SCHEMA_NAME, "traceId")]
    #[case(REQUEST_SCHEMA_NAME, "operation")]
    #[case(REQUEST_SCHEMA_NAME, "payload")]
    fn openapi_schema_has_field(#[case] name: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");
        assert_object_schema_has_field(schema, field);
    }

    #[rstest]
    #[case("400")]
    #[case("404")]
    #[case("500")]
    #[case("503")]
    fn dispatch_error_responses_reference_error_schema(#[case] status: &str) {
        let doc = ApiDoc::openapi();
        let path = doc.paths.paths.get("/api/v1/dispatch").expect("dispatch path");
        let operation = path.post.as_ref().expect("post operation");
        let response = operation
            .responses
            .responses
            .get(status)
            .expect("status documented");
        let rendered = serde_json::to_string(response).expect("response serialises");
        assert!(
            rendered.contains(ERROR_SCHEMA_NAME),
            "{status} should reference {ERROR_SCHEMA_NAME}: {rendered}"
        );
    }
}

//! Dispatch endpoint: the HTTP front door to the operation dispatcher.
//!
//! ```text
//! POST /api/v1/dispatch {"operation":"getUser","payload":"u1"}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::inbound::dispatch::DispatchRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{DispatchRequestSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;

/// Successful dispatch result wrapping the operation's string body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchResponse {
    /// Plain text or JSON text, depending on the operation.
    #[schema(example = "User created successfully")]
    pub body: String,
}

/// JSON extractor configuration turning malformed envelopes into
/// `invalid_payload` errors instead of actix's plain-text 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_payload(format!("malformed dispatch envelope: {err}")).into()
    })
}

/// Execute one tagged operation.
#[utoipa::path(
    post,
    path = "/api/v1/dispatch",
    request_body = DispatchRequestSchema,
    responses(
        (status = 200, description = "Operation succeeded", body = DispatchResponse),
        (status = 400, description = "Unknown operation or malformed payload", body = ErrorSchema),
        (status = 404, description = "Account or key not found", body = ErrorSchema),
        (status = 500, description = "Key generation or internal failure", body = ErrorSchema),
        (status = 503, description = "Storage substrate unavailable", body = ErrorSchema)
    ),
    tags = ["dispatch"],
    operation_id = "dispatch"
)]
#[post("/dispatch")]
pub async fn dispatch(
    state: web::Data<HttpState>,
    request: web::Json<DispatchRequest>,
) -> ApiResult<web::Json<DispatchResponse>> {
    let body = state.dispatcher.dispatch(request.into_inner()).await?;
    Ok(web::Json(DispatchResponse { body }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TRACE_ID_HEADER;
    use crate::middleware::Trace;
    use crate::test_support::memory_services;
    use actix_web::{App, http::StatusCode, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn call(requests: &[Value]) -> Vec<(StatusCode, Value)> {
        let services = memory_services(250);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::from(services)))
                .app_data(json_config())
                .wrap(Trace)
                .service(web::scope("/api/v1").service(dispatch)),
        )
        .await;

        let mut responses = Vec::with_capacity(requests.len());
        for body in requests {
            let req = test::TestRequest::post()
                .uri("/api/v1/dispatch")
                .set_json(body)
                .to_request();
            let res = test::call_service(&app, req).await;
            let status = res.status();
            let json: Value = test::read_body_json(res).await;
            responses.push((status, json));
        }
        responses
    }

    #[rstest]
    #[actix_web::test]
    async fn create_then_get_user_round_trips_through_http() {
        let responses = call(&[
            json!({ "operation": "createUser", "payload": { "user_id": "u1", "email": "a@b.com", "wallet_amount": 5 } }),
            json!({ "operation": "getUser", "payload": "u1" }),
        ])
        .await;

        let [(create_status, create), (get_status, get)] = responses.as_slice() else {
            panic!("expected two responses");
        };
        assert_eq!(*create_status, StatusCode::OK);
        assert_eq!(create, &json!({ "body": "User created successfully" }));
        assert_eq!(*get_status, StatusCode::OK);
        let account: Value =
            serde_json::from_str(get["body"].as_str().expect("string body")).expect("json");
        assert_eq!(
            account,
            json!({ "user_id": "u1", "email": "a@b.com", "wallet_amount": 5.0 })
        );
    }

    #[rstest]
    #[case(json!({ "operation": "deleteUser", "payload": "u1" }), StatusCode::BAD_REQUEST, "invalid_operation")]
    #[case(json!({ "operation": "getUser", "payload": 3 }), StatusCode::BAD_REQUEST, "invalid_payload")]
    #[case(json!({ "payload": "u1" }), StatusCode::BAD_REQUEST, "invalid_payload")]
    #[case(json!({ "operation": "getUser", "payload": "ghost" }), StatusCode::NOT_FOUND, "not_found")]
    #[case(json!({ "operation": "callAPI", "payload": "no-such-key" }), StatusCode::NOT_FOUND, "not_found")]
    #[actix_web::test]
    async fn failures_map_to_status_and_code(
        #[case] request: Value,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let responses = call(&[request]).await;
        let [(actual, body)] = responses.as_slice() else {
            panic!("expected one response");
        };
        assert_eq!(*actual, status);
        assert_eq!(body["code"], code);
        assert!(body["traceId"].is_string());
    }

    #[rstest]
    #[actix_web::test]
    async fn error_responses_echo_trace_header() {
        let services = memory_services(0);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::from(services)))
                .app_data(json_config())
                .wrap(Trace)
                .service(web::scope("/api/v1").service(dispatch)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/dispatch")
            .set_json(json!({ "operation": "getUser", "payload": "ghost" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("trace header");
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["traceId"].as_str(), Some(header.as_str()));
    }
}

//! Front Service: accepts `{"cep": "..."}` and relays the Back Service answer.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Deserialize;
use tracing::Instrument;

use crate::clients::{self, BackServiceClient};
use crate::config::FrontConfig;
use crate::domain::{Cep, TemperatureReport};
use crate::error::{ServiceError, ServiceResult};
use crate::observability::metrics;
use crate::observability::{SpanKind, TraceContext, Tracer};

/// Service name used for spans, logs and metrics.
pub const SERVICE_NAME: &str = "service-a";

/// Handler state. Immutable and shared by every request.
#[derive(Debug, Clone)]
pub struct FrontState {
    back_service: BackServiceClient,
    tracer: Tracer,
}

impl FrontState {
    pub fn new(config: &FrontConfig, tracer: Tracer) -> Result<Self, reqwest::Error> {
        let back_service = BackServiceClient::new(
            clients::http_client()?,
            &config.back_service_url,
            tracer.clone(),
        );
        Ok(Self::from_parts(back_service, tracer))
    }

    pub fn from_parts(back_service: BackServiceClient, tracer: Tracer) -> Self {
        Self { back_service, tracer }
    }
}

/// Every path is served by the same handler.
pub fn router(state: FrontState) -> Router {
    Router::new()
        .route("/", any(handle_cep_request))
        .route("/{*path}", any(handle_cep_request))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct CepRequest {
    #[serde(default)]
    cep: Option<String>,
}

async fn handle_cep_request(
    State(state): State<FrontState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let parent = TraceContext::extract(&headers);
    let mut span = state
        .tracer
        .start_span("handle_cep_request", SpanKind::Server, parent.as_ref());
    span.set_tag("http.method", &method);
    span.set_tag("http.path", uri.path());

    let log_span = tracing::info_span!(
        "request",
        service = SERVICE_NAME,
        trace_id = %span.context().trace_id(),
        span_id = %span.context().span_id(),
    );
    log_span.in_scope(|| tracing::info!(method = %method, path = %uri.path(), "Request received"));

    let result = forecast(&state, span.context(), &method, &body)
        .instrument(log_span.clone())
        .await;

    let response = match result {
        Ok(report) => {
            log_span.in_scope(|| tracing::info!(city = %report.city, "Temperature relayed"));
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            log_span.in_scope(|| tracing::warn!(status = %e.status(), error = %e, "Request failed"));
            span.record_error(&e);
            e.into_response()
        }
    };

    span.set_status(response.status());
    metrics::record_request(SERVICE_NAME, response.status().as_u16(), started);
    response
}

async fn forecast(
    state: &FrontState,
    ctx: &TraceContext,
    method: &Method,
    body: &[u8],
) -> ServiceResult<TemperatureReport> {
    if method != Method::POST {
        return Err(ServiceError::MethodNotAllowed);
    }

    let request = parse_request(body)?;
    let code = request
        .cep
        .filter(|cep| !cep.is_empty())
        .ok_or(ServiceError::CepRequired)?;
    let cep = Cep::parse(&code).ok_or(ServiceError::InvalidZipcode)?;

    state
        .back_service
        .fetch_report(&cep, ctx)
        .await
        .map_err(|e| ServiceError::Upstream(e.to_string()))
}

/// Decode the first JSON value of `body`. Trailing bytes and unknown fields
/// are ignored; an empty body or a JSON `null` carries no CEP.
fn parse_request(body: &[u8]) -> ServiceResult<CepRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CepRequest::default());
    }

    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<CepRequest>>();
    match values.next() {
        Some(Ok(request)) => Ok(request.unwrap_or_default()),
        Some(Err(e)) => Err(ServiceError::InvalidBody(e)),
        None => Ok(CepRequest::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_variants() {
        assert_eq!(parse_request(br#"{"cep":"01001000"}"#).unwrap().cep.as_deref(), Some("01001000"));
        assert!(parse_request(b"").unwrap().cep.is_none());
        assert!(parse_request(b"  \n").unwrap().cep.is_none());
        assert!(parse_request(b"{}").unwrap().cep.is_none());
        assert!(parse_request(b"null").unwrap().cep.is_none());
        assert!(parse_request(br#"{"cep":null}"#).unwrap().cep.is_none());
        assert_eq!(
            parse_request(br#"{"cep":"1","other":true}"#).unwrap().cep.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_parse_request_ignores_trailing_data() {
        let request = parse_request(br#"{"cep":"01001000"} trailing"#).unwrap();
        assert_eq!(request.cep.as_deref(), Some("01001000"));
    }

    #[test]
    fn test_parse_request_rejects_bad_json() {
        for body in [&b"{"[..], b"not json", br#"{"cep":123}"#, b"[1,2]"] {
            assert!(
                matches!(parse_request(body), Err(ServiceError::InvalidBody(_))),
                "{:?}",
                String::from_utf8_lossy(body)
            );
        }
    }
}

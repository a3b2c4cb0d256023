//! Back Service: resolves a CEP to a city and its current temperature.

use std::borrow::Cow;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tracing::Instrument;

use crate::clients::{self, LocationClient, WeatherClient, WeatherError};
use crate::config::BackConfig;
use crate::domain::{Cep, TemperatureReport};
use crate::error::{ServiceError, ServiceResult};
use crate::observability::metrics;
use crate::observability::{SpanKind, TraceContext, Tracer};

/// Service name used for spans, logs and metrics.
pub const SERVICE_NAME: &str = "service-b";

const CEP_PREFIX: &str = "/cep/";

/// Handler state. Immutable and shared by every request.
#[derive(Debug, Clone)]
pub struct BackState {
    locations: LocationClient,
    weather: WeatherClient,
    tracer: Tracer,
}

impl BackState {
    pub fn new(config: &BackConfig, tracer: Tracer) -> Result<Self, reqwest::Error> {
        let http = clients::http_client()?;
        let locations = LocationClient::new(http.clone(), &config.location_api_url, tracer.clone());
        let weather = WeatherClient::new(
            http,
            &config.weather_api_url,
            config.weather_api_key.clone(),
            tracer.clone(),
        );
        Ok(Self::from_parts(locations, weather, tracer))
    }

    pub fn from_parts(locations: LocationClient, weather: WeatherClient, tracer: Tracer) -> Self {
        Self {
            locations,
            weather,
            tracer,
        }
    }
}

/// `/cep/` and everything below it; the code is the rest of the path.
pub fn router(state: BackState) -> Router {
    Router::new()
        .route("/cep/", any(handle_cep_request))
        .route("/cep/{*code}", any(handle_cep_request))
        .with_state(state)
}

async fn handle_cep_request(
    State(state): State<BackState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
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

    let code = path_code(uri.path());
    let result = lookup(&state, span.context(), &method, &code)
        .instrument(log_span.clone())
        .await;

    let response = match result {
        Ok(report) => {
            log_span.in_scope(|| {
                tracing::info!(city = %report.city, temp_c = report.temp_c, "Temperature resolved")
            });
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

/// The code segment of `path`, percent-decoded. A remainder that does not
/// decode to UTF-8 is returned raw and fails validation.
fn path_code(path: &str) -> Cow<'_, str> {
    let raw = path.strip_prefix(CEP_PREFIX).unwrap_or_default();
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Validate, resolve the city, then its temperature. Strictly sequential.
async fn lookup(
    state: &BackState,
    ctx: &TraceContext,
    method: &Method,
    code: &str,
) -> ServiceResult<TemperatureReport> {
    if method != Method::GET {
        return Err(ServiceError::MethodNotAllowed);
    }

    let cep = Cep::parse(code).ok_or(ServiceError::InvalidZipcode)?;

    let city = state.locations.fetch_city(&cep, ctx).await.map_err(|e| {
        tracing::warn!(cep = %cep, error = %e, "Can not find zipcode");
        ServiceError::ZipcodeNotFound(e)
    })?;

    let celsius = state.weather.fetch_celsius(&city, ctx).await.map_err(|e| {
        tracing::warn!(city = %city, error = %e, "Can not find temperature for location");
        match e {
            WeatherError::MissingApiKey => ServiceError::MissingApiKey,
            other => ServiceError::Upstream(other.to_string()),
        }
    })?;

    Ok(TemperatureReport::from_celsius(city, celsius))
}

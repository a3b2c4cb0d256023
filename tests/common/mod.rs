//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    routing::any,
    Router,
};
use tokio::net::TcpListener;

use cep_weather::config::{BackConfig, FrontConfig, ServiceConfig};
use cep_weather::observability::{InMemoryReporter, TraceContext, Tracer};
use cep_weather::{HttpServer, ServiceRole};

pub const DIRECTORY_OK: &str = r#"{"cep":"01001-000","logradouro":"Praça da Sé","localidade":"São Paulo","uf":"SP"}"#;
pub const WEATHER_OK: &str = r#"{"location":{"name":"Sao Paulo"},"current":{"temp_c":25.5,"temp_f":77.9}}"#;
pub const TEST_API_KEY: &str = "test-key";
pub const INBOUND_TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
pub const INBOUND_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
pub const INBOUND_SPAN_ID: &str = "00f067aa0ba902b7";

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A local address with nothing listening on it.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Test HTTP client; bypasses any proxy configured in the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// One request seen by a mock API.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path_and_query: String,
    pub headers: HeaderMap,
}

impl Recorded {
    pub fn trace_context(&self) -> Option<TraceContext> {
        TraceContext::extract(&self.headers)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Recorded>>>);

impl Recorder {
    fn push(&self, request: Recorded) {
        self.0.lock().unwrap().push(request);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// A running mock API answering every request on `route` with a fixed reply.
pub struct MockApi {
    pub addr: SocketAddr,
    pub recorder: Recorder,
}

impl MockApi {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn mock_api(route: &str, status: StatusCode, body: &str) -> MockApi {
    let recorder = Recorder::default();
    let seen = recorder.clone();
    let body = body.to_string();

    let router = Router::new().route(
        route,
        any(move |uri: Uri, headers: HeaderMap| {
            let seen = seen.clone();
            let body = body.clone();
            async move {
                seen.push(Recorded {
                    path_and_query: uri
                        .path_and_query()
                        .map(|p| p.to_string())
                        .unwrap_or_default(),
                    headers,
                });
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }),
    );

    MockApi {
        addr: serve(router).await,
        recorder,
    }
}

/// Mock of the postal-code directory API.
pub async fn directory_api(status: StatusCode, body: &str) -> MockApi {
    mock_api("/ws/{cep}/json/", status, body).await
}

/// Mock of the weather API.
pub async fn weather_api(status: StatusCode, body: &str) -> MockApi {
    mock_api("/v1/current.json", status, body).await
}

pub fn recording_tracer(service: &str) -> (Tracer, Arc<InMemoryReporter>) {
    let reporter = Arc::new(InMemoryReporter::new());
    (Tracer::new(service, reporter.clone()), reporter)
}

/// A running Back Service wired to mock APIs.
pub struct BackHarness {
    pub addr: SocketAddr,
    pub directory: MockApi,
    pub weather: MockApi,
    pub spans: Arc<InMemoryReporter>,
}

impl BackHarness {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn start_back(directory: MockApi, weather: MockApi, api_key: Option<&str>) -> BackHarness {
    let (tracer, spans) = recording_tracer("service-b");
    let config = ServiceConfig {
        back: BackConfig {
            bind_address: "127.0.0.1:0".to_string(),
            location_api_url: directory.url(),
            weather_api_url: weather.url(),
            weather_api_key: api_key.map(str::to_string),
        },
        ..Default::default()
    };
    let server = HttpServer::new(ServiceRole::Back, &config, tracer).unwrap();

    BackHarness {
        addr: serve(server.router()).await,
        directory,
        weather,
        spans,
    }
}

/// The happy-path Back Service.
pub async fn start_healthy_back() -> BackHarness {
    start_back(
        directory_api(StatusCode::OK, DIRECTORY_OK).await,
        weather_api(StatusCode::OK, WEATHER_OK).await,
        Some(TEST_API_KEY),
    )
    .await
}

/// Front Service router pointing at `back_service_url`.
pub fn front_server(back_service_url: &str) -> (HttpServer, Arc<InMemoryReporter>) {
    let (tracer, spans) = recording_tracer("service-a");
    let config = ServiceConfig {
        front: FrontConfig {
            bind_address: "127.0.0.1:0".to_string(),
            back_service_url: back_service_url.to_string(),
        },
        ..Default::default()
    };
    (HttpServer::new(ServiceRole::Front, &config, tracer).unwrap(), spans)
}

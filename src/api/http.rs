//! HTTP API server
//!
//! The gateway's consumer surface: cluster observation routes backed by
//! the coordination state, clock routes, and the leader-routed file
//! relay. Observation handlers only read published state, so they answer
//! without waiting on any probe.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::cluster::{LeaderInfo, NodeRegistry};
use crate::config::{ApiConfig, FilesConfig};
use crate::error::{Error, Result};
use crate::files::{FileProxy, Upstream};
use crate::state::CoordinationState;

/// Shared application state
pub struct AppState {
    /// Coordination state written by the scheduler
    pub coordination: Arc<CoordinationState>,
    /// Registered nodes in priority order
    pub registry: Arc<NodeRegistry>,
    /// File relay, present when the files section is enabled
    pub files: Option<FileProxy>,
    /// Daemon start time, for uptime reporting
    pub started_at: Instant,
}

/// HTTP API server
pub struct HttpServer {
    config: ApiConfig,
    max_upload_bytes: usize,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(
        config: ApiConfig,
        files: FilesConfig,
        coordination: Arc<CoordinationState>,
        registry: Arc<NodeRegistry>,
    ) -> Result<Self> {
        let proxy = if files.enabled {
            Some(FileProxy::new(
                coordination.clone(),
                Duration::from_secs(files.request_timeout_secs),
            )?)
        } else {
            None
        };

        let state = Arc::new(AppState {
            coordination,
            registry,
            files: proxy,
            started_at: Instant::now(),
        });

        Ok(Self {
            config,
            max_upload_bytes: files.max_upload_bytes,
            state,
        })
    }

    /// Create the router
    fn create_router(state: Arc<AppState>, cors_enabled: bool, max_upload_bytes: usize) -> Router {
        let mut router = Router::new()
            // Gateway and cluster observation
            .route("/health", get(handle_health))
            .route("/status", get(handle_status))
            .route("/cluster", get(handle_cluster))
            .route("/cluster/liveness", get(handle_liveness))
            .route("/cluster/leader", get(handle_leader))
            // Logical clocks
            .route("/clocks", get(handle_clocks))
            .route("/clocks/send", post(handle_clock_send))
            // File operations, relayed to the leader
            .route("/files", get(handle_file_list))
            .route(
                "/files/upload",
                post(handle_file_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
            )
            .route("/files/download", get(handle_file_download))
            .route("/files/delete", post(handle_file_delete))
            .route("/files/stats", get(handle_file_stats))
            .with_state(state);

        if cors_enabled {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("HTTP API disabled");
            return Ok(());
        }

        let app = Self::create_router(
            self.state.clone(),
            self.config.cors_enabled,
            self.max_upload_bytes,
        );
        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("HTTP API listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

// ============ Payloads ============

/// Gateway status
#[derive(Debug, Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    nodes_total: usize,
    nodes_alive: Option<usize>,
    leader: LeaderInfo,
    participants: Vec<String>,
}

/// One row of the joined cluster view
#[derive(Debug, Serialize)]
struct ClusterNode {
    address: String,
    priority: usize,
    alive: Option<bool>,
}

/// Registry joined with the latest liveness round
#[derive(Debug, Serialize)]
struct ClusterResponse {
    leader: LeaderInfo,
    probed_at: Option<DateTime<Utc>>,
    nodes: Vec<ClusterNode>,
}

/// Body of POST /clocks/send
#[derive(Debug, Deserialize)]
struct SendRequest {
    from: String,
    to: String,
}

/// Result of an applied message event
#[derive(Debug, Serialize)]
struct SendResponse {
    from: String,
    to: String,
    counter: u64,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    name: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============ Handlers ============

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "healthy": true }))
}

async fn handle_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let leader = state.coordination.leader().await;
    let liveness = state.coordination.liveness().await;
    let participants = state
        .coordination
        .clocks()
        .snapshot()
        .await
        .into_keys()
        .collect();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        nodes_total: state.registry.len(),
        nodes_alive: liveness.as_ref().map(|snapshot| snapshot.alive_count()),
        leader,
        participants,
    })
}

async fn handle_cluster(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let leader = state.coordination.leader().await;
    let liveness = state.coordination.liveness().await;

    let nodes = state
        .registry
        .nodes()
        .iter()
        .map(|node| ClusterNode {
            address: node.address.clone(),
            priority: node.priority,
            alive: liveness
                .as_ref()
                .and_then(|snapshot| snapshot.is_alive(&node.address)),
        })
        .collect();

    Json(ClusterResponse {
        leader,
        probed_at: liveness.as_ref().map(|snapshot| snapshot.probed_at),
        nodes,
    })
}

async fn handle_liveness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.coordination.liveness().await)
}

async fn handle_leader(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.coordination.leader().await)
}

async fn handle_clocks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.coordination.clocks().snapshot().await)
}

async fn handle_clock_send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Response {
    match state.coordination.clocks().send(&req.from, &req.to).await {
        Ok(counter) => Json(SendResponse {
            from: req.from,
            to: req.to,
            counter,
        })
        .into_response(),
        Err(error @ Error::UnknownParticipant(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: error.to_string(),
                code: "UNKNOWN_PARTICIPANT".to_string(),
            }),
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: error.to_string(),
                code: "INTERNAL".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn handle_file_list(State(state): State<Arc<AppState>>) -> Response {
    let proxy = match file_proxy(&state) {
        Ok(proxy) => proxy,
        Err(response) => return response,
    };
    match proxy.list().await {
        Ok(upstream) => relay_response(upstream),
        Err(error) => relay_error(error),
    }
}

async fn handle_file_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let proxy = match file_proxy(&state) {
        Ok(proxy) => proxy,
        Err(response) => return response,
    };
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    match proxy.upload(content_type, body).await {
        Ok(upstream) => relay_response(upstream),
        Err(error) => relay_error(error),
    }
}

async fn handle_file_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Response {
    let proxy = match file_proxy(&state) {
        Ok(proxy) => proxy,
        Err(response) => return response,
    };
    match proxy.download(&query.name).await {
        Ok(upstream) => relay_response(upstream),
        Err(error) => relay_error(error),
    }
}

async fn handle_file_delete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Response {
    let proxy = match file_proxy(&state) {
        Ok(proxy) => proxy,
        Err(response) => return response,
    };
    match proxy.delete(&query.name).await {
        Ok(upstream) => relay_response(upstream),
        Err(error) => relay_error(error),
    }
}

async fn handle_file_stats(State(state): State<Arc<AppState>>) -> Response {
    let proxy = match file_proxy(&state) {
        Ok(proxy) => proxy,
        Err(response) => return response,
    };
    match proxy.stats().await {
        Ok(upstream) => relay_response(upstream),
        Err(error) => relay_error(error),
    }
}

// ============ Helpers ============

fn file_proxy(state: &AppState) -> std::result::Result<&FileProxy, Response> {
    state.files.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "file relay is disabled".to_string(),
                code: "FILES_DISABLED".to_string(),
            }),
        )
            .into_response()
    })
}

/// Pass the leader's answer through, status and body unchanged
fn relay_response(upstream: Upstream) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    match upstream.content_type {
        Some(content_type) => {
            (status, [(header::CONTENT_TYPE, content_type)], upstream.body).into_response()
        }
        None => (status, upstream.body).into_response(),
    }
}

fn relay_error(error: Error) -> Response {
    let (status, code) = match &error {
        Error::NoLeader => (StatusCode::SERVICE_UNAVAILABLE, "NO_LEADER"),
        _ => (StatusCode::BAD_GATEWAY, "FORWARD_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::LivenessSnapshot;
    use std::collections::HashMap;

    async fn api_for(
        coordination: Arc<CoordinationState>,
        addresses: &[&str],
        files_enabled: bool,
    ) -> String {
        let registry = Arc::new(NodeRegistry::new(
            &addresses
                .iter()
                .map(|address| address.to_string())
                .collect::<Vec<_>>(),
        ));
        let files = if files_enabled {
            Some(FileProxy::new(coordination.clone(), Duration::from_secs(2)).unwrap())
        } else {
            None
        };
        let state = Arc::new(AppState {
            coordination,
            registry,
            files,
            started_at: Instant::now(),
        });
        let app = HttpServer::create_router(state, true, 1024 * 1024);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fresh_state() -> Arc<CoordinationState> {
        Arc::new(CoordinationState::new(&["A".to_string(), "B".to_string()]))
    }

    async fn get_json(url: &str) -> serde_json::Value {
        reqwest::get(url)
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_status_before_any_round() {
        let base = api_for(fresh_state(), &["127.0.0.1:8001", "127.0.0.1:8002"], false).await;

        let health = get_json(&format!("{}/health", base)).await;
        assert_eq!(health["healthy"], true);

        let status = get_json(&format!("{}/status", base)).await;
        assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(status["nodes_total"], 2);
        assert!(status["nodes_alive"].is_null());
        assert!(status["leader"]["address"].is_null());
        assert_eq!(status["participants"][0], "A");
        assert_eq!(status["participants"][1], "B");
    }

    #[tokio::test]
    async fn test_cluster_view_joins_registry_with_snapshot() {
        let state = fresh_state();
        state
            .publish_liveness(LivenessSnapshot {
                probed_at: Utc::now(),
                nodes: HashMap::from([
                    ("127.0.0.1:8001".to_string(), true),
                    ("127.0.0.1:8002".to_string(), false),
                ]),
            })
            .await;
        state
            .publish_leader(LeaderInfo {
                name: Some("Current Leader: 8001".to_string()),
                address: Some("127.0.0.1:8001".to_string()),
            })
            .await;
        let base = api_for(state, &["127.0.0.1:8001", "127.0.0.1:8002"], false).await;

        let cluster = get_json(&format!("{}/cluster", base)).await;
        assert_eq!(cluster["leader"]["address"], "127.0.0.1:8001");
        assert!(!cluster["probed_at"].is_null());
        assert_eq!(cluster["nodes"][0]["address"], "127.0.0.1:8001");
        assert_eq!(cluster["nodes"][0]["priority"], 0);
        assert_eq!(cluster["nodes"][0]["alive"], true);
        assert_eq!(cluster["nodes"][1]["alive"], false);
    }

    #[tokio::test]
    async fn test_clock_routes_apply_and_reject() {
        let base = api_for(fresh_state(), &["127.0.0.1:8001"], false).await;
        let client = reqwest::Client::new();

        let clocks = get_json(&format!("{}/clocks", base)).await;
        assert_eq!(clocks["A"], 0);
        assert_eq!(clocks["B"], 0);

        let response = client
            .post(format!("{}/clocks/send", base))
            .json(&serde_json::json!({ "from": "A", "to": "B" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let applied: serde_json::Value = response.json().await.unwrap();
        assert_eq!(applied["to"], "B");
        assert_eq!(applied["counter"], 1);

        let clocks = get_json(&format!("{}/clocks", base)).await;
        assert_eq!(clocks["B"], 1);

        let rejected = client
            .post(format!("{}/clocks/send", base))
            .json(&serde_json::json!({ "from": "A", "to": "C" }))
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 400);
        let body: serde_json::Value = rejected.json().await.unwrap();
        assert_eq!(body["code"], "UNKNOWN_PARTICIPANT");
    }

    #[tokio::test]
    async fn test_file_routes_answer_503_without_leader() {
        let base = api_for(fresh_state(), &["127.0.0.1:8001"], true).await;

        let response = reqwest::get(format!("{}/files", base)).await.unwrap();
        assert_eq!(response.status().as_u16(), 503);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "NO_LEADER");
    }

    #[tokio::test]
    async fn test_file_routes_relay_the_leader_answer() {
        let storage = Router::new()
            .route("/files", get(|| async { Json(vec!["a.txt"]) }))
            .route(
                "/upload",
                post(|| async { (StatusCode::FORBIDDEN, "not the leader") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let storage_addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, storage).await.unwrap();
        });

        let state = fresh_state();
        state
            .publish_leader(LeaderInfo {
                name: Some(format!("Current Leader: {}", storage_addr)),
                address: Some(storage_addr.clone()),
            })
            .await;
        let base = api_for(state, &[storage_addr.as_str()], true).await;

        let listing = reqwest::get(format!("{}/files", base)).await.unwrap();
        assert_eq!(listing.status().as_u16(), 200);
        let names: Vec<String> = listing.json().await.unwrap();
        assert_eq!(names, vec!["a.txt"]);

        let rejected = reqwest::Client::new()
            .post(format!("{}/files/upload", base))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 403);
        assert_eq!(rejected.text().await.unwrap(), "not the leader");
    }

    #[tokio::test]
    async fn test_file_routes_answer_503_when_disabled() {
        let base = api_for(fresh_state(), &["127.0.0.1:8001"], false).await;

        let response = reqwest::get(format!("{}/files", base)).await.unwrap();
        assert_eq!(response.status().as_u16(), 503);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "FILES_DISABLED");
    }

    #[tokio::test]
    async fn test_download_requires_a_name() {
        let base = api_for(fresh_state(), &["127.0.0.1:8001"], true).await;

        let response = reqwest::get(format!("{}/files/download", base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }
}

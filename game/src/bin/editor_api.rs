use std::{
    env,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use cup_shuffle::editor_api::{EditorApiError, EditorSession};
use cup_shuffle::playtest::ShuffleLogic;
use cup_shuffle::settings::SettingsStore;
use engine::editor::{
    EditorManifest, EditorSnapshot, EditorTimeline, FramesRequest, SeekRequest, StepRequest,
};

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<EditorSession>>,
}

impl AppState {
    fn new(session: EditorSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    fn session(&self) -> MutexGuard<'_, EditorSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/manifest", get(manifest))
        .route("/api/agent/state", get(agent_state))
        .route("/api/agent/timeline", get(agent_timeline))
        .route("/api/agent/step", post(agent_step))
        .route("/api/agent/rewind", post(agent_rewind))
        .route("/api/agent/forward", post(agent_forward))
        .route("/api/agent/seek", post(agent_seek))
        .route("/api/agent/reset", post(agent_reset))
        .with_state(state)
        .layer(cors)
}

fn resolve_editor_api_addr<F>(mut get_env: F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(addr) = get_env("CUP_SHUFFLE_EDITOR_API_ADDR").and_then(|v| v.parse().ok()) {
        return addr;
    }

    if let Some(port) = get_env("CUP_SHUFFLE_EDITOR_API_PORT").and_then(|v| v.parse::<u16>().ok())
    {
        return SocketAddr::from(([127, 0, 0, 1], port));
    }

    SocketAddr::from(([127, 0, 0, 1], 4000))
}

fn resolve_seed<F>(mut get_env: F) -> u64
where
    F: FnMut(&str) -> Option<String>,
{
    get_env("CUP_SHUFFLE_EDITOR_SEED")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

async fn health() -> &'static str {
    "ok"
}

async fn manifest(State(state): State<AppState>) -> Json<EditorManifest> {
    Json(state.session().manifest())
}

async fn agent_state(State(state): State<AppState>) -> Json<EditorSnapshot> {
    Json(state.session().state())
}

async fn agent_timeline(State(state): State<AppState>) -> Json<EditorTimeline> {
    Json(state.session().timeline())
}

async fn agent_step(
    State(state): State<AppState>,
    Json(payload): Json<StepRequest>,
) -> Result<Json<EditorSnapshot>, (StatusCode, String)> {
    let snapshot = state.session().step(&payload.action_id);
    match snapshot {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err @ EditorApiError::UnknownActionId(_)) => {
            Err((StatusCode::BAD_REQUEST, err.to_string()))
        }
    }
}

async fn agent_rewind(
    State(state): State<AppState>,
    Json(payload): Json<FramesRequest>,
) -> Json<EditorSnapshot> {
    Json(state.session().rewind(payload.frames))
}

async fn agent_forward(
    State(state): State<AppState>,
    Json(payload): Json<FramesRequest>,
) -> Json<EditorSnapshot> {
    Json(state.session().forward(payload.frames))
}

async fn agent_seek(
    State(state): State<AppState>,
    Json(payload): Json<SeekRequest>,
) -> Json<EditorSnapshot> {
    Json(state.session().seek(payload.frame))
}

async fn agent_reset(State(state): State<AppState>) -> Json<EditorSnapshot> {
    Json(state.session().reset())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cup_shuffle::telemetry::init_from_env();

    let settings = SettingsStore::from_env().load();
    let seed = resolve_seed(|k| env::var(k).ok());
    let game = ShuffleLogic::new(seed).with_settings(settings);
    let app = router(AppState::new(EditorSession::with_logic(game)));

    let addr = resolve_editor_api_addr(|k| env::var(k).ok());
    tracing::info!(%addr, seed, "editor api listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind editor api on {addr}"))?;

    axum::serve(listener, app)
        .await
        .context("serve editor api")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        router(AppState::new(EditorSession::new(0)))
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[test]
    fn resolve_editor_api_addr_defaults_to_4000() {
        let addr = resolve_editor_api_addr(|_| None);
        assert_eq!(addr, "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn resolve_editor_api_addr_prefers_explicit_addr() {
        let addr = resolve_editor_api_addr(|k| match k {
            "CUP_SHUFFLE_EDITOR_API_ADDR" => Some("127.0.0.1:4555".to_string()),
            _ => None,
        });
        assert_eq!(addr, "127.0.0.1:4555".parse().unwrap());
    }

    #[test]
    fn resolve_editor_api_addr_accepts_port_env() {
        let addr = resolve_editor_api_addr(|k| match k {
            "CUP_SHUFFLE_EDITOR_API_PORT" => Some("4556".to_string()),
            _ => None,
        });
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4556)));
    }

    #[test]
    fn resolve_editor_api_addr_ignores_invalid_addr_but_uses_valid_port() {
        let addr = resolve_editor_api_addr(|k| match k {
            "CUP_SHUFFLE_EDITOR_API_ADDR" => Some("not-an-addr".to_string()),
            "CUP_SHUFFLE_EDITOR_API_PORT" => Some("4557".to_string()),
            _ => None,
        });
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4557)));
    }

    #[test]
    fn resolve_seed_falls_back_to_zero() {
        assert_eq!(resolve_seed(|_| None), 0);
        assert_eq!(resolve_seed(|_| Some("nope".to_string())), 0);
        assert_eq!(resolve_seed(|_| Some(" 42 ".to_string())), 42);
    }

    #[tokio::test]
    async fn step_route_advances_and_rejects_unknown_ids() {
        let app = app();

        let (status, body) = post_json(&app, "/api/agent/step", r#"{"actionId":"start"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let snapshot: EditorSnapshot = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot.frame, 1);

        let (status, body) = post_json(&app, "/api/agent/step", r#"{"actionId":"shuffle"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "unknown actionId: shuffle");

        let (status, body) = post_json(&app, "/api/agent/rewind", r#"{"frames":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        let snapshot: EditorSnapshot = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot.frame, 0);
    }

    #[tokio::test]
    async fn manifest_route_lists_actions() {
        let response = app()
            .oneshot(Request::get("/api/manifest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let manifest: EditorManifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(manifest.title, "Cup Shuffle");
        assert!(manifest.actions.iter().any(|a| a.id == "guess1"));
    }
}

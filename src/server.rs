//! HTTP surface
//!
//! Serves the front page, the admin placeholder and the JSON API for mood,
//! activity log and call-sheep.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{
    LengthRequired, MethodNotAllowed, PayloadTooLarge, Reject, UnsupportedMediaType,
};
use warp::{Filter, Rejection, Reply};

use crate::activity::{BoundedLog, LogEntry};
use crate::call::{CallRequest, CallSheep, CALL_ACK};
use crate::config::ServiceConfig;
use crate::mood::MoodBoard;
use crate::notify::{CommandNotifier, Notifier};
use crate::storage::{DocumentStore, JsonFileStore, StorageError};

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: u64 = 16 * 1024;

const ADMIN_PAGE: &str = r#"<html>
<head><title>羊羊後台</title></head>
<body style="font-family: sans-serif; padding: 50px; text-align: center;">
    <h1>🐑 羊羊秘密後台</h1>
    <p>目前暫時僅供觀察數據，未來會加入更多控制開關！</p>
    <a href="/">回到前台</a>
</body>
</html>
"#;

/// Storage failure surfaced to the client as a 500.
#[derive(Debug)]
struct StorageFailure(StorageError);

impl Reject for StorageFailure {}

fn storage_rejection(e: StorageError) -> Rejection {
    warp::reject::custom(StorageFailure(e))
}

/// Everything the handlers need, shared across requests.
pub struct AppState {
    log: Arc<BoundedLog>,
    call: CallSheep,
    mood: MoodBoard,
    index_path: PathBuf,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        index_path: PathBuf,
    ) -> Self {
        let log = Arc::new(BoundedLog::new(Arc::clone(&store)));
        Self {
            call: CallSheep::new(Arc::clone(&log), notifier),
            mood: MoodBoard::new(store),
            log,
            index_path,
        }
    }

    /// File-backed storage and the command-line notifier, as configured.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(&config.base_dir)),
            Arc::new(CommandNotifier::new(config.notifier.clone())),
            config.index_path(),
        )
    }

    pub fn log(&self) -> &BoundedLog {
        &self.log
    }
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// All routes, with rejections turned into JSON error responses.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and_then(handle_index);

    let admin = warp::path!("admin")
        .and(warp::get())
        .map(|| warp::reply::html(ADMIN_PAGE));

    let get_mood = warp::path!("api" / "mood")
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and_then(handle_get_mood);

    let get_logs = warp::path!("api" / "logs")
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and_then(handle_get_logs);

    let append_log = warp::path!("api" / "logs")
        .and(warp::post())
        .and(json_body::<LogEntry>())
        .and(with_state(Arc::clone(&state)))
        .and_then(handle_append_log);

    let call_sheep = warp::path!("api" / "call_sheep")
        .and(warp::post())
        .and(json_body::<CallRequest>())
        .and(with_state(state))
        .and_then(handle_call_sheep);

    index
        .or(admin)
        .or(get_mood)
        .or(get_logs)
        .or(append_log)
        .or(call_sheep)
        .recover(handle_rejection)
        .with(warp::log("sheep_status::http"))
}

async fn handle_index(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    match tokio::fs::read_to_string(&state.index_path).await {
        Ok(page) => Ok(warp::reply::html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("front page missing at {}", state.index_path.display());
            Err(warp::reject::not_found())
        }
        Err(e) => Err(storage_rejection(StorageError::IoError(e))),
    }
}

async fn handle_get_mood(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let mood = state.mood.current().await.map_err(storage_rejection)?;
    Ok(warp::reply::json(&mood))
}

async fn handle_get_logs(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let entries = state.log.list().await.map_err(storage_rejection)?;
    Ok(warp::reply::json(&entries))
}

async fn handle_append_log(entry: LogEntry, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    state.log.append(entry).await.map_err(storage_rejection)?;
    Ok(warp::reply::json(&json!({"status": "ok"})))
}

async fn handle_call_sheep(req: CallRequest, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    // The alert outcome is already logged by the orchestrator; the caller
    // only learns whether the call was recorded.
    state.call.call(req).await.map_err(storage_rejection)?;
    Ok(warp::reply::json(&json!({"status": "ok", "message": CALL_ACK})))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(StorageFailure(e)) = err.find() {
        log::error!("storage failure: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected a JSON body".to_string())
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "expected a JSON body".to_string())
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        log::error!("unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "detail": detail})),
        status,
    ))
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    config: &ServiceConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let state = Arc::new(AppState::from_config(config));
    let (addr, server): (SocketAddr, _) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(config.bind_addr(), shutdown)?;

    log::info!("🐑 status service listening on http://{}", addr);
    log::info!("data directory: {}", config.base_dir.display());

    server.await;
    Ok(())
}

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use server_api::{get_question, list_questions, submit_answers, ApiContext, QuestionStore};
use shared::{
    domain::{PublicQuestion, QuestionId},
    error::{ApiError, ErrorCode},
    protocol::{SubmissionOutcome, SubmitRequest},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, Settings};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let store = load_question_store(&settings)?;
    let state = AppState {
        api: ApiContext::new(store),
    };
    let app = build_router(Arc::new(state), cors_layer(&settings.allowed_origins));

    let addr: SocketAddr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|error| {
        error!(%addr, %error, "error starting server");
        error
    })?;
    info!(%addr, origins = ?settings.allowed_origins, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_question_store(settings: &Settings) -> anyhow::Result<QuestionStore> {
    let store = match &settings.questions_path {
        Some(path) => QuestionStore::from_json_file(path)
            .with_context(|| format!("failed to load question bank '{}'", path.display()))?,
        None => QuestionStore::builtin(),
    };
    let source = settings
        .questions_path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());
    info!(questions = store.len(), %source, "question bank loaded");
    Ok(store)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/questions", get(http_list_questions))
        .route("/api/questions/:id", get(http_get_question))
        .route("/api/submit", post(http_submit))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_questions(State(state): State<Arc<AppState>>) -> Json<Vec<PublicQuestion>> {
    Json(list_questions(&state.api))
}

async fn http_get_question(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<PublicQuestion> {
    let Path(id) = id.map_err(|rejection| {
        (
            rejection.status(),
            Json(ApiError::validation(rejection.body_text())),
        )
    })?;

    let question = get_question(&state.api, QuestionId(id)).map_err(|err| {
        debug!(question_id = id, "question not found");
        api_error(err)
    })?;
    Ok(Json(question))
}

async fn http_submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<SubmissionOutcome> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected submission body");
        (
            rejection.status(),
            Json(ApiError::validation(rejection.body_text())),
        )
    })?;

    Ok(Json(submit_answers(&state.api, &request.answers)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

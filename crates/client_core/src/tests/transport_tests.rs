use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    routing::{get, post},
    Json, Router,
};
use server_api::{get_question, list_questions, submit_answers, ApiContext, QuestionStore};
use shared::{error::ApiError, protocol::SubmitRequest};
use tokio::net::TcpListener;

async fn spawn_quiz_server() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let api = ApiContext::new(QuestionStore::builtin());

    let quiz = Router::new()
        .route(
            "/api/questions",
            get(|State(api): State<ApiContext>| async move { Json(list_questions(&api)) }),
        )
        .route(
            "/api/questions/:id",
            get(
                |State(api): State<ApiContext>, Path(id): Path<i64>| async move {
                    get_question(&api, QuestionId(id))
                        .map(Json)
                        .map_err(|err| (HttpStatus::NOT_FOUND, Json(err)))
                },
            ),
        )
        .route(
            "/api/submit",
            post(
                |State(api): State<ApiContext>, Json(req): Json<SubmitRequest>| async move {
                    Json(submit_answers(&api, &req.answers))
                },
            ),
        )
        .with_state(api);

    let app = Router::new()
        .nest("/prefix", quiz.clone())
        .merge(quiz)
        .route(
            "/broken/api/questions",
            get(|| async {
                (
                    HttpStatus::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new(
                        shared::error::ErrorCode::Internal,
                        "bank unavailable",
                    )),
                )
            }),
        )
        .route("/garbage/api/questions", get(|| async { "not json" }));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn fetches_public_questions_in_order() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let questions = backend.fetch_questions().await.expect("questions");
    assert_eq!(questions.len(), 10);
    assert_eq!(questions[0].id, QuestionId(1));
    assert!(questions[0].has_option("string"));
}

#[tokio::test]
async fn keeps_base_path_prefix() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&format!("{server_url}/prefix")).expect("backend");
    assert!(backend.base_url().path().ends_with("/prefix/"));

    let questions = backend.fetch_questions().await.expect("questions");
    assert_eq!(questions.len(), 10);
}

#[tokio::test]
async fn fetch_question_maps_404_to_not_found() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let question = backend.fetch_question(QuestionId(2)).await.expect("found");
    assert_eq!(question.options[2], "55");

    let err = backend
        .fetch_question(QuestionId(404))
        .await
        .expect_err("missing");
    assert_eq!(err, ClientError::NotFound(QuestionId(404)));
}

#[tokio::test]
async fn submit_round_trips_through_grading() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&server_url).expect("backend");

    let mut answers = AnswerMap::new();
    answers.insert(QuestionId(1), "string".to_string());
    answers.insert(QuestionId(2), "52".to_string());

    let outcome = backend.submit_answers(&answers).await.expect("outcome");
    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.total_questions, 10);
    assert_eq!(outcome.results[1].user_answer.as_deref(), Some("52"));
    assert_eq!(outcome.results[1].correct_answer, "55");
}

#[tokio::test]
async fn error_status_surfaces_server_message() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&format!("{server_url}/broken")).expect("backend");

    let err = backend.fetch_questions().await.expect_err("500");
    assert_eq!(
        err,
        ClientError::MalformedResponse {
            status: 500,
            message: "bank unavailable".to_string(),
        }
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let server_url = spawn_quiz_server().await.expect("spawn server");
    let backend = HttpQuizBackend::new(&format!("{server_url}/garbage")).expect("backend");

    let err = backend.fetch_questions().await.expect_err("bad body");
    assert!(matches!(err, ClientError::MalformedResponse { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpQuizBackend::new(&format!("http://{addr}")).expect("backend");
    let err = backend.fetch_questions().await.expect_err("refused");
    assert!(err.is_transient(), "expected network error, got {err:?}");
}

#[test]
fn rejects_unusable_server_urls() {
    assert!(matches!(
        HttpQuizBackend::new("not a url"),
        Err(ClientError::InvalidServerUrl { .. })
    ));
    assert!(matches!(
        HttpQuizBackend::new("mailto:quiz@example.com"),
        Err(ClientError::InvalidServerUrl { .. })
    ));
}

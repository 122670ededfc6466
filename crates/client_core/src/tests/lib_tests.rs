use super::*;
use async_trait::async_trait;
use server_api::{grade, QuestionStore};
use shared::domain::{PublicQuestion, QuestionId};
use shared::protocol::SubmissionOutcome;
use tokio::sync::broadcast::error::RecvError;

/// In-process backend grading against the builtin bank.
struct StubBackend {
    store: QuestionStore,
    failing_loads: Mutex<u32>,
    failing_submits: Mutex<u32>,
    submit_delay: Duration,
    submissions: Mutex<Vec<AnswerMap>>,
}

impl StubBackend {
    fn new() -> Self {
        Self {
            store: QuestionStore::builtin(),
            failing_loads: Mutex::new(0),
            failing_submits: Mutex::new(0),
            submit_delay: Duration::ZERO,
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn failing_loads(self, count: u32) -> Self {
        Self {
            failing_loads: Mutex::new(count),
            ..self
        }
    }

    fn failing_submits(self, count: u32) -> Self {
        Self {
            failing_submits: Mutex::new(count),
            ..self
        }
    }

    fn with_submit_delay(self, submit_delay: Duration) -> Self {
        Self {
            submit_delay,
            ..self
        }
    }

    async fn submissions(&self) -> Vec<AnswerMap> {
        self.submissions.lock().await.clone()
    }
}

async fn take_failure(counter: &Mutex<u32>) -> bool {
    let mut remaining = counter.lock().await;
    if *remaining == 0 {
        return false;
    }
    *remaining -= 1;
    true
}

#[async_trait]
impl QuizBackend for StubBackend {
    async fn fetch_questions(&self) -> Result<Vec<PublicQuestion>, ClientError> {
        if take_failure(&self.failing_loads).await {
            return Err(ClientError::Network("connection refused".into()));
        }
        Ok(self.store.list_all().iter().map(PublicQuestion::from).collect())
    }

    async fn fetch_question(&self, id: QuestionId) -> Result<PublicQuestion, ClientError> {
        self.store
            .get_by_id(id)
            .map(PublicQuestion::from)
            .map_err(|_| ClientError::NotFound(id))
    }

    async fn submit_answers(&self, answers: &AnswerMap) -> Result<SubmissionOutcome, ClientError> {
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        self.submissions.lock().await.push(answers.clone());
        if take_failure(&self.failing_submits).await {
            return Err(ClientError::MalformedResponse {
                status: 503,
                message: "try again".into(),
            });
        }
        Ok(grade(&self.store, answers))
    }
}

fn settings(duration_secs: u32) -> SessionSettings {
    SessionSettings {
        duration_secs,
        tick_period: Duration::from_secs(1),
    }
}

async fn wait_for_phase(events: &mut broadcast::Receiver<SessionEvent>, phase: SessionPhase) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::PhaseChanged(seen)) if seen == phase => return,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => panic!("event channel closed before {phase:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn load_starts_quiz_and_countdown() {
    let controller =
        QuizController::new(Arc::new(StubBackend::new()), settings(900)).expect("controller");

    assert_eq!(controller.load().await, Ok(SessionPhase::InProgress));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.questions().len(), 10);
    assert_eq!(snapshot.remaining_secs(), Some(900));
    assert!(controller.countdown_active().await);

    assert!(matches!(
        controller.load().await,
        Err(SessionError::InvalidState { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_once_per_period() {
    let controller =
        QuizController::new(Arc::new(StubBackend::new()), settings(900)).expect("controller");
    let mut events = controller.subscribe();
    controller.load().await.expect("load");

    let mut ticks = Vec::new();
    while ticks.len() < 3 {
        if let Ok(SessionEvent::Tick { remaining_secs }) = events.recv().await {
            ticks.push(remaining_secs);
        }
    }
    assert_eq!(ticks, vec![899, 898, 897]);
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_submits_accumulated_answers() {
    let backend = Arc::new(StubBackend::new());
    let controller = QuizController::new(backend.clone(), settings(900)).expect("controller");
    let mut events = controller.subscribe();

    controller.load().await.expect("load");
    controller.select_answer("string").await.expect("select");

    wait_for_phase(&mut events, SessionPhase::Submitting).await;
    wait_for_phase(&mut events, SessionPhase::Results).await;

    let submissions = backend.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].get(&QuestionId(1)).map(String::as_str),
        Some("string")
    );

    let snapshot = controller.snapshot().await;
    let outcome = snapshot.outcome().expect("results");
    assert_eq!(outcome.score, 1);
    assert_eq!(snapshot.remaining_secs(), Some(0));
    assert!(!controller.countdown_active().await);
}

#[tokio::test(start_paused = true)]
async fn explicit_submit_stops_countdown() {
    let backend = Arc::new(StubBackend::new());
    let controller = QuizController::new(backend.clone(), settings(900)).expect("controller");
    controller.load().await.expect("load");

    controller.go_to_question(2).await.expect("navigate");
    controller.select_answer("extends").await.expect("select");
    assert_eq!(controller.submit().await, Ok(SessionPhase::Results));
    assert!(!controller.countdown_active().await);

    tokio::time::sleep(Duration::from_secs(1_000)).await;
    assert_eq!(backend.submissions().await.len(), 1);
    assert_eq!(controller.phase().await, SessionPhase::Results);
}

#[tokio::test(start_paused = true)]
async fn concurrent_submits_send_one_request() {
    let backend = Arc::new(StubBackend::new().with_submit_delay(Duration::from_millis(200)));
    let controller = QuizController::new(backend.clone(), settings(900)).expect("controller");
    controller.load().await.expect("load");

    let (first, second) = tokio::join!(controller.submit(), controller.submit());
    let results = [first, second];
    assert_eq!(
        results
            .iter()
            .filter(|r| **r == Ok(SessionPhase::Results))
            .count(),
        1
    );
    assert!(results.contains(&Err(SessionError::SubmitInFlight)));
    assert_eq!(backend.submissions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn load_failure_is_retryable() {
    let backend = Arc::new(StubBackend::new().failing_loads(1));
    let controller = QuizController::new(backend, settings(900)).expect("controller");
    let mut events = controller.subscribe();

    assert_eq!(controller.load().await, Ok(SessionPhase::Failed));
    assert!(!controller.countdown_active().await);
    assert!(matches!(
        events.recv().await,
        Ok(SessionEvent::Error(message)) if message.contains("connection refused")
    ));

    assert_eq!(controller.retry().await, Ok(SessionPhase::InProgress));
    assert!(controller.countdown_active().await);
}

#[tokio::test(start_paused = true)]
async fn submit_failure_is_retryable_with_same_answers() {
    let backend = Arc::new(StubBackend::new().failing_submits(1));
    let controller = QuizController::new(backend.clone(), settings(900)).expect("controller");
    controller.load().await.expect("load");
    controller.select_answer("string").await.expect("select");

    assert_eq!(controller.submit().await, Ok(SessionPhase::Failed));
    let snapshot = controller.snapshot().await;
    assert_eq!(
        snapshot.failure().map(|(stage, _)| stage),
        Some(FailedStage::Submit)
    );
    assert!(!controller.countdown_active().await);

    assert_eq!(controller.retry().await, Ok(SessionPhase::Results));
    let submissions = backend.submissions().await;
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0], submissions[1]);
    assert_eq!(
        controller.snapshot().await.outcome().map(|o| o.score),
        Some(1)
    );
}

#[tokio::test(start_paused = true)]
async fn restart_after_results_begins_a_fresh_quiz() {
    let controller =
        QuizController::new(Arc::new(StubBackend::new()), settings(30)).expect("controller");
    controller.load().await.expect("load");
    controller.select_answer("int").await.expect("select");
    controller.submit().await.expect("submit");

    assert_eq!(controller.restart().await, Ok(SessionPhase::InProgress));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.answered_count(), 0);
    assert_eq!(snapshot.remaining_secs(), Some(30));
    assert!(controller.countdown_active().await);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_ends_countdown_task() {
    let backend = Arc::new(StubBackend::new());
    let controller = QuizController::new(backend.clone(), settings(3)).expect("controller");
    controller.load().await.expect("load");
    drop(controller);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(backend.submissions().await.is_empty());
}

#[test]
fn zero_settings_are_rejected() {
    let zero_period = SessionSettings {
        duration_secs: 5,
        tick_period: Duration::ZERO,
    };
    assert_eq!(
        QuizController::new(Arc::new(StubBackend::new()), zero_period).err(),
        Some(SettingsError::ZeroTickPeriod)
    );
    assert_eq!(
        QuizController::new(Arc::new(StubBackend::new()), settings(0)).err(),
        Some(SettingsError::ZeroDuration)
    );
    assert!(SessionSettings::default().validate().is_ok());
}

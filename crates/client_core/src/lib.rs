use std::{sync::Arc, time::Duration};

use shared::protocol::AnswerMap;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod error;
pub mod session;
pub mod transport;

pub use error::ClientError;
pub use session::{
    format_clock, FailedStage, QuizProgress, QuizSession, RetryAction, SessionError,
    SessionPhase, SessionState, Tick, DEFAULT_QUIZ_DURATION_SECS,
};
pub use transport::{HttpQuizBackend, QuizBackend};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub duration_secs: u32,
    pub tick_period: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_QUIZ_DURATION_SECS,
            tick_period: Duration::from_secs(1),
        }
    }
}

impl SessionSettings {
    /// A zero duration would start a quiz that is already over, and a zero
    /// period cannot drive a timer.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.duration_secs == 0 {
            return Err(SettingsError::ZeroDuration);
        }
        if self.tick_period.is_zero() {
            return Err(SettingsError::ZeroTickPeriod);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("quiz duration must be at least one second")]
    ZeroDuration,
    #[error("countdown tick period must be non-zero")]
    ZeroTickPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    Tick { remaining_secs: u32 },
    Error(String),
}

/// Drives a [`QuizSession`] against a [`QuizBackend`] and owns its countdown.
///
/// At most one countdown task exists per controller. It runs only while the
/// session is `InProgress` and submits on its own when time runs out.
pub struct QuizController {
    backend: Arc<dyn QuizBackend>,
    session: Mutex<QuizSession>,
    countdown: Mutex<Option<JoinHandle<()>>>,
    tick_period: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl QuizController {
    pub fn new(
        backend: Arc<dyn QuizBackend>,
        settings: SessionSettings,
    ) -> Result<Arc<Self>, SettingsError> {
        settings.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            backend,
            session: Mutex::new(QuizSession::new(settings.duration_secs)),
            countdown: Mutex::new(None),
            tick_period: settings.tick_period,
            events,
        }))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> QuizSession {
        self.session.lock().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    pub async fn countdown_active(&self) -> bool {
        self.countdown
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Fetches the question list. Ends in `InProgress` or `Failed`.
    pub async fn load(self: &Arc<Self>) -> Result<SessionPhase, SessionError> {
        let phase = self.phase().await;
        if phase != SessionPhase::Loading {
            return Err(SessionError::InvalidState {
                action: "load questions",
                phase,
            });
        }

        let fetched = self.backend.fetch_questions().await;
        if let Err(err) = &fetched {
            warn!(%err, transient = err.is_transient(), "failed to load questions");
            self.emit(SessionEvent::Error(err.to_string()));
        }

        let (phase, count) = {
            let mut session = self.session.lock().await;
            session.questions_loaded(fetched)?;
            (session.phase(), session.questions().len())
        };
        self.emit(SessionEvent::PhaseChanged(phase));

        if phase == SessionPhase::InProgress {
            info!(questions = count, "quiz started");
            self.start_countdown().await;
        }
        Ok(phase)
    }

    pub async fn select_answer(&self, option: &str) -> Result<(), SessionError> {
        self.session.lock().await.select_answer(option)
    }

    pub async fn go_to_question(&self, index: usize) -> Result<usize, SessionError> {
        self.session.lock().await.go_to_question(index)
    }

    pub async fn next(&self) -> Result<usize, SessionError> {
        self.session.lock().await.next()
    }

    pub async fn previous(&self) -> Result<usize, SessionError> {
        self.session.lock().await.previous()
    }

    /// Submits the accumulated answers. A second call while one is in flight
    /// fails with [`SessionError::SubmitInFlight`] and sends nothing.
    pub async fn submit(self: &Arc<Self>) -> Result<SessionPhase, SessionError> {
        let answers = self.session.lock().await.submit()?;
        self.stop_countdown().await;
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Submitting));
        Ok(self.deliver(answers).await)
    }

    /// Retries whichever step failed: reloads questions or resubmits answers.
    pub async fn retry(self: &Arc<Self>) -> Result<SessionPhase, SessionError> {
        let action = self.session.lock().await.retry()?;
        match action {
            RetryAction::Reload => {
                info!("retrying question load");
                self.emit(SessionEvent::PhaseChanged(SessionPhase::Loading));
                self.load().await
            }
            RetryAction::Resubmit(answers) => {
                info!("retrying submission");
                self.emit(SessionEvent::PhaseChanged(SessionPhase::Submitting));
                Ok(self.deliver(answers).await)
            }
        }
    }

    /// Starts a fresh quiz after results have been shown.
    pub async fn restart(self: &Arc<Self>) -> Result<SessionPhase, SessionError> {
        self.session.lock().await.restart()?;
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Loading));
        self.load().await
    }

    async fn deliver(&self, answers: AnswerMap) -> SessionPhase {
        info!(answered = answers.len(), "submitting answers");
        let result = self.backend.submit_answers(&answers).await;
        match &result {
            Ok(outcome) => info!(
                score = outcome.score,
                total = outcome.total_questions,
                "submission graded"
            ),
            Err(err) => {
                warn!(%err, transient = err.is_transient(), "submission failed");
                self.emit(SessionEvent::Error(err.to_string()));
            }
        }

        let phase = {
            let mut session = self.session.lock().await;
            if let Err(err) = session.submission_finished(result) {
                warn!(%err, "dropping submission result");
            }
            session.phase()
        };
        self.emit(SessionEvent::PhaseChanged(phase));
        phase
    }

    async fn start_countdown(self: &Arc<Self>) {
        let mut slot = self.countdown.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let controller = Arc::downgrade(self);
        let period = self.tick_period;
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                if controller.on_tick().await {
                    break;
                }
            }
        }));
        debug!(period = ?self.tick_period, "countdown started");
    }

    async fn stop_countdown(&self) {
        if let Some(handle) = self.countdown.lock().await.take() {
            handle.abort();
            debug!("countdown stopped");
        }
    }

    /// Returns true once the countdown task should exit.
    async fn on_tick(&self) -> bool {
        let tick = self.session.lock().await.tick();
        match tick {
            Tick::Running(remaining_secs) => {
                self.emit(SessionEvent::Tick { remaining_secs });
                false
            }
            Tick::Expired(answers) => {
                info!("time is up; submitting automatically");
                self.emit(SessionEvent::Tick { remaining_secs: 0 });
                // Detach rather than abort: this task performs the submission.
                drop(self.countdown.lock().await.take());
                self.emit(SessionEvent::PhaseChanged(SessionPhase::Submitting));
                self.deliver(answers).await;
                true
            }
            Tick::Idle => true,
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

//! Client-side quiz session state machine.
//!
//! `Loading -> InProgress -> Submitting -> Results`, with `Failed` reachable
//! from `Loading` and `Submitting`. The machine performs no I/O: callers feed
//! it fetch and submit results and it tells them what to send next.

use std::mem;

use shared::{
    domain::{PublicQuestion, QuestionId},
    protocol::{AnswerMap, SubmissionOutcome},
};
use thiserror::Error;

use crate::error::ClientError;

pub const DEFAULT_QUIZ_DURATION_SECS: u32 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    InProgress,
    Submitting,
    Results,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Load,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {phase:?}")]
    InvalidState {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("'{option}' is not an option of question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option: String,
    },
    #[error("answers are already being submitted")]
    SubmitInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub questions: Vec<PublicQuestion>,
    pub position: usize,
    pub answers: AnswerMap,
    pub remaining_secs: u32,
}

impl QuizProgress {
    fn current(&self) -> &PublicQuestion {
        &self.questions[self.position]
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.questions.len().saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    InProgress(QuizProgress),
    Submitting(QuizProgress),
    Results {
        progress: QuizProgress,
        outcome: SubmissionOutcome,
    },
    Failed {
        stage: FailedStage,
        cause: String,
        progress: Option<QuizProgress>,
    },
}

/// Result of one countdown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Running(u32),
    /// Time ran out; the session is now `Submitting` these answers.
    Expired(AnswerMap),
    Idle,
}

/// What the caller must do after a successful [`QuizSession::retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    Reload,
    Resubmit(AnswerMap),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    duration_secs: u32,
    state: SessionState,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(DEFAULT_QUIZ_DURATION_SECS)
    }
}

impl QuizSession {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            state: SessionState::Loading,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.state {
            SessionState::Loading => SessionPhase::Loading,
            SessionState::InProgress(_) => SessionPhase::InProgress,
            SessionState::Submitting(_) => SessionPhase::Submitting,
            SessionState::Results { .. } => SessionPhase::Results,
            SessionState::Failed { .. } => SessionPhase::Failed,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn questions_loaded(
        &mut self,
        result: Result<Vec<PublicQuestion>, ClientError>,
    ) -> Result<(), SessionError> {
        self.expect_phase("load questions", SessionPhase::Loading)?;

        self.state = match result {
            Ok(questions) if questions.is_empty() => SessionState::Failed {
                stage: FailedStage::Load,
                cause: ClientError::EmptyQuestionBank.to_string(),
                progress: None,
            },
            Ok(questions) => SessionState::InProgress(QuizProgress {
                questions,
                position: 0,
                answers: AnswerMap::new(),
                remaining_secs: self.duration_secs,
            }),
            Err(err) => SessionState::Failed {
                stage: FailedStage::Load,
                cause: err.to_string(),
                progress: None,
            },
        };
        Ok(())
    }

    /// Records `option` for the current question, replacing any earlier choice.
    pub fn select_answer(&mut self, option: &str) -> Result<(), SessionError> {
        let progress = self.in_progress_mut("select an answer")?;
        let question = progress.current();
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                question_id: question.id,
                option: option.to_string(),
            });
        }
        let id = question.id;
        progress.answers.insert(id, option.to_string());
        Ok(())
    }

    /// Moves to `index`, clamped to the question range.
    pub fn go_to_question(&mut self, index: usize) -> Result<usize, SessionError> {
        let progress = self.in_progress_mut("navigate")?;
        progress.position = progress.clamp(index);
        Ok(progress.position)
    }

    pub fn next(&mut self) -> Result<usize, SessionError> {
        let progress = self.in_progress_mut("navigate")?;
        progress.position = progress.clamp(progress.position.saturating_add(1));
        Ok(progress.position)
    }

    pub fn previous(&mut self) -> Result<usize, SessionError> {
        let progress = self.in_progress_mut("navigate")?;
        progress.position = progress.position.saturating_sub(1);
        Ok(progress.position)
    }

    /// Advances the countdown by one second. Reaching zero submits.
    pub fn tick(&mut self) -> Tick {
        let SessionState::InProgress(progress) = &mut self.state else {
            return Tick::Idle;
        };
        progress.remaining_secs = progress.remaining_secs.saturating_sub(1);
        if progress.remaining_secs > 0 {
            return Tick::Running(progress.remaining_secs);
        }
        match self.begin_submit() {
            Ok(answers) => Tick::Expired(answers),
            Err(_) => Tick::Idle,
        }
    }

    /// Moves to `Submitting` and hands back the answers to send.
    pub fn submit(&mut self) -> Result<AnswerMap, SessionError> {
        match self.phase() {
            SessionPhase::InProgress => self.begin_submit(),
            SessionPhase::Submitting => Err(SessionError::SubmitInFlight),
            phase => Err(SessionError::InvalidState {
                action: "submit",
                phase,
            }),
        }
    }

    pub fn submission_finished(
        &mut self,
        result: Result<SubmissionOutcome, ClientError>,
    ) -> Result<(), SessionError> {
        let progress = match mem::replace(&mut self.state, SessionState::Loading) {
            SessionState::Submitting(progress) => progress,
            other => {
                self.state = other;
                return Err(SessionError::InvalidState {
                    action: "finish a submission",
                    phase: self.phase(),
                });
            }
        };

        self.state = match result {
            Ok(outcome) => SessionState::Results { progress, outcome },
            Err(err) => SessionState::Failed {
                stage: FailedStage::Submit,
                cause: err.to_string(),
                progress: Some(progress),
            },
        };
        Ok(())
    }

    pub fn retry(&mut self) -> Result<RetryAction, SessionError> {
        match mem::replace(&mut self.state, SessionState::Loading) {
            SessionState::Failed {
                stage: FailedStage::Submit,
                progress: Some(progress),
                ..
            } => {
                let answers = progress.answers.clone();
                self.state = SessionState::Submitting(progress);
                Ok(RetryAction::Resubmit(answers))
            }
            SessionState::Failed { .. } => Ok(RetryAction::Reload),
            other => {
                self.state = other;
                Err(SessionError::InvalidState {
                    action: "retry",
                    phase: self.phase(),
                })
            }
        }
    }

    /// Discards a finished quiz and starts over from `Loading`.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.expect_phase("restart", SessionPhase::Results)?;
        self.state = SessionState::Loading;
        Ok(())
    }

    pub fn progress(&self) -> Option<&QuizProgress> {
        match &self.state {
            SessionState::InProgress(progress) | SessionState::Submitting(progress) => {
                Some(progress)
            }
            SessionState::Results { progress, .. } => Some(progress),
            SessionState::Failed { progress, .. } => progress.as_ref(),
            SessionState::Loading => None,
        }
    }

    pub fn questions(&self) -> &[PublicQuestion] {
        self.progress()
            .map(|progress| progress.questions.as_slice())
            .unwrap_or_default()
    }

    pub fn current_question(&self) -> Option<&PublicQuestion> {
        self.progress().map(QuizProgress::current)
    }

    pub fn position(&self) -> Option<usize> {
        self.progress().map(|progress| progress.position)
    }

    pub fn answers(&self) -> Option<&AnswerMap> {
        self.progress().map(|progress| &progress.answers)
    }

    pub fn answer_for(&self, id: QuestionId) -> Option<&str> {
        self.answers()
            .and_then(|answers| answers.get(&id))
            .map(String::as_str)
    }

    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.answer_for(id).is_some()
    }

    pub fn answered_count(&self) -> usize {
        self.answers().map_or(0, AnswerMap::len)
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.progress().map(|progress| progress.remaining_secs)
    }

    pub fn format_remaining(&self) -> String {
        format_clock(self.remaining_secs().unwrap_or(self.duration_secs))
    }

    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        match &self.state {
            SessionState::Results { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<(FailedStage, &str)> {
        match &self.state {
            SessionState::Failed { stage, cause, .. } => Some((*stage, cause.as_str())),
            _ => None,
        }
    }

    fn begin_submit(&mut self) -> Result<AnswerMap, SessionError> {
        match mem::replace(&mut self.state, SessionState::Loading) {
            SessionState::InProgress(progress) => {
                let answers = progress.answers.clone();
                self.state = SessionState::Submitting(progress);
                Ok(answers)
            }
            other => {
                self.state = other;
                Err(SessionError::InvalidState {
                    action: "submit",
                    phase: self.phase(),
                })
            }
        }
    }

    fn in_progress_mut(&mut self, action: &'static str) -> Result<&mut QuizProgress, SessionError> {
        let phase = self.phase();
        match &mut self.state {
            SessionState::InProgress(progress) => Ok(progress),
            _ => Err(SessionError::InvalidState { action, phase }),
        }
    }

    fn expect_phase(&self, action: &'static str, expected: SessionPhase) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState { action, phase })
        }
    }
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

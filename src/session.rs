//! Execution session state machine for one open problem.
//!
//! A session owns the code buffer and the selected language, and lets at
//! most one judge request be in flight. Starting a request hands out a
//! [`PendingRequest`] that snapshots the buffer; the only way back to idle
//! is to hand that token to [`ExecutionSession::complete`].

use std::fmt;

use crate::error::SessionError;
use crate::normalize::{ExecutionKind, ExecutionResult};
use crate::types::{RunRequest, SubmitRequest, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Running(RequestId),
    Submitting(RequestId),
    /// Idle after the last request failed.
    Failed(String),
}

impl Phase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Phase::Running(_) | Phase::Submitting(_))
    }

    fn in_flight_id(&self) -> Option<RequestId> {
        match self {
            Phase::Running(id) | Phase::Submitting(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running(id) => write!(f, "running {id}"),
            Phase::Submitting(id) => write!(f, "submitting {id}"),
            Phase::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Run(RunRequest),
    Submit(SubmitRequest),
}

/// Snapshot of the buffer taken when a request is issued. Deliberately not
/// `Clone`: each one completes exactly once.
#[derive(Debug)]
pub struct PendingRequest {
    id: RequestId,
    problem_id: String,
    body: RequestBody,
}

impl PendingRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn kind(&self) -> ExecutionKind {
        match self.body {
            RequestBody::Run(_) => ExecutionKind::Run,
            RequestBody::Submit(_) => ExecutionKind::Submit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The session was closed while the request was in flight.
    Discarded,
}

#[derive(Debug)]
pub struct ExecutionSession {
    problem_id: String,
    code: String,
    language: Option<String>,
    phase: Phase,
    last_result: Option<ExecutionResult>,
    closed: bool,
    next_request: u64,
}

impl ExecutionSession {
    pub fn new(problem_id: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            code: String::new(),
            language: None,
            phase: Phase::Idle,
            last_result: None,
            closed: false,
            next_request: 1,
        }
    }

    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Edits never cancel an in-flight request; it keeps its snapshot.
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn select_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    pub fn begin_run(&mut self, custom_input: Option<String>) -> Result<PendingRequest, SessionError> {
        let language = self.guard()?;
        let body = RequestBody::Run(RunRequest {
            code: self.code.clone(),
            language,
            custom_input: custom_input.filter(|input| !input.is_empty()),
        });
        let id = self.issue();
        self.phase = Phase::Running(id);
        Ok(self.pending(id, body))
    }

    pub fn begin_submit(&mut self, contest_id: Option<String>) -> Result<PendingRequest, SessionError> {
        let language = self.guard()?;
        let body = RequestBody::Submit(SubmitRequest {
            code: self.code.clone(),
            language,
            contest_id: contest_id.filter(|id| !id.is_empty()),
        });
        let id = self.issue();
        self.phase = Phase::Submitting(id);
        Ok(self.pending(id, body))
    }

    /// Applies the outcome of `pending` and returns to idle. Outcomes that
    /// arrive after [`close`](Self::close) are discarded.
    pub fn complete(
        &mut self,
        pending: PendingRequest,
        outcome: Result<&ExecutionResult, String>,
    ) -> Completion {
        if self.closed {
            tracing::debug!(request = %pending.id, "session closed, discarding result");
            return Completion::Discarded;
        }
        if self.phase.in_flight_id() != Some(pending.id) {
            tracing::warn!(request = %pending.id, phase = %self.phase, "completion does not match in-flight request");
            return Completion::Discarded;
        }

        self.phase = match outcome {
            Ok(result) => {
                self.last_result = Some(result.clone());
                Phase::Idle
            }
            Err(message) => Phase::Failed(message),
        };
        Completion::Applied
    }

    /// Replaces the buffer with a previous submission. Refused mid-flight so
    /// the buffer cannot drift from the snapshot being judged.
    pub fn load_submission(&mut self, submission: &Submission) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if self.phase.is_in_flight() {
            return Err(SessionError::Busy {
                phase: self.phase.clone(),
            });
        }
        self.code = submission.code.clone();
        self.language = Some(submission.language.clone()).filter(|l| !l.is_empty());
        Ok(())
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    fn guard(&self) -> Result<String, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if self.phase.is_in_flight() {
            return Err(SessionError::Busy {
                phase: self.phase.clone(),
            });
        }
        self.language
            .clone()
            .filter(|language| !language.is_empty())
            .ok_or(SessionError::NoLanguage)
    }

    fn issue(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }

    fn pending(&self, id: RequestId, body: RequestBody) -> PendingRequest {
        PendingRequest {
            id,
            problem_id: self.problem_id.clone(),
            body,
        }
    }
}

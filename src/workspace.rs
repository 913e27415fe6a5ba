//! Run/submit controller for one open problem.
//!
//! Methods take `&self` and the session lock is never held across an
//! `.await`, so the buffer can be edited while a request is in flight on the
//! same task. The in-flight request keeps the snapshot it was issued with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use metrics::counter;

use crate::error::{ApiError, SessionError, WorkspaceError};
use crate::languages::LanguageCatalog;
use crate::normalize::{ExecutionKind, ExecutionResult};
use crate::portal::Portal;
use crate::session::{Completion, ExecutionSession, PendingRequest, Phase, RequestBody};
use crate::transport::Transport;
use crate::types::{Problem, Submission, SubmissionQuery};

pub struct Workspace<T> {
    portal: Portal<T>,
    problem: Problem,
    catalog: LanguageCatalog,
    bookmarked: AtomicBool,
    session: Mutex<ExecutionSession>,
}

impl<T: Transport> Workspace<T> {
    /// Loads the problem and the language catalog, then seeds the buffer
    /// with the starter code and the preferred available language.
    pub async fn open(portal: Portal<T>, problem_id: &str) -> Result<Self, ApiError> {
        let problem = portal.problem(problem_id).await?;
        let catalog = portal.languages().await?;

        let mut session = ExecutionSession::new(problem_id);
        session.set_code(problem.starter_code.clone());
        if let Some(key) = catalog.default_key(portal.preferred_languages()) {
            session.select_language(key);
        }

        tracing::info!(problem = problem_id, languages = catalog.len(), "workspace opened");
        Ok(Self {
            bookmarked: AtomicBool::new(problem.is_bookmarked),
            portal,
            problem,
            catalog,
            session: Mutex::new(session),
        })
    }

    fn session(&self) -> MutexGuard<'_, ExecutionSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    /// The id the workspace was opened with.
    pub fn problem_id(&self) -> String {
        self.session().problem_id().to_string()
    }

    pub fn code(&self) -> String {
        self.session().code().to_string()
    }

    pub fn language(&self) -> Option<String> {
        self.session().language().map(str::to_string)
    }

    pub fn phase(&self) -> Phase {
        self.session().phase().clone()
    }

    pub fn last_result(&self) -> Option<ExecutionResult> {
        self.session().last_result().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.session().last_error().map(str::to_string)
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked.load(Ordering::Relaxed)
    }

    pub fn set_code(&self, code: impl Into<String>) {
        self.session().set_code(code);
    }

    pub fn select_language(&self, key: impl Into<String>) {
        let key = key.into();
        if !self.catalog.contains(&key) {
            tracing::warn!(language = %key, "language not in catalog, the backend may reject it");
        }
        self.session().select_language(key);
    }

    pub fn load_submission(&self, submission: &Submission) -> Result<(), SessionError> {
        self.session().load_submission(submission)
    }

    /// Runs the buffer against the sample tests, or against `custom_input`.
    /// `Ok(None)` means the workspace was closed before the result arrived.
    pub async fn run(&self, custom_input: Option<String>) -> Result<Option<ExecutionResult>, WorkspaceError> {
        let pending = self.begin(|session| session.begin_run(custom_input))?;
        self.execute(pending).await
    }

    /// Submits the buffer for judging. On success the submission history,
    /// the progress summary and problem statuses are invalidated.
    pub async fn submit(&self, contest_id: Option<String>) -> Result<Option<ExecutionResult>, WorkspaceError> {
        let pending = self.begin(|session| session.begin_submit(contest_id))?;
        self.execute(pending).await
    }

    fn begin(
        &self,
        start: impl FnOnce(&mut ExecutionSession) -> Result<PendingRequest, SessionError>,
    ) -> Result<PendingRequest, SessionError> {
        let mut session = self.session();
        start(&mut session).inspect_err(|e| {
            let reason = match e {
                SessionError::NoLanguage => "no_language",
                SessionError::Busy { .. } => "busy",
                SessionError::Closed => "closed",
            };
            counter!("session_rejections_total", "reason" => reason).increment(1);
            tracing::warn!(problem = session.problem_id(), "request rejected: {}", e);
        })
    }

    async fn execute(&self, pending: PendingRequest) -> Result<Option<ExecutionResult>, WorkspaceError> {
        let client = self.portal.client();
        tracing::info!(problem = pending.problem_id(), request = %pending.id(), kind = ?pending.kind(), "dispatching");

        let outcome = match pending.body() {
            RequestBody::Run(body) => client.run(pending.problem_id(), body).await,
            RequestBody::Submit(body) => client.submit(pending.problem_id(), body).await,
        };

        // The backend has persisted the submission even if this view is gone.
        if pending.kind() == ExecutionKind::Submit && outcome.is_ok() {
            self.portal.cache().invalidate_after_submit();
        }

        let request = pending.id();
        let completion = self
            .session()
            .complete(pending, outcome.as_ref().map_err(ToString::to_string));

        match (outcome, completion) {
            (Ok(result), Completion::Applied) => {
                tracing::info!(
                    request = %request,
                    status = %result.status,
                    passed = result.passed_count,
                    total = result.total_count,
                    "judge result applied"
                );
                Ok(Some(result))
            }
            (Ok(_), Completion::Discarded) => Ok(None),
            (Err(e), _) => Err(e.into()),
        }
    }

    /// Flips the bookmark and returns the new state.
    pub async fn toggle_bookmark(&self) -> Result<bool, ApiError> {
        let target = !self.is_bookmarked();
        let problem_id = self.problem_id();
        self.portal.set_bookmark(&problem_id, target).await?;
        self.bookmarked.store(target, Ordering::Relaxed);
        Ok(target)
    }

    /// Previous submissions for this problem.
    pub async fn history(&self) -> Result<Vec<Submission>, ApiError> {
        let query = SubmissionQuery {
            problem_id: Some(self.problem_id()),
            ..Default::default()
        };
        self.portal.my_submissions(&query).await
    }

    /// Tears the session down; results still in flight are discarded.
    pub fn close(&self) {
        self.session().close();
        tracing::info!(problem = self.session().problem_id(), "workspace closed");
    }
}

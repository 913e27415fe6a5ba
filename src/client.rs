//! Typed endpoints of the practice backend.
//!
//! Every call reads the credential at dispatch, reports auth rejections to
//! the [`AuthSession`], and runs the payload through the envelope adapter,
//! so callers only ever see canonical resource types.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::{Value, json};

use crate::auth::AuthSession;
use crate::envelope::{ResourceKind, adapt, adapt_list, adapt_object};
use crate::error::ApiError;
use crate::languages::LanguageCatalog;
use crate::normalize::{ExecutionKind, ExecutionResult, normalize_execution};
use crate::transport::{ApiRequest, Transport};
use crate::types::{
    Bookmark, Contest, Credential, LeaderboardEntry, PageQuery, Problem, ProblemQuery, Progress,
    RunRequest, SubmitRequest, Submission, SubmissionQuery,
};

pub struct JudgeClient<T> {
    transport: T,
    auth: Arc<AuthSession>,
    prefix: String,
}

impl<T: Transport> JudgeClient<T> {
    pub fn new(transport: T, auth: Arc<AuthSession>, prefix: impl Into<String>) -> Self {
        Self {
            transport,
            auth,
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn dispatch(&self, endpoint: &'static str, request: ApiRequest) -> Result<Value, ApiError> {
        self.exchange(endpoint, request, true).await
    }

    /// Sends `request` with the current credential. With `report_auth`, an
    /// auth rejection expires the credential it carried, or asks for a
    /// login when it carried none.
    async fn exchange(
        &self,
        endpoint: &'static str,
        request: ApiRequest,
        report_auth: bool,
    ) -> Result<Value, ApiError> {
        let lease = self.auth.current();
        let request = request.with_bearer(lease.as_ref().map(|l| l.token.clone()));
        let request_id = request.id.clone();
        let started = Instant::now();

        let result = self.transport.send(request).await.map_err(ApiError::classify);
        histogram!("judge_request_duration_ms", "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(_) => {
                counter!("judge_requests_total", "endpoint" => endpoint, "outcome" => "ok").increment(1);
            }
            Err(ApiError::Unauthorized(message)) => {
                counter!("judge_requests_total", "endpoint" => endpoint, "outcome" => "unauthorized")
                    .increment(1);
                tracing::warn!(id = %request_id, endpoint, "request rejected: {}", message);
                if report_auth {
                    match &lease {
                        Some(lease) => {
                            self.auth.expire(lease);
                        }
                        None => {
                            self.auth.require_login();
                        }
                    }
                }
            }
            Err(e) => {
                counter!("judge_requests_total", "endpoint" => endpoint, "outcome" => "error").increment(1);
                tracing::error!(id = %request_id, endpoint, "request failed: {}", e);
            }
        }

        result
    }

    /// `{prefix}/coding/` followed by the percent-encoded segments.
    fn coding(&self, segments: &[&str]) -> String {
        let path: Vec<_> = segments.iter().map(|segment| urlencoding::encode(segment)).collect();
        format!("{}/coding/{}", self.prefix, path.join("/"))
    }

    /// Logs in and establishes the credential on the shared auth session.
    /// A rejected login leaves the auth session untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        let request = ApiRequest::post(format!("{}/login", self.prefix))
            .with_body(&json!({ "username": username, "password": password }))
            .map_err(ApiError::classify)?;
        let payload = self.exchange("login", request, false).await?;

        let credential: Credential = adapt_object(ResourceKind::Login, &payload);
        if credential.access_token.is_empty() {
            return Err(ApiError::Malformed("login response carries no access token".to_string()));
        }
        self.auth.establish(credential.clone());
        Ok(credential)
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    pub async fn problems(&self, query: &ProblemQuery) -> Result<Vec<Problem>, ApiError> {
        let request = ApiRequest::get(self.coding(&["problems"])).with_query(query);
        let payload = self.dispatch("problems", request).await?;
        Ok(adapt_list::<Problem>(ResourceKind::Problems, &payload)
            .into_iter()
            .map(Problem::redact_hidden)
            .collect())
    }

    pub async fn problem(&self, id: &str) -> Result<Problem, ApiError> {
        let payload = self
            .dispatch("problem", ApiRequest::get(self.coding(&["problems", id])))
            .await?;
        let problem = adapt_object::<Problem>(ResourceKind::Problem, &payload);
        if problem.id.is_empty() {
            return Err(ApiError::Malformed(format!("problem {id} has no id")));
        }
        Ok(problem.redact_hidden())
    }

    pub async fn run(&self, problem_id: &str, body: &RunRequest) -> Result<ExecutionResult, ApiError> {
        let request = ApiRequest::post(self.coding(&["problems", problem_id, "run"]))
            .with_body(body)
            .map_err(ApiError::classify)?;
        let payload = self.dispatch("run", request).await?;
        Ok(normalize_execution(ExecutionKind::Run, &payload))
    }

    pub async fn submit(&self, problem_id: &str, body: &SubmitRequest) -> Result<ExecutionResult, ApiError> {
        let request = ApiRequest::post(self.coding(&["problems", problem_id, "submit"]))
            .with_body(body)
            .map_err(ApiError::classify)?;
        let payload = self.dispatch("submit", request).await?;
        Ok(normalize_execution(ExecutionKind::Submit, &payload))
    }

    /// Raw judge languages resolved to what the backend can run.
    pub async fn languages(&self) -> Result<LanguageCatalog, ApiError> {
        let payload = self.dispatch("languages", ApiRequest::get(self.coding(&["languages"]))).await?;
        let raw = match adapt(ResourceKind::Languages, &payload) {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };
        Ok(LanguageCatalog::resolve(&raw))
    }

    pub async fn bookmarks(&self, query: &PageQuery) -> Result<Vec<Bookmark>, ApiError> {
        let request = ApiRequest::get(self.coding(&["bookmarks"])).with_query(query);
        let payload = self.dispatch("bookmarks", request).await?;
        Ok(adapt_list(ResourceKind::Bookmarks, &payload))
    }

    pub async fn add_bookmark(&self, problem_id: &str) -> Result<(), ApiError> {
        self.dispatch("add_bookmark", ApiRequest::post(self.coding(&["bookmarks", problem_id])))
            .await
            .map(|_| ())
    }

    pub async fn remove_bookmark(&self, problem_id: &str) -> Result<(), ApiError> {
        self.dispatch("remove_bookmark", ApiRequest::delete(self.coding(&["bookmarks", problem_id])))
            .await
            .map(|_| ())
    }

    pub async fn my_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, ApiError> {
        let request = ApiRequest::get(self.coding(&["my-submissions"])).with_query(query);
        let payload = self.dispatch("my_submissions", request).await?;
        Ok(adapt_list(ResourceKind::Submissions, &payload))
    }

    pub async fn submission(&self, id: &str) -> Result<Submission, ApiError> {
        let payload = self
            .dispatch("submission", ApiRequest::get(self.coding(&["my-submissions", id])))
            .await?;
        let submission: Submission = adapt_object(ResourceKind::Submission, &payload);
        if submission.id.is_empty() {
            return Err(ApiError::Malformed(format!("submission {id} has no id")));
        }
        Ok(submission)
    }

    pub async fn my_progress(&self) -> Result<Progress, ApiError> {
        let payload = self.dispatch("my_progress", ApiRequest::get(self.coding(&["my-progress"]))).await?;
        Ok(adapt_object(ResourceKind::Progress, &payload))
    }

    pub async fn contests(&self, query: &PageQuery) -> Result<Vec<Contest>, ApiError> {
        let request = ApiRequest::get(self.coding(&["contests"])).with_query(query);
        let payload = self.dispatch("contests", request).await?;
        Ok(adapt_list(ResourceKind::Contests, &payload))
    }

    pub async fn active_contests(&self) -> Result<Vec<Contest>, ApiError> {
        let payload = self
            .dispatch("active_contests", ApiRequest::get(self.coding(&["contests", "active"])))
            .await?;
        Ok(adapt_list(ResourceKind::Contests, &payload))
    }

    pub async fn contest(&self, id: &str) -> Result<Contest, ApiError> {
        let payload = self
            .dispatch("contest", ApiRequest::get(self.coding(&["contests", id])))
            .await?;
        Ok(adapt_object(ResourceKind::Contest, &payload))
    }

    pub async fn register_for_contest(&self, id: &str, access_code: Option<&str>) -> Result<(), ApiError> {
        let mut request = ApiRequest::post(self.coding(&["contests", id, "register"]));
        if let Some(code) = access_code.filter(|code| !code.is_empty()) {
            request = request
                .with_body(&json!({ "accessCode": code }))
                .map_err(ApiError::classify)?;
        }
        self.dispatch("register_for_contest", request).await.map(|_| ())
    }

    pub async fn contest_leaderboard(
        &self,
        id: &str,
        query: &PageQuery,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let request = ApiRequest::get(self.coding(&["contests", id, "leaderboard"])).with_query(query);
        let payload = self.dispatch("contest_leaderboard", request).await?;
        Ok(adapt_list(ResourceKind::Leaderboard, &payload))
    }

    pub async fn my_contests(&self) -> Result<Vec<Contest>, ApiError> {
        let payload = self.dispatch("my_contests", ApiRequest::get(self.coding(&["my-contests"]))).await?;
        Ok(adapt_list(ResourceKind::Contests, &payload))
    }
}

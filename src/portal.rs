use std::sync::Arc;

use serde::Serialize;

use crate::cache::{Aggregate, CacheKey, QueryCache};
use crate::client::JudgeClient;
use crate::error::ApiError;
use crate::languages::LanguageCatalog;
use crate::transport::Transport;
use crate::types::{
    Bookmark, Contest, PageQuery, Problem, ProblemQuery, Progress, Submission, SubmissionQuery,
};
use crate::workspace::Workspace;

/// Cached read side of the backend shared by every view, and the factory
/// for problem workspaces.
pub struct Portal<T> {
    client: Arc<JudgeClient<T>>,
    cache: Arc<QueryCache>,
    preferred_languages: Arc<[String]>,
}

impl<T> Clone for Portal<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
            preferred_languages: Arc::clone(&self.preferred_languages),
        }
    }
}

fn scope<Q: Serialize>(prefix: &str, query: &Q) -> String {
    format!("{prefix}?{}", serde_json::to_string(query).unwrap_or_default())
}

impl<T: Transport> Portal<T> {
    pub fn new(client: JudgeClient<T>, cache: Arc<QueryCache>, preferred_languages: Vec<String>) -> Self {
        Self {
            client: Arc::new(client),
            cache,
            preferred_languages: preferred_languages.into(),
        }
    }

    pub fn client(&self) -> &JudgeClient<T> {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn preferred_languages(&self) -> &[String] {
        &self.preferred_languages
    }

    pub async fn open_workspace(&self, problem_id: &str) -> Result<Workspace<T>, ApiError> {
        Workspace::open(self.clone(), problem_id).await
    }

    pub async fn problems(&self, query: &ProblemQuery) -> Result<Vec<Problem>, ApiError> {
        let key = CacheKey::new(Aggregate::ProblemStatus, scope("problems", query));
        self.cache.get_or_fetch(key, || self.client.problems(query)).await
    }

    pub async fn problem(&self, id: &str) -> Result<Problem, ApiError> {
        let key = CacheKey::new(Aggregate::ProblemStatus, format!("problem/{id}"));
        self.cache.get_or_fetch(key, || self.client.problem(id)).await
    }

    /// The language list is fetched once and never invalidated.
    pub async fn languages(&self) -> Result<LanguageCatalog, ApiError> {
        let key = CacheKey::whole(Aggregate::Languages);
        self.cache.get_or_fetch(key, || self.client.languages()).await
    }

    pub async fn my_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, ApiError> {
        let key = CacheKey::new(Aggregate::Submissions, scope("submissions", query));
        self.cache.get_or_fetch(key, || self.client.my_submissions(query)).await
    }

    pub async fn my_progress(&self) -> Result<Progress, ApiError> {
        let key = CacheKey::whole(Aggregate::Progress);
        self.cache.get_or_fetch(key, || self.client.my_progress()).await
    }

    pub async fn bookmarks(&self, query: &PageQuery) -> Result<Vec<Bookmark>, ApiError> {
        let key = CacheKey::new(Aggregate::Bookmarks, scope("bookmarks", query));
        self.cache.get_or_fetch(key, || self.client.bookmarks(query)).await
    }

    pub async fn contests(&self, query: &PageQuery) -> Result<Vec<Contest>, ApiError> {
        let key = CacheKey::new(Aggregate::Contests, scope("contests", query));
        self.cache.get_or_fetch(key, || self.client.contests(query)).await
    }

    pub async fn active_contests(&self) -> Result<Vec<Contest>, ApiError> {
        let key = CacheKey::new(Aggregate::Contests, "active");
        self.cache.get_or_fetch(key, || self.client.active_contests()).await
    }

    pub async fn my_contests(&self) -> Result<Vec<Contest>, ApiError> {
        let key = CacheKey::new(Aggregate::Contests, "mine");
        self.cache.get_or_fetch(key, || self.client.my_contests()).await
    }

    pub async fn set_bookmark(&self, problem_id: &str, bookmarked: bool) -> Result<(), ApiError> {
        if bookmarked {
            self.client.add_bookmark(problem_id).await?;
        } else {
            self.client.remove_bookmark(problem_id).await?;
        }
        self.cache.invalidate(Aggregate::Bookmarks);
        self.cache.invalidate(Aggregate::ProblemStatus);
        Ok(())
    }

    pub async fn register_for_contest(&self, contest_id: &str, access_code: Option<&str>) -> Result<(), ApiError> {
        self.client.register_for_contest(contest_id, access_code).await?;
        self.cache.invalidate(Aggregate::Contests);
        Ok(())
    }
}

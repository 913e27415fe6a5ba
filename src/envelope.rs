//! Unwrapping of the backend's response envelopes.
//!
//! The backend answers the same resource as a bare value, as `{data: X}`,
//! as `{items: X}` or under a resource-named key, sometimes nested inside
//! the generic `{success, message, data}` wrapper. Everything here is pure:
//! a payload goes in, the canonical resource shape comes out, and a shape
//! that cannot be recognised yields the empty value instead of an error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Problems,
    Problem,
    Submissions,
    Submission,
    Bookmarks,
    Contests,
    Contest,
    Leaderboard,
    Languages,
    Progress,
    Execution,
    Login,
}

impl ResourceKind {
    pub fn shape(self) -> Shape {
        match self {
            ResourceKind::Problems
            | ResourceKind::Submissions
            | ResourceKind::Bookmarks
            | ResourceKind::Contests
            | ResourceKind::Leaderboard
            | ResourceKind::Languages => Shape::List,
            _ => Shape::Object,
        }
    }

    /// Wrapper paths tried in order when the payload is not already the
    /// resource. Dotted segments descend into nested objects.
    pub fn wrapper_paths(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Problems => &["problems", "items", "data", "data.problems", "data.items"],
            ResourceKind::Submissions => &[
                "submissions",
                "items",
                "data",
                "data.submissions",
                "data.items",
            ],
            ResourceKind::Bookmarks => &["bookmarks", "items", "data", "data.bookmarks"],
            ResourceKind::Contests => &["contests", "items", "data", "data.contests", "data.items"],
            ResourceKind::Leaderboard => &["leaderboard", "items", "data", "data.leaderboard"],
            ResourceKind::Languages => &["data.languages", "languages", "data", "items"],
            ResourceKind::Problem => &["data", "problem", "data.problem"],
            ResourceKind::Submission => &["data", "submission", "data.submission"],
            ResourceKind::Contest => &["data", "contest", "data.contest"],
            ResourceKind::Progress => &["data", "progress", "data.progress"],
            ResourceKind::Execution => &["data", "result", "data.result"],
            ResourceKind::Login => &["data"],
        }
    }

    /// Fields whose presence marks an object as the resource itself rather
    /// than an envelope around it.
    pub fn marker_fields(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Problem | ResourceKind::Submission | ResourceKind::Contest => {
                &["id", "title", "code"]
            }
            ResourceKind::Progress => &["solved", "attempted", "total", "solvedByDifficulty"],
            ResourceKind::Execution => &[
                "testResults",
                "passedCount",
                "totalCount",
                "passedTestCases",
                "totalTestCases",
                "submissionId",
            ],
            ResourceKind::Login => &["accessToken"],
            _ => &[],
        }
    }
}

/// Returns the resource of `kind` carried by `payload`.
pub fn adapt(kind: ResourceKind, payload: &Value) -> Value {
    if matches_shape(kind, payload) {
        return payload.clone();
    }

    for path in kind.wrapper_paths() {
        if let Some(inner) = lookup(payload, path) {
            if matches_shape(kind, inner) {
                return inner.clone();
            }
        }
    }

    tracing::debug!(?kind, "unrecognised payload shape, treating as empty");
    empty(kind)
}

/// Adapts a list payload and decodes each element, skipping the ones that
/// do not decode.
pub fn adapt_list<T: DeserializeOwned>(kind: ResourceKind, payload: &Value) -> Vec<T> {
    let Value::Array(entries) = adapt(kind, payload) else {
        return Vec::new();
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(?kind, index, "skipping malformed entry: {}", e);
                None
            }
        })
        .collect()
}

pub fn adapt_object<T: DeserializeOwned + Default>(kind: ResourceKind, payload: &Value) -> T {
    match serde_json::from_value(adapt(kind, payload)) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!(?kind, "malformed resource, using defaults: {}", e);
            T::default()
        }
    }
}

fn matches_shape(kind: ResourceKind, value: &Value) -> bool {
    match (kind.shape(), value) {
        (Shape::List, Value::Array(_)) => true,
        (Shape::Object, Value::Object(fields)) => {
            kind.marker_fields().iter().any(|f| fields.contains_key(*f))
        }
        _ => false,
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

fn empty(kind: ResourceKind) -> Value {
    match kind.shape() {
        Shape::List => Value::Array(Vec::new()),
        Shape::Object => Value::Object(Map::new()),
    }
}

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use futures_util::future::join_all;
use judge_workspace::{
    ApiError, AuthEvent, AuthSession, HttpTransport, JudgeClient, Portal, QueryCache,
    types::{Credential, PageQuery, RunRequest},
};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::TryRecvError;
use tower_http::trace::TraceLayer;

const TOKEN: &str = "good-token";

#[derive(Clone, Default)]
struct Backend {
    expired: Arc<AtomicBool>,
    solved: Arc<AtomicU32>,
    progress_calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn check(backend: &Backend, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    if backend.expired.load(Ordering::SeqCst) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Session Expired"})),
        ));
    }
    let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if bearer != Some(format!("Bearer {TOKEN}").as_str()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Not Authorized"})),
        ));
    }
    Ok(())
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] != "secret" {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid credentials"})),
        ));
    }
    Ok(Json(json!({
        "success": true,
        "data": {
            "accessToken": TOKEN,
            "user": {"id": "s1", "name": "Ada", "email": "ada@example.com"}
        }
    })))
}

async fn bookmarks(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
    check(&backend, &headers)?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "bookmarks": [
                {"id": "p1", "title": "Sum of Two", "difficulty": "EASY"},
                {"id": "p2", "title": "Graph Walk", "difficulty": "HARD"}
            ],
            "pagination": {"page": 1, "total": 2}
        }
    })))
}

async fn languages(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
    check(&backend, &headers)?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "languages": [
                {"id": 71, "name": "Python (3.8.1)"},
                {"id": 63, "name": "JavaScript (Node.js 12.14.0)"},
                {"id": 44, "name": "Executable"}
            ]
        }
    })))
}

async fn problem(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    check(&backend, &headers)?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "id": id,
            "title": "Sum of Two",
            "difficulty": "EASY",
            "starterCode": "// start here",
            "testCases": [
                {"id": "t1", "input": "1 2", "output": "3", "isSample": true},
                {"id": "t2", "input": "40 2", "output": "42", "isHidden": true}
            ]
        }
    })))
}

async fn run(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    check(&backend, &headers)?;
    *backend.last_body.lock().unwrap() = Some(body);
    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "Wrong Answer",
            "passedCount": 1,
            "totalCount": 2,
            "testResults": [
                {"testCase": 1, "passed": true, "time": 3, "memory": 512,
                 "status": {"id": 3, "description": "Accepted"}},
                {"testCase": 2, "passed": false, "time": 4, "memory": 512,
                 "status": {"id": 4, "description": "Wrong Answer"},
                 "expectedOutput": "42", "actualOutput": "41"}
            ]
        }
    })))
}

async fn submit(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    check(&backend, &headers)?;
    *backend.last_body.lock().unwrap() = Some(body);
    backend.solved.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({
        "success": true,
        "data": {
            "submissionId": "sub-1",
            "status": "ACCEPTED",
            "passedTestCases": 2,
            "totalTestCases": 2,
            "testResults": [
                {"testCase": 1, "passed": true, "time": 3, "memory": 512},
                {"testCase": 2, "passed": true, "time": 5, "memory": 520}
            ]
        }
    })))
}

async fn progress(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
    check(&backend, &headers)?;
    backend.progress_calls.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({
        "success": true,
        "data": {
            "solved": backend.solved.load(Ordering::SeqCst),
            "attempted": 1,
            "total": 10
        }
    })))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/student/login", post(login))
        .route("/api/student/coding/bookmarks", get(bookmarks))
        .route("/api/student/coding/languages", get(languages))
        .route("/api/student/coding/problems/{id}", get(problem))
        .route("/api/student/coding/problems/{id}/run", post(run))
        .route("/api/student/coding/problems/{id}/submit", post(submit))
        .route("/api/student/coding/my-progress", get(progress))
        .layer(TraceLayer::new_for_http())
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> JudgeClient<HttpTransport> {
    JudgeClient::new(
        HttpTransport::new(base_url),
        Arc::new(AuthSession::new()),
        "/api/student",
    )
}

#[tokio::test]
async fn login_attaches_bearer_and_unwraps_envelopes() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client_for(&base_url);

    let credential = client.login("ada", "secret").await.unwrap();
    assert_eq!(credential.access_token, TOKEN);
    assert_eq!(credential.student.name, "Ada");
    assert!(client.auth().is_authenticated());

    let bookmarks = client.bookmarks(&PageQuery::default()).await.unwrap();
    let titles: Vec<&str> = bookmarks.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Sum of Two", "Graph Walk"]);

    let catalog = client.languages().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("python").unwrap().name, "Python");
    assert!(!catalog.contains("executable"));
}

#[tokio::test]
async fn rejected_login_leaves_session_empty() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client_for(&base_url);
    let mut events = client.auth().subscribe();

    let err = client.login("ada", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!client.auth().is_authenticated());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn missing_credential_asks_for_login_once() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client_for(&base_url);
    let mut events = client.auth().subscribe();

    let err = client.bookmarks(&PageQuery::default()).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("Not Authorized".to_string()));
    assert!(client.my_progress().await.unwrap_err().is_unauthorized());

    assert_eq!(events.try_recv().unwrap(), AuthEvent::LoginRequired);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn ids_are_encoded_into_single_segments() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client_for(&base_url);
    client.login("ada", "secret").await.unwrap();

    let problem = client.problem("sum/two").await.unwrap();
    assert_eq!(problem.id, "sum/two");
}

#[tokio::test]
async fn expired_session_requests_login_once() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = client_for(&base_url);
    client.login("ada", "secret").await.unwrap();

    let mut events = client.auth().subscribe();
    backend.expired.store(true, Ordering::SeqCst);

    let query = PageQuery::default();
    let results = join_all((0..3).map(|_| client.bookmarks(&query))).await;
    for result in results {
        assert!(result.unwrap_err().is_unauthorized());
    }

    assert!(!client.auth().is_authenticated());
    assert_eq!(events.try_recv().unwrap(), AuthEvent::LoginRequired);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn unreachable_backend_keeps_credential() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(&base_url);
    client.auth().establish(Credential {
        access_token: TOKEN.to_string(),
        ..Default::default()
    });

    let err = client.my_progress().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(client.auth().is_authenticated());
}

#[tokio::test]
async fn run_results_are_normalised() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = client_for(&base_url);
    client.login("ada", "secret").await.unwrap();

    let request = RunRequest {
        code: "print(41)".to_string(),
        language: "python".to_string(),
        custom_input: None,
    };
    let result = client.run("p1", &request).await.unwrap();

    assert_eq!(result.status, "Wrong Answer");
    assert_eq!((result.passed_count, result.total_count), (1, 2));
    assert_eq!(result.test_results[0].status, "Accepted");
    assert_eq!(result.test_results[0].error, None);
    assert_eq!(result.test_results[1].test_case_index, 1);
    assert_eq!(result.test_results[1].error.as_deref(), Some("Wrong Answer"));
    assert_eq!(result.test_results[1].actual_output.as_deref(), Some("41"));

    let body = backend.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body, json!({"code": "print(41)", "language": "python"}));
}

#[tokio::test]
async fn workspace_submit_refreshes_progress() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = client_for(&base_url);
    client.login("ada", "secret").await.unwrap();
    let portal = Portal::new(
        client,
        Arc::new(QueryCache::new()),
        vec!["javascript".to_string(), "python".to_string()],
    );

    assert_eq!(portal.my_progress().await.unwrap().solved, 0);
    assert_eq!(portal.my_progress().await.unwrap().solved, 0);
    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 1);

    let workspace = portal.open_workspace("p1").await.unwrap();
    assert_eq!(workspace.code(), "// start here");
    assert_eq!(workspace.language().as_deref(), Some("javascript"));
    assert_eq!(workspace.problem().test_cases[1].input, None);

    workspace.set_code("console.log(42)");
    let result = workspace.submit(None).await.unwrap().unwrap();
    assert!(result.is_accepted());
    assert_eq!(result.submission_id.as_deref(), Some("sub-1"));

    let body = backend.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body, json!({"code": "console.log(42)", "language": "javascript"}));

    assert_eq!(portal.my_progress().await.unwrap().solved, 1);
    assert_eq!(backend.progress_calls.load(Ordering::SeqCst), 2);
}

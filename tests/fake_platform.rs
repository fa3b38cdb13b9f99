//! End-to-end flows against an in-process fake of the platform API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::time::timeout;
use workdesk::ClientError;
use workdesk::api::ApiClient;
use workdesk::auth::{AuthSession, Role};
use workdesk::config::ClientConfig;
use workdesk::notify::{ConnectionStatus, NotificationSubscriber};
use workdesk::search::SearchScope;
use workdesk::session::WorkStatus;
use workdesk::site_config::load_or_default;
use workdesk::workspace::Workspace;

#[derive(Default)]
struct Platform {
    user_token: String,
    admin_token: String,
    draft: String,
    saves: u32,
    submitted: Option<String>,
    penalties: Vec<(String, String)>,
    last_search: Option<(String, String)>,
}

type Shared = Arc<Mutex<Platform>>;

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap()
}

fn rejected(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

fn user_json(id: &str, role: &str) -> Value {
    json!({ "_id": id, "name": "Jane Doe", "email": "jane@example.com", "role": role })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret1" {
        return rejected(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let token = state.lock().unwrap().user_token.clone();
    Json(json!({ "token": token, "user": { "id": "u1", "name": "Jane Doe", "email": "jane@example.com", "role": "user" } }))
        .into_response()
}

async fn admin_login(State(state): State<Shared>) -> Response {
    let token = state.lock().unwrap().admin_token.clone();
    Json(json!({ "token": token, "user": { "id": "a1", "name": "Ada Admin", "email": "ada@example.com", "role": "admin" } }))
        .into_response()
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if bearer(&headers).as_deref() != Some(state.user_token.as_str()) {
        return rejected(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    let started = (OffsetDateTime::now_utc() - time::Duration::hours(2)).format(&Rfc3339).unwrap();
    let mut user = user_json("u1", "user");
    user["workStartedAt"] = json!(started);
    user["isSignedAgreement"] = json!(true);
    let (status, work) = match &state.submitted {
        Some(content) => ("submitted", json!({ "content": content, "startedAt": started, "submittedAt": now_rfc3339() })),
        None => ("in_progress", json!({ "content": state.draft, "startedAt": started })),
    };
    Json(json!({
        "workStatus": status,
        "timeRemaining": 94 * 3_600_000_i64,
        "daysLeft": 4,
        "user": user,
        "work": work,
    }))
    .into_response()
}

async fn draft(State(state): State<Shared>) -> Response {
    let content = state.lock().unwrap().draft.clone();
    Json(json!({ "work": { "content": content } })).into_response()
}

async fn save_draft(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    if state.submitted.is_some() {
        return rejected(StatusCode::BAD_REQUEST, "Work already submitted");
    }
    state.draft = body["content"].as_str().unwrap_or_default().to_owned();
    state.saves += 1;
    Json(json!({ "message": "Draft saved", "work": { "lastSaved": now_rfc3339() } })).into_response()
}

async fn submit(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    if state.submitted.is_some() {
        return rejected(StatusCode::BAD_REQUEST, "Work already submitted");
    }
    state.submitted = Some(body["content"].as_str().unwrap_or_default().to_owned());
    let review = (OffsetDateTime::now_utc() + time::Duration::hours(24)).format(&Rfc3339).unwrap();
    Json(json!({ "message": "Work submitted successfully", "reviewDeadline": review })).into_response()
}

async fn site_config() -> Response {
    Json(json!({ "config": { "navbarTitle": "Acme Data", "footerEmail": "ops@acme.test" } })).into_response()
}

async fn penalize(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let reason = body["reason"].as_str().unwrap_or_default().to_owned();
    state.lock().unwrap().penalties.push((id, reason));
    Json(json!({ "message": "User penalized successfully" })).into_response()
}

async fn universal_search(State(state): State<Shared>, Query(params): Query<Vec<(String, String)>>) -> Response {
    let find = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap_or_default();
    state.lock().unwrap().last_search = Some((find("q"), find("type")));
    Json(json!({
        "results": {
            "users": [user_json("u1", "user")],
            "signedAgreements": [],
            "pdfs": [{ "_id": "p1", "title": "Jane's brief", "isActive": true }],
            "works": []
        }
    }))
    .into_response()
}

async fn socket(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(push_work_started)
}

async fn push_work_started(mut socket: WebSocket) {
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            if text.as_str().contains("join-admin") {
                break;
            }
        }
    }
    let event = json!({
        "event": "work-started",
        "data": {
            "userName": "Jane Doe",
            "userEmail": "jane@example.com",
            "timestamp": now_rfc3339(),
            "projectLink": "https://projects.example.com/7"
        }
    });
    let _ = socket.send(Message::Text(event.to_string().into())).await;
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn spawn_platform() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(Platform {
        user_token: format!("user-{}", uuid::Uuid::new_v4()),
        admin_token: format!("admin-{}", uuid::Uuid::new_v4()),
        draft: "<p>first pass</p>".to_owned(),
        ..Platform::default()
    }));
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/admin-login", post(admin_login))
        .route("/api/users/dashboard", get(dashboard))
        .route("/api/work/draft", get(draft))
        .route("/api/work/save-draft", post(save_draft))
        .route("/api/work/submit", post(submit))
        .route("/api/site-config", get(site_config))
        .route("/api/admin/users/{id}/penalize", post(penalize))
        .route("/api/admin/universal-search", get(universal_search))
        .route("/socket", get(socket))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, state)
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default().with_api_url(&format!("http://{addr}")).unwrap()
}

async fn logged_in(config: &ClientConfig, role: Role) -> (ApiClient, AuthSession) {
    let client = ApiClient::new(config).unwrap();
    let session = match role {
        Role::User => client.login("jane@example.com", "secret1").await.unwrap(),
        Role::Admin => client.admin_login("ada@example.com", "secret1").await.unwrap(),
    };
    (client.with_session(Some(session.clone())), session)
}

// =============================================================================
// Work session
// =============================================================================

#[tokio::test]
async fn edit_save_and_submit_through_workspace() {
    let (addr, platform) = spawn_platform().await;
    let config = config_for(addr);
    let (client, _) = logged_in(&config, Role::User).await;

    let workspace = Workspace::for_client(client, &config).await.unwrap();
    assert_eq!(workspace.html(), "<p>first pass</p>");
    assert_eq!(workspace.state().snapshot.status, WorkStatus::InProgress);
    assert!(workspace.state().countdown().starts_with("3d "));

    workspace.edit("<p>final answer</p>").unwrap();
    assert!(workspace.save().await.unwrap().is_some());
    assert_eq!(platform.lock().unwrap().draft, "<p>final answer</p>");

    let confirm = |_: &str| true;
    let receipt = workspace.submit(&confirm).await.unwrap();
    assert!(receipt.summary().starts_with("Work submitted successfully\n\nReview deadline: "));
    assert_eq!(platform.lock().unwrap().submitted.as_deref(), Some("<p>final answer</p>"));

    assert!(workspace.state().read_only);
    assert!(matches!(workspace.submit(&confirm).await, Err(ClientError::AlreadySubmitted)));

    let state = workspace.refresh().await.unwrap();
    assert_eq!(state.snapshot.status, WorkStatus::Submitted);
}

#[tokio::test]
async fn blank_submit_never_reaches_server() {
    let (addr, platform) = spawn_platform().await;
    let config = config_for(addr);
    let (client, _) = logged_in(&config, Role::User).await;

    let workspace = Workspace::for_client(client, &config).await.unwrap();
    workspace.edit("<p><br></p>").unwrap();
    let confirm = |_: &str| true;
    assert!(matches!(workspace.submit(&confirm).await, Err(ClientError::EmptyContent)));
    assert!(platform.lock().unwrap().submitted.is_none());
}

#[tokio::test]
async fn server_rejection_message_is_surfaced() {
    let (addr, _) = spawn_platform().await;
    let config = config_for(addr);
    let client = ApiClient::new(&config).unwrap();

    let err = client.login("jane@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");

    let (client, session) = logged_in(&config, Role::User).await;
    let mut stale = session;
    stale.token = "expired".to_owned();
    let err = client.with_session(Some(stale)).dashboard().await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 401, .. }));
    assert_eq!(err.user_message(), "Not authorized, token failed");
}

#[tokio::test]
async fn site_config_merges_server_values_with_defaults() {
    let (addr, _) = spawn_platform().await;
    let client = ApiClient::new(&config_for(addr)).unwrap();
    let config = load_or_default(&client).await;
    assert_eq!(config.navbar_title, "Acme Data");
    assert_eq!(config.footer_contact_number, "+1 (555) 123-4567");
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn admin_penalize_and_search() {
    let (addr, platform) = spawn_platform().await;
    let (client, _) = logged_in(&config_for(addr), Role::Admin).await;

    client.penalize("u1", "  Missed the brief  ").await.unwrap();
    assert_eq!(platform.lock().unwrap().penalties, vec![("u1".to_owned(), "Missed the brief".to_owned())]);

    let results = client.universal_search("jane", SearchScope::Users).await.unwrap();
    assert_eq!(results.total(), 2);
    assert_eq!(results.into_results(SearchScope::Users).len(), 1);
    assert_eq!(platform.lock().unwrap().last_search, Some(("jane".to_owned(), "users".to_owned())));
}

#[tokio::test]
async fn user_session_cannot_reach_admin_endpoints() {
    let (addr, platform) = spawn_platform().await;
    let (client, _) = logged_in(&config_for(addr), Role::User).await;

    let err = client.penalize("u2", "late").await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden { role: Role::User, .. }));
    assert!(platform.lock().unwrap().penalties.is_empty());
}

#[tokio::test]
async fn admin_receives_work_started_notification() {
    let (addr, _) = spawn_platform().await;
    let (client, session) = logged_in(&config_for(addr), Role::Admin).await;

    let subscriber = NotificationSubscriber::spawn(client.base_url(), Some(&session)).unwrap();
    let mut events = subscriber.subscribe();
    let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();

    assert_eq!(event.user_email, "jane@example.com");
    assert_eq!(event.project_link, "https://projects.example.com/7");
    assert_eq!(subscriber.snapshot().len(), 1);
    assert_eq!(subscriber.status(), ConnectionStatus::Connected);

    subscriber.clear();
    assert!(subscriber.snapshot().is_empty());
}

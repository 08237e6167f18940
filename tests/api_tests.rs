//! Backend client tests against a mocked MoodScribe API.
//!
//! Every test starts its own wiremock server and points the client at
//! `<server>/api`, the same layout as the real backend.

use moodscribe::api::{ApiClient, ApiError};
use moodscribe::auth::AuthContext;
use moodscribe::models::{ActivityLevel, NewUser, Preferences, Role};
use moodscribe::router::Route;
use moodscribe::session::SessionStore;
use moodscribe::tui::App;
use moodscribe::tui::dispatch::{self, ApiCommand, ApiEvent};
use moodscribe::Config;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

async fn start() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(format!("{}/api", server.uri()));
    (server, client)
}

fn login_success() -> serde_json::Value {
    json!({
        "success": true,
        "token": "tok-1",
        "user": { "id": "u1", "username": "alice", "email": "alice@example.com", "name": "Alice" }
    })
}

/// Run queued commands against the mock until the app stops asking
async fn settle(app: &mut App, client: &ApiClient) {
    loop {
        let commands = app.take_commands();
        if commands.is_empty() {
            break;
        }
        for command in commands {
            let event = dispatch::execute(&client.with_token(app.auth.token()), command).await;
            app.handle_api_event(event);
        }
    }
}

// ============= Authentication =============

#[tokio::test]
async fn authenticate_posts_credentials_and_grants_session() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.authenticate("alice", "pw").await.unwrap();
    let (session, user) = response.into_session().unwrap();
    assert_eq!(session.token, "tok-1");
    assert_eq!(session.user_id, "u1");
    assert_eq!(user.name, "Alice");
}

#[tokio::test]
async fn unsuccessful_login_grants_no_session() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "nope" })))
        .mount(&server)
        .await;

    let response = client.authenticate("alice", "wrong").await.unwrap();
    assert_eq!(response.error.as_deref(), Some("nope"));
    assert!(response.into_session().is_none());
}

#[tokio::test]
async fn rejected_credentials_carry_the_server_message() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Incorrect password" })))
        .mount(&server)
        .await;

    let err = client.authenticate("alice", "wrong").await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.server_message(), Some("Incorrect password"));
}

#[tokio::test]
async fn register_sends_an_empty_preferences_object() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "user": { "username": "bob", "email": "bob@example.com", "name": "Bob", "password": "secret" },
            "preferences": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-2",
            "user": { "id": "u2", "username": "bob" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = NewUser {
        username: "bob".to_string(),
        email: "bob@example.com".to_string(),
        name: "Bob".to_string(),
        password: "secret".to_string(),
    };
    let response = client.register(&user, None).await.unwrap();
    assert!(response.into_session().is_some());
}

#[tokio::test]
async fn profile_request_carries_the_bearer_token() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "u1", "name": "Alice" })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.with_token(Some("tok-1")).fetch_profile().await.unwrap();
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.name, "Alice");
}

// ============= Journal =============

#[tokio::test]
async fn diary_entry_returns_reply_and_context() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/diary-entry"))
        .and(body_json(json!({
            "user_id": "u1",
            "content": "Today was good",
            "timestamp": "2024-05-01T09:30:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Glad to hear!",
            "context": { "mood": "happy", "stress_level": 2.5, "goals": ["sleep more"] }
        })))
        .mount(&server)
        .await;

    let reply = client
        .with_token(Some("tok-1"))
        .post_diary_entry("u1", "Today was good", "2024-05-01T09:30:00.000Z")
        .await
        .unwrap();
    assert_eq!(reply.response, "Glad to hear!");
    assert_eq!(reply.context.mood.as_deref(), Some("happy"));
    assert_eq!(reply.context.goals, vec!["sleep more".to_string()]);
}

#[tokio::test]
async fn history_decodes_both_roles() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversation-history/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "role": "user", "content": "Rough day", "timestamp": "2024-04-30T20:00:00Z" },
            { "role": "assistant", "content": "I'm here for you." }
        ])))
        .mount(&server)
        .await;

    let history = client.fetch_history("u1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert!(history[1].timestamp.is_none());
}

#[tokio::test]
async fn server_errors_without_a_body_use_the_status_reason() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversation-history/u1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    match client.fetch_history("u1").await {
        Err(ApiError::RequestFailed { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected a failed request, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_bodies_are_decode_errors() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/user-context/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.fetch_user_context("u1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

// ============= Preferences =============

#[tokio::test]
async fn preferences_are_replaced_wholesale_with_put() {
    let (server, client) = start().await;
    let preferences = Preferences {
        location: "Lisbon".to_string(),
        hobbies: vec!["surfing".to_string()],
        activity_level: ActivityLevel::High,
        preferred_meditation_time: None,
        preferred_notification_time: Some("07:30".to_string()),
        ..Preferences::default()
    };
    let body = json!({
        "location": "Lisbon",
        "hobbies": ["surfing"],
        "likes": [],
        "dislikes": [],
        "favorite_genres": [],
        "activity_level": "high",
        "preferred_meditation_time": null,
        "preferred_notification_time": "07:30"
    });
    Mock::given(method("PUT"))
        .and(path("/api/preferences/u1"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let saved = client.update_preferences("u1", &preferences).await.unwrap();
    assert_eq!(saved, preferences);
}

#[tokio::test]
async fn execute_maps_commands_to_their_events() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/preferences/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "activity_level": "high" })))
        .mount(&server)
        .await;

    let event = dispatch::execute(&client, ApiCommand::FetchPreferences { user_id: "u1".to_string() }).await;
    match event {
        ApiEvent::PreferencesLoaded(Ok(prefs)) => assert_eq!(prefs.activity_level, ActivityLevel::High),
        other => panic!("unexpected event: {:?}", other),
    }
}

// ============= Whole flows =============

#[tokio::test]
async fn sign_in_then_write_an_entry() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u1", "name": "Alice" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversation-history/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user-context/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mood": "calm" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/diary-entry"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Glad to hear!" })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthContext::restore(SessionStore::open_in_memory().unwrap()).unwrap();
    let mut app = App::new(Config::default(), auth, Route::Journal);
    assert_eq!(app.route(), Route::Login);

    app.login.username.insert_str("alice");
    app.login.password.insert_str("pw");
    app.submit();
    settle(&mut app, &client).await;

    assert_eq!(app.route(), Route::Journal);
    assert_eq!(app.auth.display_name(), Some("Alice"));
    assert_eq!(app.journal.context.as_ref().and_then(|c| c.mood.as_deref()), Some("calm"));

    app.journal.composer.insert_str("Today was good");
    app.submit();
    settle(&mut app, &client).await;

    let contents: Vec<&str> = app.journal.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Today was good", "Glad to hear!"]);
    assert!(!app.journal.loading);
}

#[tokio::test]
async fn expired_stored_session_returns_to_login() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversation-history/u1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user-context/u1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut store = SessionStore::open_in_memory().unwrap();
    store
        .save(&moodscribe::models::Session { token: "old".to_string(), user_id: "u1".to_string() })
        .unwrap();
    let auth = AuthContext::restore(store).unwrap();
    let mut app = App::new(Config::default(), auth, Route::Journal);
    assert_eq!(app.route(), Route::Journal);

    settle(&mut app, &client).await;

    assert_eq!(app.route(), Route::Login);
    assert!(!app.auth.is_authenticated());
    assert!(app.auth.store().load().unwrap().is_none());
}

//! The smoke run: log in, wait, then fetch the current user.
//!
//! Both steps are awaited in order. The session is passed in by the caller and
//! is the only place the token lives between the two requests.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::{Credentials, Session, SessionData};
use crate::models::{CurrentUserResponse, LoginResponse};

/// What a successful run saw from the server
#[derive(Debug, Clone)]
pub struct SmokeReport {
    pub login: LoginResponse,
    pub user: CurrentUserResponse,
}

/// Log in and record the access token in `session`.
/// On failure the session is left as it was.
pub async fn login(
    client: &ApiClient,
    credentials: &Credentials,
    session: &mut Session,
) -> Result<LoginResponse> {
    let login = client.login(credentials).await?;
    session.update(SessionData::from_login(&credentials.email, &login));

    // The in-memory token is enough for this run
    if let Err(e) = session.save() {
        warn!(error = %format!("{:#}", e), "Could not persist session");
    }
    Ok(login)
}

/// Fetch the current user with whatever token `session` holds.
pub async fn profile(client: &ApiClient, session: &Session) -> Result<CurrentUserResponse> {
    client
        .with_token(session.token().map(str::to_string))
        .current_user()
        .await
}

/// Run login, then after `delay` the profile request.
/// A login failure stops the run before any profile request is sent.
pub async fn run(
    client: &ApiClient,
    credentials: &Credentials,
    session: &mut Session,
    delay: Duration,
) -> Result<SmokeReport> {
    let login = login(client, credentials, session)
        .await
        .context("Login step failed")?;

    info!(delay_ms = delay.as_millis() as u64, "Waiting before fetching current user");
    tokio::time::sleep(delay).await;

    let user = profile(client, session)
        .await
        .context("Current-user step failed")?;

    Ok(SmokeReport { login, user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DELAY: Duration = Duration::from_millis(20);

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client builds")
    }

    async fn mount_login(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "abc"}})).await;

        let mut session = Session::in_memory();
        login(&client_for(&server), &Credentials::default(), &mut session)
            .await
            .expect("login succeeds");
        assert_eq!(session.token(), Some("abc"));
    }

    #[tokio::test]
    async fn test_login_stores_token_despite_odd_user_block() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({"user": {"id": "u-1"}, "tokens": {"access_token": "abc"}, "extra": 1}),
        )
        .await;

        let mut session = Session::in_memory();
        let login = login(&client_for(&server), &Credentials::default(), &mut session)
            .await
            .expect("login succeeds");
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(login.extra["extra"], 1);
    }

    #[tokio::test]
    async fn test_run_accepts_echoed_profile() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "abc"}})).await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authorization": "Bearer abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let report = run(&client_for(&server), &Credentials::default(), &mut Session::in_memory(), DELAY)
            .await
            .expect("echo body is a successful profile step");
        assert_eq!(report.user.0["authorization"], "Bearer abc");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_unchanged() {
        let server = MockServer::start().await;
        mount_login(&server, 401, json!({"error": "Invalid credentials"})).await;

        let mut session = Session::in_memory();
        session.update(SessionData {
            access_token: "old".to_string(),
            refresh_token: None,
            email: "a@b.c".to_string(),
            created_at: chrono::Utc::now(),
        });

        let err = login(&client_for(&server), &Credentials::default(), &mut session)
            .await
            .expect_err("401 must fail");
        assert_eq!(err.downcast_ref::<ApiError>().and_then(ApiError::status), Some(401));
        assert_eq!(session.token(), Some("old"));
    }

    #[tokio::test]
    async fn test_login_persists_when_backed_by_dir() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "saved"}})).await;
        let dir = tempfile::tempdir().unwrap();

        let mut session = Session::with_dir(dir.path().to_path_buf());
        login(&client_for(&server), &Credentials::default(), &mut session)
            .await
            .unwrap();

        let mut restored = Session::with_dir(dir.path().to_path_buf());
        assert!(restored.load().unwrap());
        assert_eq!(restored.token(), Some("saved"));
    }

    #[tokio::test]
    async fn test_run_sends_profile_with_login_token() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "tok1"}})).await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 42, "email": "jadmin@gmail.com"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = Session::in_memory();
        let report = run(&client_for(&server), &Credentials::default(), &mut session, DELAY)
            .await
            .expect("run succeeds");
        assert_eq!(report.login.access_token(), "tok1");
        assert_eq!(report.user.user_id(), Some(42));

        let requests = server.received_requests().await.unwrap();
        let me_requests: Vec<_> = requests.iter().filter(|r| r.url.path() == "/auth/me").collect();
        assert_eq!(me_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_run_waits_before_profile() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "tok1"}})).await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 1}})))
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        run(
            &client_for(&server),
            &Credentials::default(),
            &mut Session::in_memory(),
            Duration::from_millis(150),
        )
        .await
        .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_run_stops_after_failed_login() {
        let server = MockServer::start().await;
        mount_login(&server, 401, json!({"error": "Invalid credentials"})).await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = Session::in_memory();
        let err = run(&client_for(&server), &Credentials::default(), &mut session, DELAY)
            .await
            .expect_err("run must fail");
        assert!(err.to_string().contains("Login step failed"));
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_run_reports_profile_failure() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"tokens": {"access_token": "tok1"}})).await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Internal server error"})))
            .mount(&server)
            .await;

        let mut session = Session::in_memory();
        let err = run(&client_for(&server), &Credentials::default(), &mut session, DELAY)
            .await
            .expect_err("profile 500 must surface");
        assert!(err.to_string().contains("Current-user step failed"));
        assert_eq!(err.downcast_ref::<ApiError>().and_then(ApiError::status), Some(500));
        assert_eq!(session.token(), Some("tok1"));
    }
}

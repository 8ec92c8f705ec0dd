use std::time::Duration;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use dailink_auth::Authenticator;
use dailink_config::{AppConfig, DatabaseConfig};
use dailink_database::{initialize_database, LinkedInAccountRepository, UpsertLinkedInAccount, UserRepository};
use dailink_gateway::{build_router, AppState};
use dailink_unipile::UnipileClient;
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

struct TestContext {
    _temp_dir: TempDir,
    pool: SqlitePool,
    state: AppState,
}

impl TestContext {
    async fn new(unipile: Option<&MockServer>) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("gateway.sqlite");
        let mut config = AppConfig::default();
        config.database = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };
        config.hsc.page_delay_ms = 1;
        config.hsc.max_pages = 3;

        let pool = initialize_database(&config.database).await?;
        let authenticator = Authenticator::new(pool.clone(), config.auth.clone());
        let client = match unipile {
            Some(server) => Some(UnipileClient::with_api_key(
                &server.base_url(),
                "test-key",
                Duration::from_secs(2),
            )?),
            None => None,
        };
        let state = AppState::new(
            pool.clone(),
            authenticator,
            client,
            config.assistant.clone(),
            config.hsc.clone(),
        );

        Ok(Self {
            _temp_dir: temp_dir,
            pool,
            state,
        })
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    /// Registers and logs in a user, returning the bearer token.
    async fn login(&self, email: &str) -> TestResult<String> {
        let credentials = json!({"email": email, "password": "correct horse battery"});
        let (status, _) = self
            .call(Method::POST, "/api/auth/register", None, Some(credentials.clone()))
            .await?;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .call(Method::POST, "/api/auth/login", None, Some(credentials))
            .await?;
        assert_eq!(status, StatusCode::OK);
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    async fn login_admin(&self, email: &str) -> TestResult<String> {
        let token = self.login(email).await?;
        UserRepository::new(self.pool.clone())
            .promote_by_email(email)
            .await?;
        Ok(token)
    }

    /// Mirrors a LinkedIn account for the user behind `email`.
    async fn link_account(&self, email: &str, account_id: &str) -> TestResult {
        let user = UserRepository::new(self.pool.clone())
            .find_by_email(email)
            .await?;
        LinkedInAccountRepository::new(self.pool.clone())
            .upsert(&UpsertLinkedInAccount {
                account_id: account_id.to_string(),
                user_id: user.id,
                name: "Jane Recruiter".to_string(),
                status: "OK".to_string(),
                provider: "LINKEDIN".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            })
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn health_reports_ok() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let (status, body) = ctx.call(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn register_login_and_me_round_trip() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;

    let (status, body) = ctx.call(Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("id").is_none());

    let (status, _) = ctx
        .call(Method::POST, "/api/auth/logout", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.call(Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> TestResult {
    let ctx = TestContext::new(None).await?;
    ctx.login("alice@example.com").await?;

    let (status, body) = ctx
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "ALICE@example.com", "password": "another password"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn missing_bearer_is_unauthorized() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let (status, _) = ctx.call(Method::GET, "/api/crm/lists", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_admin_role() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let user_token = ctx.login("user@example.com").await?;
    let admin_token = ctx.login_admin("admin@example.com").await?;

    let (status, _) = ctx
        .call(Method::GET, "/api/admin/users", Some(&user_token), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .call(Method::GET, "/api/admin/users", Some(&admin_token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn last_admin_cannot_be_demoted() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let admin_token = ctx.login_admin("admin@example.com").await?;
    let (_, me) = ctx
        .call(Method::GET, "/api/auth/me", Some(&admin_token), None)
        .await?;
    let admin_id = me["user"]["public_id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx
        .call(
            Method::PUT,
            &format!("/api/admin/users/{admin_id}/role"),
            Some(&admin_token),
            Some(json!({"role": "user"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .call(
            Method::DELETE,
            &format!("/api/admin/users/{admin_id}"),
            Some(&admin_token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn selected_account_must_be_visible() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let alice = ctx.login("alice@example.com").await?;
    let bob = ctx.login("bob@example.com").await?;
    ctx.link_account("alice@example.com", "acc-alice").await?;

    let (status, body) = ctx
        .call(
            Method::PUT,
            "/api/me/selected-account",
            Some(&alice),
            Some(json!({"account_id": "acc-alice"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], "acc-alice");

    let (status, _) = ctx
        .call(
            Method::PUT,
            "/api/me/selected-account",
            Some(&bob),
            Some(json!({"account_id": "acc-alice"})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .call(
            Method::PUT,
            "/api/me/selected-account",
            Some(&alice),
            Some(json!({"account_id": null})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["account_id"].is_null());
    Ok(())
}

#[tokio::test]
async fn crm_lists_deduplicate_profiles() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (status, list) = ctx
        .call(
            Method::POST,
            "/api/crm/lists",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "  Finance leaders  "})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["name"], "Finance leaders");
    assert_eq!(list["kind"], "people");
    let list_id = list["public_id"].as_str().unwrap_or_default().to_string();

    let profiles = json!({"profiles": [
        {"linkedin_id": "ACo1", "name": "Jane Doe", "public_identifier": "jane-doe"},
        {"linkedin_id": "ACo1", "name": "Jane Doe again"},
        {"linkedin_id": "ACo2", "name": "John Roe"}
    ]});
    let (status, summary) = ctx
        .call(
            Method::POST,
            &format!("/api/crm/lists/{list_id}/profiles"),
            Some(&token),
            Some(profiles.clone()),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({"inserted": 2, "skipped": 1}));

    let (_, summary) = ctx
        .call(
            Method::POST,
            &format!("/api/crm/lists/{list_id}/profiles"),
            Some(&token),
            Some(profiles),
        )
        .await?;
    assert_eq!(summary, json!({"inserted": 0, "skipped": 3}));

    let (status, body) = ctx
        .call(
            Method::GET,
            &format!("/api/crm/lists/{list_id}/profiles"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let jane = body["profiles"]
        .as_array()
        .and_then(|profiles| profiles.iter().find(|p| p["linkedin_id"] == "ACo1"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(jane["profile_url"], "https://www.linkedin.com/in/jane-doe/");

    let (status, _) = ctx
        .call(
            Method::POST,
            &format!("/api/crm/lists/{list_id}/companies"),
            Some(&token),
            Some(json!({"companies": [{"linkedin_id": "C1", "name": "Acme"}]})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn crm_lists_are_scoped_to_their_owner() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let alice = ctx.login("alice@example.com").await?;
    let bob = ctx.login("bob@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (_, list) = ctx
        .call(
            Method::POST,
            "/api/crm/lists",
            Some(&alice),
            Some(json!({"account_id": "acc-1", "name": "Mine"})),
        )
        .await?;
    let list_id = list["public_id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx
        .call(Method::GET, &format!("/api/crm/lists/{list_id}"), Some(&bob), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/crm/lists",
            Some(&bob),
            Some(json!({"account_id": "acc-1", "name": "Stolen"})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn campaign_logs_feed_stats_and_dashboard() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (status, campaign) = ctx
        .call(
            Method::POST,
            "/api/campaigns",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "Q3 outreach"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(campaign["status"], "draft");
    let campaign_id = campaign["public_id"].as_str().unwrap_or_default().to_string();

    let (status, campaign) = ctx
        .call(
            Method::PUT,
            &format!("/api/campaigns/{campaign_id}/status"),
            Some(&token),
            Some(json!({"status": "active"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(campaign["status"], "active");

    let logs = [
        ("message_sent", "success"),
        ("message_sent", "success"),
        ("message_sent", "success"),
        ("message_sent", "success"),
        ("reply_received", "success"),
        ("invitation_sent", "error"),
    ];
    for (index, (action, outcome)) in logs.iter().enumerate() {
        let (status, _) = ctx
            .call(
                Method::POST,
                &format!("/api/campaigns/{campaign_id}/logs"),
                Some(&token),
                Some(json!({"target_id": format!("ACo{index}"), "action": action, "status": outcome})),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, stats) = ctx
        .call(
            Method::GET,
            &format!("/api/campaigns/{campaign_id}/stats"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(stats["messages_sent"], 4);
    assert_eq!(stats["replies"], 1);
    assert_eq!(stats["invitations_sent"], 0);
    assert_eq!(stats["errors"], 1);

    let (_, body) = ctx
        .call(
            Method::GET,
            &format!("/api/campaigns/{campaign_id}/logs?limit=2"),
            Some(&token),
            None,
        )
        .await?;
    let logs = body["logs"].as_array().cloned().unwrap_or_default();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "invitation_sent");

    let (status, dashboard) = ctx
        .call(Method::GET, "/api/dashboard/stats", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["accounts"], 1);
    assert_eq!(dashboard["campaigns"], 1);
    assert_eq!(dashboard["active_campaigns"], 1);
    assert_eq!(dashboard["reply_rate"], 0.25);
    Ok(())
}

#[tokio::test]
async fn campaign_rejects_list_from_another_account() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;
    ctx.link_account("alice@example.com", "acc-2").await?;

    let (_, list) = ctx
        .call(
            Method::POST,
            "/api/crm/lists",
            Some(&token),
            Some(json!({"account_id": "acc-2", "name": "Other account"})),
        )
        .await?;

    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/campaigns",
            Some(&token),
            Some(json!({
                "account_id": "acc-1",
                "name": "Mismatched",
                "crm_list_id": list["public_id"]
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invitation_rejects_campaign_from_another_account() -> TestResult {
    let server = MockServer::start_async().await;
    let invite = server
        .mock_async(|when, then| {
            when.method(POST).path("/users/invite");
            then.status(201)
                .json_body(json!({"object": "UserInvitationSent", "invitation_id": "inv-1"}));
        })
        .await;

    let ctx = TestContext::new(Some(&server)).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;
    ctx.link_account("alice@example.com", "acc-2").await?;

    let (_, campaign) = ctx
        .call(
            Method::POST,
            "/api/campaigns",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "Account one outreach"})),
        )
        .await?;
    let campaign_id = campaign["public_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx
        .call(
            Method::POST,
            "/api/accounts/acc-2/invitations",
            Some(&token),
            Some(json!({"provider_id": "ACo9", "campaign_id": campaign_id})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "campaign belongs to another linkedin account");
    invite.assert_hits_async(0).await;

    let (_, body) = ctx
        .call(
            Method::GET,
            &format!("/api/campaigns/{campaign_id}/logs"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(body["logs"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn unipile_routes_report_unconfigured_integration() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;

    let (status, body) = ctx
        .call(Method::GET, "/api/accounts", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "LinkedIn integration is not configured");
    Ok(())
}

#[tokio::test]
async fn connect_mirrors_account_for_caller() -> TestResult {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(201).json_body(json!({
                "object": "AccountCreated",
                "account_id": "acc-new"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/accounts/acc-new");
            then.status(200).json_body(json!({
                "object": "Account",
                "id": "acc-new",
                "name": "Jane Recruiter",
                "type": "LINKEDIN",
                "created_at": "2026-01-01T00:00:00.000Z",
                "sources": [{"id": "acc-new_MESSAGING", "status": "OK"}]
            }));
        })
        .await;

    let ctx = TestContext::new(Some(&server)).await?;
    let token = ctx.login("alice@example.com").await?;

    let (status, body) = ctx
        .call(
            Method::POST,
            "/api/accounts/connect",
            Some(&token),
            Some(json!({"username": "jane@example.com", "password": "secret"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["account"]["id"], "acc-new");
    assert_eq!(body["account"]["status"], "OK");

    let mirrored = LinkedInAccountRepository::new(ctx.pool.clone())
        .find("acc-new")
        .await?;
    assert_eq!(mirrored.name, "Jane Recruiter");
    Ok(())
}

#[tokio::test]
async fn hsc_run_completes_against_search_results() -> TestResult {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/linkedin/search")
                .query_param("account_id", "acc-1");
            then.status(200).json_body(json!({
                "object": "LinkedinSearch",
                "items": [
                    {"type": "PEOPLE", "id": "ACo1", "name": "Jane Doe", "public_identifier": "jane-doe"},
                    {"type": "PEOPLE", "id": "ACo2", "name": "John Roe", "public_identifier": "john-roe"}
                ],
                "cursor": null
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/users/jane-doe");
            then.status(200).json_body(json!({
                "provider_id": "ACo1",
                "public_identifier": "jane-doe",
                "first_name": "Jane",
                "last_name": "Doe",
                "headline": "Group CFO at Acme"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/users/john-roe");
            then.status(200).json_body(json!({
                "provider_id": "ACo2",
                "public_identifier": "john-roe",
                "first_name": "John",
                "last_name": "Roe",
                "headline": "Software Engineer"
            }));
        })
        .await;

    let ctx = TestContext::new(Some(&server)).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (status, run) = ctx
        .call(
            Method::POST,
            "/api/hsc-runs",
            Some(&token),
            Some(json!({
                "account_id": "acc-1",
                "name": "Finance champions",
                "keywords": "finance",
                "champion_keywords": ["cfo"]
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["stage"], "preparing-run");
    let run_id = run["public_id"].as_str().unwrap_or_default().to_string();

    let (status, run) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/start"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(run["stage"], "running");

    let mut run = Value::Null;
    for _ in 0..100 {
        let (_, current) = ctx
            .call(Method::GET, &format!("/api/hsc-runs/{run_id}"), Some(&token), None)
            .await?;
        if current["stage"] == "completed" {
            run = current;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(run["stage"], "completed");
    assert_eq!(run["progress"], 100);
    assert_eq!(run["pages_processed"], 1);
    search.assert_async().await;

    let (_, body) = ctx
        .call(
            Method::GET,
            &format!("/api/hsc-runs/{run_id}/items?champions_only=true"),
            Some(&token),
            None,
        )
        .await?;
    let items = body["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["linkedin_id"], "ACo1");
    assert_eq!(items[0]["name"], "Jane Doe");

    let (status, _) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/start"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, list) = ctx
        .call(
            Method::POST,
            "/api/crm/lists",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "Champions"})),
        )
        .await?;
    let (status, summary) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/export"),
            Some(&token),
            Some(json!({"list_id": list["public_id"], "champions_only": true})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({"inserted": 1, "skipped": 0}));
    Ok(())
}

#[tokio::test]
async fn hsc_stop_requires_running_stage() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (_, run) = ctx
        .call(
            Method::POST,
            "/api/hsc-runs",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "Idle", "keywords": "cfo"})),
        )
        .await?;
    let run_id = run["public_id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/stop"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/start"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, run) = ctx
        .call(Method::GET, &format!("/api/hsc-runs/{run_id}"), Some(&token), None)
        .await?;
    assert_eq!(run["stage"], "preparing-run");
    Ok(())
}

#[tokio::test]
async fn hsc_start_requires_linked_account() -> TestResult {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST).path("/linkedin/search");
            then.status(200).json_body(json!({"items": [], "cursor": null}));
        })
        .await;

    let ctx = TestContext::new(Some(&server)).await?;
    let token = ctx.login("alice@example.com").await?;
    ctx.link_account("alice@example.com", "acc-1").await?;

    let (_, run) = ctx
        .call(
            Method::POST,
            "/api/hsc-runs",
            Some(&token),
            Some(json!({"account_id": "acc-1", "name": "Orphaned", "keywords": "cfo"})),
        )
        .await?;
    let run_id = run["public_id"].as_str().unwrap_or_default().to_string();

    LinkedInAccountRepository::new(ctx.pool.clone())
        .delete("acc-1")
        .await?;

    let (status, _) = ctx
        .call(
            Method::POST,
            &format!("/api/hsc-runs/{run_id}/start"),
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, run) = ctx
        .call(Method::GET, &format!("/api/hsc-runs/{run_id}"), Some(&token), None)
        .await?;
    assert_eq!(run["stage"], "preparing-run");
    assert_eq!(run["last_error"], Value::Null);
    search.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn bots_never_expose_api_keys() -> TestResult {
    let ctx = TestContext::new(None).await?;
    let token = ctx.login("alice@example.com").await?;

    let (status, bot) = ctx
        .call(
            Method::POST,
            "/api/bots",
            Some(&token),
            Some(json!({
                "name": "Writer",
                "assistant_id": "asst_1",
                "api_key": "sk-proj-abcdef987654"
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bot["api_key"], "sk-…7654");

    let (_, body) = ctx.call(Method::GET, "/api/bots", Some(&token), None).await?;
    let raw = serde_json::to_string(&body)?;
    assert!(!raw.contains("abcdef987654"));
    Ok(())
}

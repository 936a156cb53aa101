use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use talentflow_auth::{JwtClaims, Role};
use talentflow_core::{TenantId, UserId};
use talentflow_infra::config::AppConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router and workers as prod, short backoff, ephemeral port.
        let env: HashMap<&str, &str> = [
            ("JWT_SECRET", JWT_SECRET),
            ("QUEUE_TEXT_GENERATION_BACKOFF_MS", "5"),
            ("QUEUE_IMAGE_GENERATION_BACKOFF_MS", "5"),
            ("QUEUE_PUBLICATION_BACKOFF_MS", "5"),
            ("QUEUE_EMAIL_BACKOFF_MS", "5"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        let services = Arc::new(talentflow_api::app::build_services(&config));
        let workers = services.start_workers();
        let app = talentflow_api::app::build_app(services, &config.jwt_secret);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
            workers.shutdown().await;
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(tenant_id: TenantId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        tenant_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn post_json(
    client: &reqwest::Client,
    url: String,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let res = client.post(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> (StatusCode, Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

/// Customer + job owned by the token's tenant. Returns the job id.
async fn seed_job(srv: &TestServer, client: &reqwest::Client, token: &str) -> String {
    let (status, customer) = post_json(
        client,
        srv.url("/customers"),
        token,
        json!({ "name": "Acme", "contactEmail": "hr@acme.test" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, job) = post_json(
        client,
        srv.url("/jobs"),
        token,
        json!({
            "customerId": customer["id"],
            "title": "Backend Engineer",
            "description": "Build services",
            "location": "Berlin"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["status"], "DRAFT");
    job["id"].as_str().unwrap().to_string()
}

/// Poll the status endpoint until the task reaches a terminal state.
async fn wait_for_task(
    srv: &TestServer,
    client: &reqwest::Client,
    token: &str,
    handle: &Value,
) -> Value {
    let queue = handle["queueName"].as_str().unwrap();
    let task = handle["taskId"].as_str().unwrap();
    for _ in 0..300 {
        let (status, view) =
            get_json(client, srv.url(&format!("/queue/job/{queue}/{task}")), token).await;
        assert_eq!(status, StatusCode::OK);
        if view["state"] == "completed" || view["state"] == "failed" {
            return view;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("task {task} did not finish within timeout");
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/queue/stats")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let token = mint_jwt(tenant_id, vec![Role::reviewer()]);

    let (status, body) = get_json(&reqwest::Client::new(), srv.url("/whoami"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "reviewer"));
}

#[tokio::test]
async fn queue_stats_cover_all_four_queues() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(TenantId::new(), vec![Role::recruiter()]);
    let client = reqwest::Client::new();

    let (status, stats) = get_json(&client, srv.url("/queue/stats"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let mut names: Vec<&str> = stats
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["queueName"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["email", "image-generation", "publication", "text-generation"]);

    let (status, _) = get_json(
        &client,
        srv.url(&format!("/queue/job/reports/{}", uuid::Uuid::now_v7())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get_json(
        &client,
        srv.url(&format!("/queue/job/email/{}", uuid::Uuid::now_v7())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn generation_returns_a_handle_and_completes_in_background() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(TenantId::new(), vec![Role::recruiter()]);
    let client = reqwest::Client::new();
    let job_id = seed_job(&srv, &client, &token).await;

    let (status, handle) = post_json(
        &client,
        srv.url(&format!("/jobs/{job_id}/generate/text")),
        &token,
        json!({ "prompt": "friendly tone" }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(handle["queueName"], "text-generation");

    let view = wait_for_task(&srv, &client, &token, &handle).await;
    assert_eq!(view["state"], "completed");
    assert_eq!(view["progress"], 100);
    assert_eq!(view["result"]["version"], 1);
    assert_eq!(view["attemptsMade"], 1);

    let (_, job) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &token).await;
    assert_eq!(job["status"], "GENERATED");
}

#[tokio::test]
async fn full_lifecycle_generate_approve_publish_stop() {
    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let recruiter = mint_jwt(tenant, vec![Role::recruiter()]);
    let reviewer = mint_jwt(tenant, vec![Role::reviewer()]);
    let admin = mint_jwt(tenant, vec![Role::admin()]);
    let client = reqwest::Client::new();
    let job_id = seed_job(&srv, &client, &recruiter).await;

    for kind in ["text", "image"] {
        let (_, handle) = post_json(
            &client,
            srv.url(&format!("/jobs/{job_id}/generate/{kind}")),
            &recruiter,
            json!({}),
        )
        .await;
        assert_eq!(wait_for_task(&srv, &client, &recruiter, &handle).await["state"], "completed");
    }

    let (status, approval) = post_json(
        &client,
        srv.url(&format!("/jobs/{job_id}/submit-approval")),
        &recruiter,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(approval["status"], "PENDING");
    let approval_id = approval["id"].as_str().unwrap().to_string();

    // recruiters cannot decide
    let (status, _) = post_json(
        &client,
        srv.url(&format!("/approvals/{approval_id}/approve")),
        &recruiter,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, decided) = post_json(
        &client,
        srv.url(&format!("/approvals/{approval_id}/approve")),
        &reviewer,
        json!({ "comment": "looks good" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "APPROVED");

    let (status, body) = post_json(
        &client,
        srv.url(&format!("/approvals/{approval_id}/approve")),
        &reviewer,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let (status, connector) = post_json(
        &client,
        srv.url("/connectors"),
        &admin,
        json!({ "name": "Sandbox", "type": "dummy" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, queued) = post_json(
        &client,
        srv.url(&format!("/jobs/{job_id}/publish")),
        &recruiter,
        json!({ "connectorId": connector["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let publication_id = queued["publicationId"].as_str().unwrap().to_string();
    assert_eq!(wait_for_task(&srv, &client, &recruiter, &queued).await["state"], "completed");

    let (_, publication) =
        get_json(&client, srv.url(&format!("/publications/{publication_id}")), &recruiter).await;
    assert_eq!(publication["status"], "PUBLISHED");
    let (_, job) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &recruiter).await;
    assert_eq!(job["status"], "PUBLISHED");

    let (status, stopped) = post_json(
        &client,
        srv.url(&format!("/publications/{publication_id}/stop")),
        &recruiter,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stopped["status"], "STOPPED");

    let (_, logs) = get_json(
        &client,
        srv.url(&format!("/publications/{publication_id}/logs")),
        &recruiter,
    )
    .await;
    assert_eq!(logs["items"].as_array().unwrap().len(), 2);
    let (_, job) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &recruiter).await;
    assert_eq!(job["status"], "STOPPED");
}

/// Approved job published through a connector that always refuses. Returns
/// the job id and the publish response once the task has failed.
async fn refused_publication(
    srv: &TestServer,
    client: &reqwest::Client,
    admin: &str,
) -> (String, Value) {
    let job_id = seed_job(srv, client, admin).await;

    let (_, approval) = post_json(
        client,
        srv.url(&format!("/jobs/{job_id}/submit-approval")),
        admin,
        json!({}),
    )
    .await;
    let approval_id = approval["id"].as_str().unwrap();
    let (status, _) = post_json(
        client,
        srv.url(&format!("/approvals/{approval_id}/approve")),
        admin,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, connector) = post_json(
        client,
        srv.url("/connectors"),
        admin,
        json!({ "name": "Picky", "type": "dummy", "config": { "mode": "reject", "error": "x" } }),
    )
    .await;
    let (_, queued) = post_json(
        client,
        srv.url(&format!("/jobs/{job_id}/publish")),
        admin,
        json!({ "connectorId": connector["id"] }),
    )
    .await;

    let view = wait_for_task(srv, client, admin, &queued).await;
    assert_eq!(view["state"], "failed");
    assert_eq!(view["attemptsMade"], 1);
    (job_id, queued)
}

#[tokio::test]
async fn refused_publication_lands_in_failed_list_and_can_be_retried() {
    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let admin = mint_jwt(tenant, vec![Role::admin()]);
    let client = reqwest::Client::new();
    let (job_id, queued) = refused_publication(&srv, &client, &admin).await;

    let publication_id = queued["publicationId"].as_str().unwrap();
    let (_, publication) =
        get_json(&client, srv.url(&format!("/publications/{publication_id}")), &admin).await;
    assert_eq!(publication["status"], "FAILED");
    let (_, job) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &admin).await;
    assert_eq!(job["status"], "APPROVED");

    let (_, failed) = get_json(&client, srv.url("/queue/failed/publication"), &admin).await;
    assert!(
        failed["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == queued["taskId"])
    );

    let task_id = queued["taskId"].as_str().unwrap();
    let recruiter = mint_jwt(tenant, vec![Role::recruiter()]);
    let (status, _) = post_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}/retry")),
        &recruiter,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}/retry")),
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn queue_endpoints_hide_other_tenants_tasks() {
    let srv = TestServer::spawn().await;
    let owner = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let client = reqwest::Client::new();
    let (_, queued) = refused_publication(&srv, &client, &owner).await;
    let task_id = queued["taskId"].as_str().unwrap();
    let publication_id = queued["publicationId"].as_str().unwrap();

    let intruder = TenantId::new();
    let intruder_recruiter = mint_jwt(intruder, vec![Role::recruiter()]);
    let intruder_admin = mint_jwt(intruder, vec![Role::admin()]);

    let (status, body) = get_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}")),
        &intruder_recruiter,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(body.get("result").is_none());

    let (status, failed) =
        get_json(&client, srv.url("/queue/failed/publication"), &intruder_admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(failed["items"].as_array().unwrap().is_empty());

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}/retry")),
        &intruder_recruiter,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = post_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}/retry")),
        &intruder_admin,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // The owner's task was not re-run.
    let (_, view) = get_json(
        &client,
        srv.url(&format!("/queue/job/publication/{task_id}")),
        &owner,
    )
    .await;
    assert_eq!(view["state"], "failed");
    let (_, logs) = get_json(
        &client,
        srv.url(&format!("/publications/{publication_id}/logs")),
        &owner,
    )
    .await;
    assert_eq!(logs["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tenant_isolation_blocks_cross_tenant_reads_and_writes() {
    let srv = TestServer::spawn().await;
    let token1 = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let token2 = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let client = reqwest::Client::new();
    let job_id = seed_job(&srv, &client, &token1).await;

    let (status, _) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &token2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(
        &client,
        srv.url(&format!("/jobs/{job_id}/generate/text")),
        &token2,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/jobs/{job_id}/submit-approval")),
        &token2,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, job) = get_json(&client, srv.url(&format!("/jobs/{job_id}")), &token1).await;
    assert_eq!(job["status"], "DRAFT");
}

#[tokio::test]
async fn email_endpoint_validates_before_enqueue() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(TenantId::new(), vec![Role::recruiter()]);
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/notifications/email"),
        &token,
        json!({ "to": "nobody", "subject": "Hi", "body": "..." }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, handle) = post_json(
        &client,
        srv.url("/notifications/email"),
        &token,
        json!({ "to": "a@b.test", "subject": "Hi {{name}}", "body": "Hello", "data": { "name": "Ada" } }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(wait_for_task(&srv, &client, &token, &handle).await["state"], "completed");
}

#[tokio::test]
async fn connector_types_and_connection_test() {
    let srv = TestServer::spawn().await;
    let admin = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, srv.url("/connectors/types"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["types"], json!(["dummy", "indeed", "stepstone"]));

    let (status, _) = post_json(
        &client,
        srv.url("/connectors"),
        &admin,
        json!({ "name": "Mystery", "type": "monster" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, connector) = post_json(
        &client,
        srv.url("/connectors"),
        &admin,
        json!({ "name": "Sandbox", "type": "dummy" }),
    )
    .await;
    let id = connector["id"].as_str().unwrap();
    let (status, result) =
        post_json(&client, srv.url(&format!("/connectors/{id}/test")), &admin, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["ok"], true);
    assert_eq!(result["type"], "dummy");

    let recruiter = mint_jwt(TenantId::new(), vec![Role::recruiter()]);
    let (status, _) = post_json(
        &client,
        srv.url("/connectors"),
        &recruiter,
        json!({ "name": "Sandbox", "type": "dummy" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inbound_event_fans_out_to_webhooks_and_customer_email() {
    use axum::{Router, body::Bytes, http::HeaderMap, routing::post};
    use std::sync::Mutex;

    let received: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
    let sink = received.clone();
    let receiver = Router::new().route(
        "/hook",
        post(move |headers: HeaderMap, body: Bytes| {
            let sink = sink.clone();
            async move {
                let event = headers
                    .get("X-Webhook-Event")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                sink.lock().unwrap().push((event, body));
                "ok"
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let hook_addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, receiver).await.unwrap() });

    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let admin = mint_jwt(tenant, vec![Role::admin()]);
    let client = reqwest::Client::new();
    let job_id = seed_job(&srv, &client, &admin).await;

    let (status, _) = post_json(
        &client,
        srv.url("/webhooks"),
        &admin,
        json!({
            "url": format!("http://{hook_addr}/hook"),
            "secret": "s3cret",
            "events": ["inbound.indeed.application.received"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &client,
        srv.url("/webhooks/inbound/indeed"),
        &admin,
        json!({ "event": "application.received", "jobId": job_id, "data": { "candidate": "Ada" } }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["event"], "inbound.indeed.application.received");
    assert_eq!(body["webhooksDispatched"], true);

    let email = wait_for_task(&srv, &client, &admin, &body["email"]).await;
    assert_eq!(email["state"], "completed");
    assert_eq!(email["result"]["to"], "hr@acme.test");

    let mut delivered = None;
    for _ in 0..200 {
        if let Some(first) = received.lock().unwrap().first().cloned() {
            delivered = Some(first);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let (event, payload) = delivered.expect("webhook was not delivered");
    assert_eq!(event, "inbound.indeed.application.received");
    assert_eq!(payload["data"]["payload"]["candidate"], "Ada");
    assert_eq!(payload["data"]["jobId"], job_id.as_str());

    // another tenant cannot attach events to this job
    let outsider = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let (status, _) = post_json(
        &client,
        srv.url("/webhooks/inbound/indeed"),
        &outsider,
        json!({ "event": "application.received", "jobId": job_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(
        &client,
        srv.url("/webhooks/inbound/Indeed%20Jobs"),
        &admin,
        json!({ "event": "application.received" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

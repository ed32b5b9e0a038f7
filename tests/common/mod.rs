#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ADMIN_EMAIL: &str = "admin@jobboard.test";
pub const PASSWORD: &str = "password123";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let upload_dir = std::env::temp_dir().join(format!("jobboard-it-{}", port));

        // In-memory store keeps every test binary independent of PostgreSQL
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_jobboard"));
        cmd.args(["serve", "--memory"])
            .env("APP_ENV", "development")
            .env("JOBBOARD_PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("ADMIN_EMAILS", ADMIN_EMAIL)
            .env("UPLOAD_DIR", &upload_dir)
            .env("UPLOAD_MAX_RESUME_BYTES", "65536")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@jobboard.test", prefix, uuid::Uuid::new_v4().simple())
}

pub async fn register_as(server: &TestServer, email: &str, role: &str) -> Result<Session> {
    let res = Client::new()
        .post(server.url("/api/auth/register"))
        .json(&json!({"email": email, "password": PASSWORD, "name": "Test User", "role": role}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let body: Value = res.json().await?;
    Ok(Session {
        id: body["data"]["user"]["_id"].as_str().context("user id")?.to_string(),
        email: email.to_string(),
        token: body["data"]["token"].as_str().context("token")?.to_string(),
    })
}

pub async fn register(server: &TestServer, role: &str) -> Result<Session> {
    register_as(server, &unique_email(role), role).await
}

pub async fn create_company(server: &TestServer, owner: &Session, name: &str) -> Result<String> {
    let res = Client::new()
        .post(server.url("/api/company"))
        .bearer_auth(&owner.token)
        .json(&json!({"name": name, "location": "Berlin", "website": "https://example.com"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create company failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"]["_id"].as_str().context("company id")?.to_string())
}

/// Posts a job; `overrides` are merged over a valid default body.
pub async fn create_job(server: &TestServer, session: &Session, company: &str, overrides: Value) -> Result<Value> {
    let mut body = json!({
        "company": company,
        "title": "Backend Engineer",
        "description": "Build APIs in Rust",
        "location": "Berlin",
        "jobType": "full-time",
        "experienceLevel": "mid",
        "salaryMin": 50000,
        "salaryMax": 70000,
        "skills": ["Rust", "SQL"]
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }

    let res = Client::new()
        .post(server.url("/api/jobs"))
        .bearer_auth(&session.token)
        .json(&body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create job failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}

pub fn resume_form(job: &str) -> Result<multipart::Form> {
    let resume = multipart::Part::bytes(b"%PDF-1.4 integration resume".to_vec())
        .file_name("resume.pdf")
        .mime_str("application/pdf")?;
    Ok(multipart::Form::new()
        .text("job", job.to_string())
        .text("coverLetter", "I would love to work with you.")
        .text("portfolioLinks", "https://github.com/example")
        .part("resume", resume))
}

pub async fn apply(server: &TestServer, applicant: &Session, job: &str) -> Result<reqwest::Response> {
    Ok(Client::new()
        .post(server.url("/api/applications"))
        .bearer_auth(&applicant.token)
        .multipart(resume_form(job)?)
        .send()
        .await?)
}

mod common;

use anyhow::Result;
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

struct Fixture {
    server: &'static common::TestServer,
    owner: common::Session,
    seeker: common::Session,
    company: String,
    job_id: String,
}

async fn fixture() -> Result<Fixture> {
    let server = common::ensure_server().await?;
    let owner = common::register(server, "employer").await?;
    let seeker = common::register(server, "jobseeker").await?;
    let company = common::create_company(server, &owner, "Hiring Co").await?;
    let job = common::create_job(server, &owner, &company, json!({})).await?;
    Ok(Fixture {
        server,
        owner,
        seeker,
        company,
        job_id: job["_id"].as_str().unwrap().to_string(),
    })
}

async fn submit(f: &Fixture) -> Result<String> {
    let res = common::apply(f.server, &f.seeker, &f.job_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    Ok(body["data"]["_id"].as_str().unwrap().to_string())
}

async fn set_status(f: &Fixture, application: &str, status: &str) -> Result<reqwest::Response> {
    Ok(Client::new()
        .patch(f.server.url(&format!("/api/applications/{}/status", application)))
        .bearer_auth(&f.owner.token)
        .json(&json!({"status": status, "note": format!("moved to {}", status)}))
        .send()
        .await?)
}

#[tokio::test]
async fn submission_records_resume_and_counts() -> Result<()> {
    let f = fixture().await?;
    let res = common::apply(f.server, &f.seeker, &f.job_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["timeline"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["resume"]["contentType"], "application/pdf");
    assert_eq!(body["data"]["resume"]["checksum"].as_str().unwrap().len(), 64);
    assert_eq!(body["data"]["portfolioLinks"], json!(["https://github.com/example"]));

    // One application per job
    let res = common::apply(f.server, &f.seeker, &f.job_id).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let job: Value = reqwest::get(f.server.url(&format!("/api/jobs/{}", f.job_id))).await?.json().await?;
    assert_eq!(job["data"]["applicationCount"], 1);
    Ok(())
}

#[tokio::test]
async fn submission_is_validated() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let url = f.server.url("/api/applications");

    // Employers cannot apply
    let res = common::apply(f.server, &f.owner, &f.job_id).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Resume is required
    let form = multipart::Form::new().text("job", f.job_id.clone());
    let res = client.post(&url).bearer_auth(&f.seeker.token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["fieldErrors"]["resume"].is_string());

    // Only PDF, DOC and DOCX
    let part = multipart::Part::bytes(b"hello".to_vec()).file_name("notes.txt").mime_str("text/plain")?;
    let form = multipart::Form::new().text("job", f.job_id.clone()).part("resume", part);
    let res = client.post(&url).bearer_auth(&f.seeker.token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Oversized resume
    let part = multipart::Part::bytes(vec![b'%'; 70_000]).file_name("big.pdf").mime_str("application/pdf")?;
    let form = multipart::Form::new().text("job", f.job_id.clone()).part("resume", part);
    let res = client.post(&url).bearer_auth(&f.seeker.token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // Bad portfolio link
    let form = common::resume_form(&f.job_id)?.text("portfolioLinks", "ftp://files.example.com");
    let res = client.post(&url).bearer_auth(&f.seeker.token).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Closed jobs do not accept applications
    let res = client
        .patch(f.server.url(&format!("/api/jobs/{}/status", f.job_id)))
        .bearer_auth(&f.owner.token)
        .json(&json!({"status": "closed"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = common::apply(f.server, &f.seeker, &f.job_id).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn repeated_portfolio_link_fields_are_merged() -> Result<()> {
    let f = fixture().await?;
    let form = common::resume_form(&f.job_id)?
        .text("portfolioLinks", "https://gitlab.com/second, https://blog.example.com/third")
        .text("portfolioLinks", r#"["https://example.org/fourth"]"#);
    let res = Client::new()
        .post(f.server.url("/api/applications"))
        .bearer_auth(&f.seeker.token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(
        body["data"]["portfolioLinks"],
        json!([
            "https://github.com/example",
            "https://gitlab.com/second",
            "https://blog.example.com/third",
            "https://example.org/fourth"
        ])
    );
    Ok(())
}

#[tokio::test]
async fn passed_deadline_closes_an_active_job() -> Result<()> {
    let f = fixture().await?;
    let deadline = chrono::Utc::now() + chrono::Duration::seconds(2);
    let job = common::create_job(
        f.server,
        &f.owner,
        &f.company,
        json!({"title": "Short window", "applicationDeadline": deadline.to_rfc3339()}),
    )
    .await?;
    let job_id = job["_id"].as_str().unwrap();
    assert_eq!(job["status"], "active");

    tokio::time::sleep(std::time::Duration::from_millis(3000)).await;

    let res = common::apply(f.server, &f.seeker, job_id).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn read_only_member_cannot_manage_or_download() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let application = submit(&f).await?;

    let team_url = f.server.url(&format!("/api/company/{}/team", f.company));
    let member = common::register(f.server, "employer").await?;
    let recruiter = common::register(f.server, "employer").await?;
    for (who, role) in [(&member, "member"), (&recruiter, "recruiter")] {
        let res = client
            .post(&team_url)
            .bearer_auth(&f.owner.token)
            .json(&json!({"email": who.email, "role": role}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let url = f.server.url(&format!("/api/applications/{}", application));

    // Members may read the application itself
    let res = client.get(&url).bearer_auth(&member.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(format!("{}/status", url))
        .bearer_auth(&member.token)
        .json(&json!({"status": "reviewed"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/notes", url))
        .bearer_auth(&member.token)
        .json(&json!({"body": "Looks good"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(format!("{}/resume", url)).bearer_auth(&member.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Hiring roles and the applicant still get the file
    for token in [&recruiter.token, &f.seeker.token] {
        let res = client.get(format!("{}/resume", url)).bearer_auth(token).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let body: Value = client.get(&url).bearer_auth(&f.owner.token).send().await?.json().await?;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["notes"], json!([]));
    Ok(())
}

#[tokio::test]
async fn lifecycle_moves_forward_and_ends_at_terminal_states() -> Result<()> {
    let f = fixture().await?;
    let application = submit(&f).await?;

    assert_eq!(set_status(&f, &application, "reviewed").await?.status(), StatusCode::OK);
    // Skipping ahead is allowed
    assert_eq!(set_status(&f, &application, "interview").await?.status(), StatusCode::OK);
    // Going back is not
    let res = set_status(&f, &application, "shortlisted").await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    // Same status is rejected
    assert_eq!(set_status(&f, &application, "interview").await?.status(), StatusCode::CONFLICT);
    // Managers cannot withdraw for the applicant
    assert_eq!(set_status(&f, &application, "withdrawn").await?.status(), StatusCode::CONFLICT);

    let res = set_status(&f, &application, "accepted").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let timeline = body["data"]["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 4);
    assert_eq!(timeline[3]["status"], "accepted");
    assert_eq!(timeline[3]["note"], "moved to accepted");

    assert_eq!(set_status(&f, &application, "rejected").await?.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn applicant_withdraws_and_cannot_change_status() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let application = submit(&f).await?;

    let res = client
        .patch(f.server.url(&format!("/api/applications/{}/status", application)))
        .bearer_auth(&f.seeker.token)
        .json(&json!({"status": "accepted"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let withdraw_url = f.server.url(&format!("/api/applications/{}/withdraw", application));
    let res = client.post(&withdraw_url).bearer_auth(&f.owner.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.post(&withdraw_url).bearer_auth(&f.seeker.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "withdrawn");

    let res = client.post(&withdraw_url).bearer_auth(&f.seeker.token).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(set_status(&f, &application, "reviewed").await?.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn notes_stay_internal() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let application = submit(&f).await?;
    let url = f.server.url(&format!("/api/applications/{}", application));

    let res = client
        .post(format!("{}/notes", url))
        .bearer_auth(&f.owner.token)
        .json(&json!({"body": "Strong systems background"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/notes", url))
        .bearer_auth(&f.seeker.token)
        .json(&json!({"body": "Please hire me"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let team: Value = client.get(&url).bearer_auth(&f.owner.token).send().await?.json().await?;
    assert_eq!(team["data"]["notes"].as_array().unwrap().len(), 1);
    assert_eq!(team["data"]["applicantInfo"]["email"], f.seeker.email.as_str());

    let own: Value = client.get(&url).bearer_auth(&f.seeker.token).send().await?.json().await?;
    assert_eq!(own["data"]["notes"], json!([]));
    assert!(own["data"].get("applicantInfo").is_none());

    let stranger = common::register(f.server, "employer").await?;
    let res = client.get(&url).bearer_auth(&stranger.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn job_applicant_list_and_resume_download() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let application = submit(&f).await?;

    let list_url = f.server.url(&format!("/api/jobs/{}/applications", f.job_id));
    let body: Value = client.get(&list_url).bearer_auth(&f.owner.token).send().await?.json().await?;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["applicantInfo"]["email"], f.seeker.email.as_str());

    let body: Value = client
        .get(format!("{}?status=accepted", list_url))
        .bearer_auth(&f.owner.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["total"], 0);

    let res = client.get(&list_url).bearer_auth(&f.seeker.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let resume_url = f.server.url(&format!("/api/applications/{}/resume", application));
    let res = client.get(&resume_url).bearer_auth(&f.owner.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(res.bytes().await?.as_ref(), b"%PDF-1.4 integration resume");

    let mine: Value = client
        .get(f.server.url("/api/applications/mine"))
        .bearer_auth(&f.seeker.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(mine["data"][0]["jobTitle"], "Backend Engineer");
    assert_eq!(mine["data"][0]["companyName"], "Hiring Co");
    Ok(())
}

#[tokio::test]
async fn profile_round_trip() -> Result<()> {
    let f = fixture().await?;
    let client = Client::new();
    let url = f.server.url("/api/profile");

    let empty: Value = client.get(&url).bearer_auth(&f.seeker.token).send().await?.json().await?;
    assert_eq!(empty["data"]["skills"], json!([]));

    let res = client
        .put(&url)
        .bearer_auth(&f.seeker.token)
        .json(&json!({
            "headline": "Rust developer",
            "skills": ["Rust", "Tokio"],
            "experience": [{"title": "Engineer", "company": "Initech", "startDate": "2020-01-01"}],
            "education": [{"school": "TU Berlin", "graduationYear": 2019}],
            "portfolioLinks": ["https://github.com/example"]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(&url)
        .bearer_auth(&f.seeker.token)
        .json(&json!({
            "experience": [{"title": "Engineer", "company": "Initech", "startDate": "2020-01-01", "endDate": "2019-01-01"}]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let saved: Value = client.get(&url).bearer_auth(&f.seeker.token).send().await?.json().await?;
    assert_eq!(saved["data"]["headline"], "Rust developer");
    assert_eq!(saved["data"]["experience"][0]["company"], "Initech");

    let res = client.get(&url).bearer_auth(&f.owner.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

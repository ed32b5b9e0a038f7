mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn only_employers_create_companies() -> Result<()> {
    let server = common::ensure_server().await?;
    let seeker = common::register(server, "jobseeker").await?;

    let res = Client::new()
        .post(server.url("/api/company"))
        .bearer_auth(&seeker.token)
        .json(&json!({"name": "Nope Inc"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn company_profile_is_public_but_team_is_not() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = Client::new();
    let owner = common::register(server, "employer").await?;
    let outsider = common::register(server, "employer").await?;
    let company = common::create_company(server, &owner, "Acme").await?;

    let public: Value = reqwest::get(server.url(&format!("/api/company/{}", company)))
        .await?
        .json()
        .await?;
    assert_eq!(public["data"]["name"], "Acme");
    assert!(public["data"].get("owner").is_none());
    assert!(public["data"].get("teamMembers").is_none());

    for path in ["team", "jobs"] {
        let res = client
            .get(server.url(&format!("/api/company/{}/{}", company, path)))
            .bearer_auth(&outsider.token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", path);
    }

    let res = client
        .put(server.url(&format!("/api/company/{}", company)))
        .bearer_auth(&outsider.token)
        .json(&json!({"name": "Hijacked"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let mine: Value = client
        .get(server.url("/api/company/mine"))
        .bearer_auth(&owner.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn team_roles_drive_permissions() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = Client::new();
    let owner = common::register(server, "employer").await?;
    let recruiter = common::register(server, "employer").await?;
    let viewer = common::register(server, "employer").await?;
    let company = common::create_company(server, &owner, "Globex").await?;
    let team_url = server.url(&format!("/api/company/{}/team", company));

    for (member, role) in [(&recruiter, "recruiter"), (&viewer, "member")] {
        let res = client
            .post(&team_url)
            .bearer_auth(&owner.token)
            .json(&json!({"email": member.email, "role": role}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Duplicates and the owner cannot be added again
    for email in [&recruiter.email, &owner.email] {
        let res = client
            .post(&team_url)
            .bearer_auth(&owner.token)
            .json(&json!({"email": email, "role": "hr"}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    let res = client
        .post(&team_url)
        .bearer_auth(&owner.token)
        .json(&json!({"email": common::unique_email("ghost"), "role": "hr"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let team: Value = client.get(&team_url).bearer_auth(&viewer.token).send().await?.json().await?;
    let members = team["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0]["role"], "owner");

    // Recruiter posts jobs but cannot manage the team
    common::create_job(server, &recruiter, &company, json!({})).await?;
    let res = client
        .post(&team_url)
        .bearer_auth(&recruiter.token)
        .json(&json!({"email": common::unique_email("x"), "role": "hr"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Plain members only read
    let res = client
        .post(server.url("/api/jobs"))
        .bearer_auth(&viewer.token)
        .json(&json!({"company": company, "title": "T", "description": "D", "jobType": "contract"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let jobs: Value = client
        .get(server.url(&format!("/api/company/{}/jobs", company)))
        .bearer_auth(&viewer.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(jobs["data"]["total"], 1);

    // Promote the viewer to admin, who can then manage the team
    let res = client
        .patch(format!("{}/{}", team_url, viewer.id))
        .bearer_auth(&owner.token)
        .json(&json!({"role": "admin"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/{}", team_url, recruiter.id))
        .bearer_auth(&viewer.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 2);

    let res = client
        .delete(format!("{}/{}", team_url, owner.id))
        .bearer_auth(&viewer.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invalid_team_role_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner = common::register(server, "employer").await?;
    let other = common::register(server, "employer").await?;
    let company = common::create_company(server, &owner, "Initech").await?;

    let res = Client::new()
        .post(server.url(&format!("/api/company/{}/team", company)))
        .bearer_auth(&owner.token)
        .json(&json!({"email": other.email, "role": "overlord"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["fieldErrors"]["role"].is_string());
    Ok(())
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hiredesk_app::{Applicant, Application, ApplicationId, Backend, JobPosting, Resource, Resume};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const HEALTH_PATH: &str = "management/health";

#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
    http: HttpClient,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url {base_url} must use http or https -- for example http://localhost:8080"
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            token: None,
            timeout,
            http,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join(HEALTH_PATH)
            .context("build health URL")?;
        let response = self.send(self.request(Method::GET, url))?;
        response.bytes().context("read health response")?;
        Ok(())
    }

    fn endpoint(&self, resource: Resource, id: Option<i64>) -> Result<Url> {
        let path = match id {
            Some(id) => format!("{}/{id}", resource.api_path()),
            None => resource.api_path().to_owned(),
        };
        self.base_url
            .join(&path)
            .with_context(|| format!("build URL for {}", resource.label()))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }

    fn fetch<T: DeserializeOwned>(&self, resource: Resource, id: Option<i64>) -> Result<T> {
        let url = self.endpoint(resource, id)?;
        tracing::debug!(%url, "GET");
        let response = self.send(self.request(Method::GET, url))?;
        response
            .json()
            .with_context(|| format!("decode {} response", resource.label()))
    }

    fn save(&self, method: Method, url: Url, application: &Application) -> Result<Application> {
        tracing::debug!(%method, %url, "saving application");
        let response = self.send(self.request(method, url).json(application))?;
        response.json().context("decode saved application")
    }
}

impl Backend for RestClient {
    fn get_application(&self, id: ApplicationId) -> Result<Application> {
        self.fetch(Resource::Application, Some(id.get()))
            .with_context(|| format!("load application {id}"))
    }

    fn list_applications(&self) -> Result<Vec<Application>> {
        self.fetch(Resource::Application, None)
            .context("load applications")
    }

    fn create_application(&self, application: &Application) -> Result<Application> {
        if let Some(id) = application.application_id {
            bail!("application {id} already exists -- update it instead of creating it");
        }
        let url = self.endpoint(Resource::Application, None)?;
        self.save(Method::POST, url, application)
            .context("create application")
    }

    fn update_application(&self, application: &Application) -> Result<Application> {
        let id = application.application_id.ok_or_else(|| {
            anyhow!("cannot update an application without an id -- create it instead")
        })?;
        let url = self.endpoint(Resource::Application, Some(id.get()))?;
        self.save(Method::PUT, url, application)
            .with_context(|| format!("update application {id}"))
    }

    fn list_resumes(&self) -> Result<Vec<Resume>> {
        self.fetch(Resource::Resume, None).context("load resumes")
    }

    fn list_job_postings(&self) -> Result<Vec<JobPosting>> {
        self.fetch(Resource::JobPosting, None)
            .context("load job postings")
    }

    fn list_applicants(&self) -> Result<Vec<Applicant>> {
        self.fetch(Resource::Applicant, None)
            .context("load applicants")
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {base_url} timed out -- raise [api].timeout or check the server ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- is the server running? check [api].base_url ({error})")
}

#[derive(Debug, Deserialize)]
struct ProblemEnvelope {
    detail: Option<String>,
    title: Option<String>,
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(problem) = serde_json::from_str::<ProblemEnvelope>(body)
        && let Some(text) = [problem.detail, problem.title, problem.message]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    {
        return anyhow!("server error ({}): {}", status.as_u16(), text);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "server refused the request ({}) -- set [api].token to a valid bearer token",
            status.as_u16()
        );
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{RestClient, clean_error_response};
    use hiredesk_app::Resource;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn endpoints_join_under_base_path() {
        let client = RestClient::new("http://localhost:8080/hr/", Duration::from_secs(1))
            .expect("client should initialize");
        assert_eq!(client.base_url(), "http://localhost:8080/hr");
        let url = client
            .endpoint(Resource::JobPosting, Some(3))
            .expect("endpoint should build");
        assert_eq!(url.as_str(), "http://localhost:8080/hr/api/job-postings/3");
    }

    #[test]
    fn base_url_must_be_http() {
        let error = RestClient::new("ftp://example.com", Duration::from_secs(1))
            .expect_err("ftp should be rejected");
        assert!(error.to_string().contains("http or https"));
        assert!(RestClient::new("  ", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn problem_details_prefer_detail_text() {
        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"title":"Bad Request","detail":"Invalid ID","message":"error.idnull"}"#,
        );
        assert_eq!(error.to_string(), "server error (400): Invalid ID");
    }

    #[test]
    fn unauthorized_without_body_points_at_token() {
        let error = clean_error_response(StatusCode::UNAUTHORIZED, "");
        assert!(error.to_string().contains("[api].token"));
    }

    #[test]
    fn opaque_bodies_fall_back_to_status() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, "{not json");
        assert_eq!(error.to_string(), "server returned 502");
    }

    #[test]
    fn blank_token_is_ignored() {
        let client = RestClient::new("http://localhost:8080", Duration::from_secs(1))
            .expect("client should initialize")
            .with_token("  ");
        assert!(client.token.is_none());
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hiredesk_app::{
    Applicant, ApplicantId, Application, ApplicationId, Backend, ExtraFields, JobId, JobPosting,
    Resume, ResumeId,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::macros::datetime;

const RESUME_FILES: [&str; 3] = ["avery-walker.pdf", "jordan-hill.pdf", "riley-lopez.docx"];
const JOB_TITLES: [&str; 2] = ["Backend Engineer", "Site Reliability Engineer"];
const APPLICANT_NAMES: [&str; 2] = ["Avery Walker", "Jordan Hill"];

pub const FIRST_RESUME_ID: i64 = 1;
pub const FIRST_JOB_ID: i64 = 10;
pub const FIRST_APPLICANT_ID: i64 = 100;

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("hiredesk.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> OffsetDateTime {
    datetime!(2026-02-19 12:34 UTC)
}

fn attribute(key: &str, value: &str) -> ExtraFields {
    let mut extra = ExtraFields::new();
    extra.insert(key.to_owned(), json!(value));
    extra
}

pub fn sample_resumes() -> Vec<Resume> {
    RESUME_FILES
        .iter()
        .zip(FIRST_RESUME_ID..)
        .map(|(file, id)| Resume {
            resume_id: ResumeId::new(id),
            extra: attribute("fileName", file),
        })
        .collect()
}

pub fn sample_job_postings() -> Vec<JobPosting> {
    JOB_TITLES
        .iter()
        .zip(FIRST_JOB_ID..)
        .map(|(title, id)| JobPosting {
            job_id: JobId::new(id),
            extra: attribute("title", title),
        })
        .collect()
}

pub fn sample_applicants() -> Vec<Applicant> {
    APPLICANT_NAMES
        .iter()
        .zip(FIRST_APPLICANT_ID..)
        .map(|(name, id)| Applicant {
            applicant_id: ApplicantId::new(id),
            extra: attribute("fullName", name),
        })
        .collect()
}

pub fn sample_application(id: i64) -> Application {
    Application {
        application_id: Some(ApplicationId::new(id)),
        application_date: Some(fixture_datetime()),
        resume: sample_resumes().into_iter().next(),
        job_posting: sample_job_postings().into_iter().next(),
        applicant: sample_applicants().into_iter().next(),
        extra: attribute("status", "SUBMITTED"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Get(ApplicationId),
    ListApplications,
    Create(Application),
    Update(Application),
    ListResumes,
    ListJobPostings,
    ListApplicants,
}

#[derive(Debug, Default)]
struct RecordingState {
    applications: Vec<Application>,
    calls: Vec<BackendCall>,
    next_id: i64,
    failure: Option<String>,
}

#[derive(Debug)]
pub struct RecordingBackend {
    state: Mutex<RecordingState>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::with_applications(Vec::new())
    }
}

impl RecordingBackend {
    pub fn with_applications(applications: Vec<Application>) -> Self {
        let next_id = applications
            .iter()
            .filter_map(|app| app.application_id.map(ApplicationId::get))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Mutex::new(RecordingState {
                applications,
                next_id,
                ..RecordingState::default()
            }),
        }
    }

    // Every following call fails with `message` until cleared.
    pub fn fail_with(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_owned);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn applications(&self) -> Vec<Application> {
        self.lock().applications.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, call: BackendCall) -> Result<MutexGuard<'_, RecordingState>> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(message) = &state.failure {
            return Err(anyhow!("{message}"));
        }
        Ok(state)
    }
}

impl Backend for RecordingBackend {
    fn get_application(&self, id: ApplicationId) -> Result<Application> {
        let state = self.record(BackendCall::Get(id))?;
        state
            .applications
            .iter()
            .find(|app| app.application_id == Some(id))
            .cloned()
            .ok_or_else(|| anyhow!("server error (404): application {id} not found"))
    }

    fn list_applications(&self) -> Result<Vec<Application>> {
        let state = self.record(BackendCall::ListApplications)?;
        Ok(state.applications.clone())
    }

    fn create_application(&self, application: &Application) -> Result<Application> {
        let mut state = self.record(BackendCall::Create(application.clone()))?;
        if application.application_id.is_some() {
            bail!("server error (400): A new application cannot already have an ID");
        }
        let created = Application {
            application_id: Some(ApplicationId::new(state.next_id)),
            ..application.clone()
        };
        state.next_id += 1;
        state.applications.push(created.clone());
        Ok(created)
    }

    fn update_application(&self, application: &Application) -> Result<Application> {
        let mut state = self.record(BackendCall::Update(application.clone()))?;
        let Some(id) = application.application_id else {
            bail!("server error (400): Invalid id");
        };
        let slot = state
            .applications
            .iter_mut()
            .find(|app| app.application_id == Some(id))
            .ok_or_else(|| anyhow!("server error (404): application {id} not found"))?;
        *slot = application.clone();
        Ok(application.clone())
    }

    fn list_resumes(&self) -> Result<Vec<Resume>> {
        self.record(BackendCall::ListResumes)?;
        Ok(sample_resumes())
    }

    fn list_job_postings(&self) -> Result<Vec<JobPosting>> {
        self.record(BackendCall::ListJobPostings)?;
        Ok(sample_job_postings())
    }

    fn list_applicants(&self) -> Result<Vec<Applicant>> {
        self.record(BackendCall::ListApplicants)?;
        Ok(sample_applicants())
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendCall, RecordingBackend, sample_application, sample_resumes};
    use anyhow::Result;
    use hiredesk_app::{Application, ApplicationId, Backend};

    #[test]
    fn fixtures_have_distinct_ids() {
        let ids = sample_resumes()
            .iter()
            .map(|resume| resume.resume_id)
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(ids.len(), sample_resumes().len());
    }

    #[test]
    fn recording_backend_assigns_ids_after_existing_ones() -> Result<()> {
        let backend = RecordingBackend::with_applications(vec![sample_application(4)]);
        let created = backend.create_application(&Application::default())?;
        assert_eq!(created.application_id, Some(ApplicationId::new(5)));
        assert_eq!(backend.applications().len(), 2);
        Ok(())
    }

    #[test]
    fn recording_backend_records_failed_calls_too() {
        let backend = RecordingBackend::default();
        backend.fail_with(Some("server error (500): boom"));
        let error = backend
            .list_applications()
            .expect_err("configured failure should surface");
        assert!(error.to_string().contains("boom"));
        assert_eq!(backend.calls(), vec![BackendCall::ListApplications]);
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::ids::*;

/// Attributes the server sent that no form edits. Kept so an update re-sends them.
pub type ExtraFields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub resume_id: ResumeId,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub job_id: JobId,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub applicant_id: ApplicantId,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Resume {
    pub fn new(resume_id: ResumeId) -> Self {
        Self {
            resume_id,
            extra: ExtraFields::new(),
        }
    }
}

impl JobPosting {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            extra: ExtraFields::new(),
        }
    }
}

impl Applicant {
    pub fn new(applicant_id: ApplicantId) -> Self {
        Self {
            applicant_id,
            extra: ExtraFields::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    #[serde(
        default,
        with = "crate::datetime::wire_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_date: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<Resume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_posting: Option<JobPosting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant: Option<Applicant>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Application {
    pub fn is_persisted(&self) -> bool {
        self.application_id.is_some()
    }

    pub fn resume_id(&self) -> Option<ResumeId> {
        self.resume.as_ref().map(|resume| resume.resume_id)
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.job_posting.as_ref().map(|posting| posting.job_id)
    }

    pub fn applicant_id(&self) -> Option<ApplicantId> {
        self.applicant.as_ref().map(|applicant| applicant.applicant_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Application,
    Resume,
    JobPosting,
    Applicant,
}

impl Resource {
    pub const REFERENCES: [Self; 3] = [Self::Resume, Self::JobPosting, Self::Applicant];

    pub const fn api_path(self) -> &'static str {
        match self {
            Self::Application => "api/applications",
            Self::Resume => "api/resumes",
            Self::JobPosting => "api/job-postings",
            Self::Applicant => "api/applicants",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Resume => "resume",
            Self::JobPosting => "job posting",
            Self::Applicant => "applicant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ApplicationList,
    ApplicationNew,
    ApplicationEdit(ApplicationId),
}

impl Route {
    pub const LIST_PATH: &'static str = "/application";

    pub fn path(self) -> String {
        match self {
            Self::ApplicationList => Self::LIST_PATH.to_owned(),
            Self::ApplicationNew => format!("{}/new", Self::LIST_PATH),
            Self::ApplicationEdit(id) => format!("{}/{id}/edit", Self::LIST_PATH),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.trim_end_matches('/').strip_prefix(Self::LIST_PATH)?;
        if rest.is_empty() {
            return Some(Self::ApplicationList);
        }
        let rest = rest.strip_prefix('/')?;
        if rest == "new" {
            return Some(Self::ApplicationNew);
        }
        let id = rest.strip_suffix("/edit")?;
        id.parse().ok().map(Self::ApplicationEdit)
    }

    pub const fn application_id(self) -> Option<ApplicationId> {
        match self {
            Self::ApplicationEdit(id) => Some(id),
            Self::ApplicationList | Self::ApplicationNew => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Application, Resume, Route};
    use crate::{ApplicationId, ResumeId};
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn application_decodes_wire_json_and_keeps_unknown_fields() {
        let value = json!({
            "applicationId": 3,
            "applicationDate": "2026-02-19T12:34:00Z",
            "resume": { "resumeId": 8, "fileName": "cv.pdf" },
            "jobPosting": null,
            "status": "SUBMITTED",
        });
        let application: Application = serde_json::from_value(value).expect("decode application");

        assert_eq!(application.application_id, Some(ApplicationId::new(3)));
        assert_eq!(
            application.application_date,
            Some(datetime!(2026-02-19 12:34 UTC))
        );
        assert_eq!(application.resume_id(), Some(ResumeId::new(8)));
        assert_eq!(application.job_posting, None);
        assert_eq!(application.extra.get("status"), Some(&json!("SUBMITTED")));
        let resume = application.resume.expect("resume present");
        assert_eq!(resume.extra.get("fileName"), Some(&json!("cv.pdf")));
    }

    #[test]
    fn absent_relations_are_omitted_on_the_wire() {
        let application = Application {
            resume: Some(Resume::new(ResumeId::new(1))),
            ..Application::default()
        };
        let value = serde_json::to_value(&application).expect("encode application");
        assert_eq!(value, json!({ "resume": { "resumeId": 1 } }));
    }

    #[test]
    fn routes_round_trip_through_paths() {
        for route in [
            Route::ApplicationList,
            Route::ApplicationNew,
            Route::ApplicationEdit(ApplicationId::new(42)),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/application/x/edit"), None);
        assert_eq!(Route::parse("/resume"), None);
    }
}

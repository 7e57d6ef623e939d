// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::fmt::Display;
use time::OffsetDateTime;

use crate::{
    Applicant, ApplicantId, Application, ApplicationId, DISPLAY_PLACEHOLDER, DisplayZone, JobId,
    JobPosting, Resource, Resume, ResumeId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Identifier,
    DateTime,
    Select(Resource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub read_only: bool,
    pub placeholder: Option<&'static str>,
}

pub const APPLICATION_ID_FIELD: FormFieldSpec = FormFieldSpec {
    name: "applicationId",
    label: "application id",
    kind: FieldKind::Identifier,
    required: true,
    read_only: true,
    placeholder: None,
};

pub const APPLICATION_DATE_FIELD: FormFieldSpec = FormFieldSpec {
    name: "applicationDate",
    label: "application date",
    kind: FieldKind::DateTime,
    required: false,
    read_only: false,
    placeholder: Some(DISPLAY_PLACEHOLDER),
};

pub const RESUME_FIELD: FormFieldSpec = FormFieldSpec {
    name: "resume",
    label: "resume",
    kind: FieldKind::Select(Resource::Resume),
    required: false,
    read_only: false,
    placeholder: None,
};

pub const JOB_POSTING_FIELD: FormFieldSpec = FormFieldSpec {
    name: "jobPosting",
    label: "job posting",
    kind: FieldKind::Select(Resource::JobPosting),
    required: false,
    read_only: false,
    placeholder: None,
};

pub const APPLICANT_FIELD: FormFieldSpec = FormFieldSpec {
    name: "applicant",
    label: "applicant",
    kind: FieldKind::Select(Resource::Applicant),
    required: false,
    read_only: false,
    placeholder: None,
};

pub fn application_fields(is_new: bool) -> Vec<FormFieldSpec> {
    let mut fields = Vec::with_capacity(5);
    if !is_new {
        fields.push(APPLICATION_ID_FIELD);
    }
    fields.extend([
        APPLICATION_DATE_FIELD,
        RESUME_FIELD,
        JOB_POSTING_FIELD,
        APPLICANT_FIELD,
    ]);
    fields
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationFormValues {
    pub application_id: Option<ApplicationId>,
    pub application_date: String,
    pub resume: Option<ResumeId>,
    pub job_posting: Option<JobId>,
    pub applicant: Option<ApplicantId>,
}

impl ApplicationFormValues {
    pub fn for_new(zone: DisplayZone, now: OffsetDateTime) -> Self {
        Self {
            application_date: zone.default_display(now),
            ..Self::default()
        }
    }

    pub fn from_entity(entity: &Application, zone: DisplayZone) -> Self {
        Self {
            application_id: entity.application_id,
            application_date: zone.to_display(entity.application_date),
            resume: entity.resume_id(),
            job_posting: entity.job_id(),
            applicant: entity.applicant_id(),
        }
    }

    pub fn validate(&self, fields: &[FormFieldSpec]) -> Result<()> {
        for field in fields.iter().filter(|field| field.required) {
            let present = match field.kind {
                FieldKind::Identifier => self.application_id.is_some(),
                FieldKind::DateTime => !self.application_date.trim().is_empty(),
                FieldKind::Select(Resource::Resume) => self.resume.is_some(),
                FieldKind::Select(Resource::JobPosting) => self.job_posting.is_some(),
                FieldKind::Select(Resource::Applicant) => self.applicant.is_some(),
                FieldKind::Select(Resource::Application) => true,
            };
            if !present {
                bail!("{} is required -- reload the application and retry", field.label);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct References<'a> {
    pub resumes: &'a [Resume],
    pub job_postings: &'a [JobPosting],
    pub applicants: &'a [Applicant],
}

impl References<'_> {
    pub fn resume(&self, id: Option<ResumeId>) -> Option<Resume> {
        resolve(self.resumes, id, |resume| resume.resume_id, Resource::Resume)
    }

    pub fn job_posting(&self, id: Option<JobId>) -> Option<JobPosting> {
        resolve(
            self.job_postings,
            id,
            |posting| posting.job_id,
            Resource::JobPosting,
        )
    }

    pub fn applicant(&self, id: Option<ApplicantId>) -> Option<Applicant> {
        resolve(
            self.applicants,
            id,
            |applicant| applicant.applicant_id,
            Resource::Applicant,
        )
    }

    pub fn option_ids(&self, resource: Resource) -> Vec<i64> {
        match resource {
            Resource::Resume => self.resumes.iter().map(|r| r.resume_id.get()).collect(),
            Resource::JobPosting => self.job_postings.iter().map(|p| p.job_id.get()).collect(),
            Resource::Applicant => self
                .applicants
                .iter()
                .map(|a| a.applicant_id.get())
                .collect(),
            Resource::Application => Vec::new(),
        }
    }
}

fn resolve<T, I>(
    list: &[T],
    selected: Option<I>,
    id_of: impl Fn(&T) -> I,
    resource: Resource,
) -> Option<T>
where
    T: Clone,
    I: Copy + PartialEq + Display,
{
    let id = selected?;
    let found = list.iter().find(|item| id_of(item) == id).cloned();
    if found.is_none() {
        tracing::warn!(
            resource = resource.label(),
            %id,
            "selected id is not in the loaded list; saving without this relation"
        );
    }
    found
}

pub fn reconcile(
    base: &Application,
    values: &ApplicationFormValues,
    references: References<'_>,
    zone: DisplayZone,
) -> Result<Application> {
    let application_date = zone.from_display(&values.application_date)?;

    Ok(Application {
        application_id: values.application_id.or(base.application_id),
        application_date,
        resume: references.resume(values.resume),
        job_posting: references.job_posting(values.job_posting),
        applicant: references.applicant(values.applicant),
        extra: base.extra.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        APPLICATION_ID_FIELD, ApplicationFormValues, References, application_fields, reconcile,
    };
    use crate::{
        Applicant, ApplicantId, Application, ApplicationId, DisplayZone, JobId, JobPosting,
        Resume, ResumeId,
    };
    use anyhow::Result;
    use serde_json::json;
    use time::macros::datetime;

    fn resumes() -> Vec<Resume> {
        vec![Resume::new(ResumeId::new(1)), Resume::new(ResumeId::new(2))]
    }

    fn postings() -> Vec<JobPosting> {
        vec![JobPosting::new(JobId::new(10))]
    }

    fn applicants() -> Vec<Applicant> {
        vec![Applicant::new(ApplicantId::new(100))]
    }

    #[test]
    fn identifier_field_is_only_shown_when_editing() {
        assert!(!application_fields(true).contains(&APPLICATION_ID_FIELD));
        let edit = application_fields(false);
        assert_eq!(edit.first(), Some(&APPLICATION_ID_FIELD));
        assert!(edit.iter().filter(|field| field.required).count() == 1);
    }

    #[test]
    fn existing_entity_flattens_relations_to_ids() {
        let entity = Application {
            application_id: Some(ApplicationId::new(42)),
            application_date: Some(datetime!(2026-02-19 12:34 UTC)),
            resume: Some(Resume::new(ResumeId::new(2))),
            job_posting: None,
            applicant: Some(Applicant::new(ApplicantId::new(100))),
            extra: Default::default(),
        };
        let values = ApplicationFormValues::from_entity(&entity, DisplayZone::UTC);
        assert_eq!(
            values,
            ApplicationFormValues {
                application_id: Some(ApplicationId::new(42)),
                application_date: "2026-02-19 12:34".to_owned(),
                resume: Some(ResumeId::new(2)),
                job_posting: None,
                applicant: Some(ApplicantId::new(100)),
            }
        );
    }

    #[test]
    fn reconcile_resolves_known_ids_and_drops_unknown_ones() -> Result<()> {
        let resumes = resumes();
        let postings = postings();
        let applicants = applicants();
        let references = References {
            resumes: &resumes,
            job_postings: &postings,
            applicants: &applicants,
        };
        let values = ApplicationFormValues {
            application_id: None,
            application_date: "2026-02-19 12:34".to_owned(),
            resume: Some(ResumeId::new(2)),
            job_posting: Some(JobId::new(99)),
            applicant: None,
        };

        let entity = reconcile(&Application::default(), &values, references, DisplayZone::UTC)?;
        assert_eq!(entity.resume, Some(Resume::new(ResumeId::new(2))));
        assert_eq!(entity.job_posting, None);
        assert_eq!(entity.applicant, None);
        assert_eq!(entity.application_date, Some(datetime!(2026-02-19 12:34 UTC)));
        Ok(())
    }

    #[test]
    fn reconcile_keeps_unedited_server_fields() -> Result<()> {
        let mut base = Application {
            application_id: Some(ApplicationId::new(5)),
            ..Application::default()
        };
        base.extra.insert("status".to_owned(), json!("SUBMITTED"));
        let values = ApplicationFormValues::from_entity(&base, DisplayZone::UTC);

        let entity = reconcile(&base, &values, References::default(), DisplayZone::UTC)?;
        assert_eq!(entity.application_id, Some(ApplicationId::new(5)));
        assert_eq!(entity.application_date, None);
        assert_eq!(entity.extra.get("status"), Some(&json!("SUBMITTED")));
        Ok(())
    }

    #[test]
    fn reconcile_rejects_unparseable_date() {
        let values = ApplicationFormValues {
            application_date: "soon".to_owned(),
            ..ApplicationFormValues::default()
        };
        let error = reconcile(
            &Application::default(),
            &values,
            References::default(),
            DisplayZone::UTC,
        )
        .expect_err("bad date should fail");
        assert!(error.to_string().contains("invalid date"));
    }

    #[test]
    fn edit_form_requires_identifier() {
        let values = ApplicationFormValues::default();
        let error = values
            .validate(&application_fields(false))
            .expect_err("missing id should fail in edit mode");
        assert!(error.to_string().contains("application id is required"));
        assert!(values.validate(&application_fields(true)).is_ok());
    }

    #[test]
    fn option_ids_follow_list_order() {
        let resumes = resumes();
        let references = References {
            resumes: &resumes,
            ..References::default()
        };
        assert_eq!(references.option_ids(crate::Resource::Resume), vec![1, 2]);
        assert!(references.option_ids(crate::Resource::Applicant).is_empty());
    }
}

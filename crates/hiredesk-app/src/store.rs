// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Applicant, Application, ApplicationId, JobPosting, References, Resource, Resume};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Reset,
    GetEntity(ApplicationId),
    GetEntities(Resource),
    CreateEntity(Application),
    UpdateEntity(Application),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Reset,
    Get,
    List(Resource),
    Create,
    Update,
}

impl RequestKind {
    pub const fn resource(self) -> Resource {
        match self {
            Self::List(resource) => resource,
            Self::Reset | Self::Get | Self::Create | Self::Update => Resource::Application,
        }
    }

    pub const fn is_save(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Reset => RequestKind::Reset,
            Self::GetEntity(_) => RequestKind::Get,
            Self::GetEntities(resource) => RequestKind::List(*resource),
            Self::CreateEntity(_) => RequestKind::Create,
            Self::UpdateEntity(_) => RequestKind::Update,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Entity(Application),
    Saved(Application),
    Applications(Vec<Application>),
    Resumes(Vec<Resume>),
    JobPostings(Vec<JobPosting>),
    Applicants(Vec<Applicant>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    Pending(RequestKind),
    Fulfilled(Payload),
    Rejected { kind: RequestKind, message: String },
    Reset(Resource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Loading(Resource),
    Saving,
    EntityLoaded(Option<ApplicationId>),
    ListLoaded { resource: Resource, count: usize },
    Saved(Option<ApplicationId>),
    Failed { kind: RequestKind, message: String },
    Reset(Resource),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySlice<T> {
    pub loading: bool,
    pub updating: bool,
    pub update_success: bool,
    pub error_message: Option<String>,
    pub entity: Option<T>,
    pub entities: Vec<T>,
}

impl<T> Default for EntitySlice<T> {
    fn default() -> Self {
        Self {
            loading: false,
            updating: false,
            update_success: false,
            error_message: None,
            entity: None,
            entities: Vec::new(),
        }
    }
}

trait SliceLifecycle {
    fn begin_fetch(&mut self);
    fn begin_save(&mut self);
    fn reject(&mut self, message: String);
    fn reset(&mut self);
}

impl<T> SliceLifecycle for EntitySlice<T> {
    fn begin_fetch(&mut self) {
        self.error_message = None;
        self.update_success = false;
        self.loading = true;
    }

    fn begin_save(&mut self) {
        self.error_message = None;
        self.update_success = false;
        self.updating = true;
    }

    fn reject(&mut self, message: String) {
        self.loading = false;
        self.updating = false;
        self.update_success = false;
        self.error_message = Some(message);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<T> EntitySlice<T> {
    fn load_one(&mut self, entity: T) {
        self.loading = false;
        self.entity = Some(entity);
    }

    fn load_many(&mut self, entities: Vec<T>) -> usize {
        self.loading = false;
        self.entities = entities;
        self.entities.len()
    }

    fn saved(&mut self, entity: T) {
        self.loading = false;
        self.updating = false;
        self.update_success = true;
        self.entity = Some(entity);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Store {
    pub application: EntitySlice<Application>,
    pub resume: EntitySlice<Resume>,
    pub job_posting: EntitySlice<JobPosting>,
    pub applicant: EntitySlice<Applicant>,
}

impl Store {
    pub fn apply(&mut self, action: StoreAction) -> Vec<StoreEvent> {
        match action {
            StoreAction::Pending(RequestKind::Reset) => Vec::new(),
            StoreAction::Pending(kind) if kind.is_save() => {
                self.slice_mut(kind.resource()).begin_save();
                vec![StoreEvent::Saving]
            }
            StoreAction::Pending(kind) => {
                self.slice_mut(kind.resource()).begin_fetch();
                vec![StoreEvent::Loading(kind.resource())]
            }
            StoreAction::Fulfilled(payload) => vec![self.fulfill(payload)],
            StoreAction::Rejected { kind, message } => {
                self.slice_mut(kind.resource()).reject(message.clone());
                vec![StoreEvent::Failed { kind, message }]
            }
            StoreAction::Reset(resource) => {
                self.slice_mut(resource).reset();
                vec![StoreEvent::Reset(resource)]
            }
        }
    }

    fn fulfill(&mut self, payload: Payload) -> StoreEvent {
        match payload {
            Payload::Entity(application) => {
                let id = application.application_id;
                self.application.load_one(application);
                StoreEvent::EntityLoaded(id)
            }
            Payload::Saved(application) => {
                let id = application.application_id;
                self.application.saved(application);
                StoreEvent::Saved(id)
            }
            Payload::Applications(list) => StoreEvent::ListLoaded {
                resource: Resource::Application,
                count: self.application.load_many(list),
            },
            Payload::Resumes(list) => StoreEvent::ListLoaded {
                resource: Resource::Resume,
                count: self.resume.load_many(list),
            },
            Payload::JobPostings(list) => StoreEvent::ListLoaded {
                resource: Resource::JobPosting,
                count: self.job_posting.load_many(list),
            },
            Payload::Applicants(list) => StoreEvent::ListLoaded {
                resource: Resource::Applicant,
                count: self.applicant.load_many(list),
            },
        }
    }

    fn slice_mut(&mut self, resource: Resource) -> &mut dyn SliceLifecycle {
        match resource {
            Resource::Application => &mut self.application,
            Resource::Resume => &mut self.resume,
            Resource::JobPosting => &mut self.job_posting,
            Resource::Applicant => &mut self.applicant,
        }
    }

    pub fn references(&self) -> References<'_> {
        References {
            resumes: &self.resume.entities,
            job_postings: &self.job_posting.entities,
            applicants: &self.applicant.entities,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        [
            &self.application.error_message,
            &self.resume.error_message,
            &self.job_posting.error_message,
            &self.applicant.error_message,
        ]
        .into_iter()
        .find_map(|message| message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{Payload, RequestKind, Store, StoreAction, StoreEvent};
    use crate::{Application, ApplicationId, Resource, Resume, ResumeId};

    fn saved_application(id: i64) -> Application {
        Application {
            application_id: Some(ApplicationId::new(id)),
            ..Application::default()
        }
    }

    #[test]
    fn fetch_lifecycle_sets_and_clears_loading() {
        let mut store = Store::default();

        let events = store.apply(StoreAction::Pending(RequestKind::Get));
        assert!(store.application.loading);
        assert_eq!(events, vec![StoreEvent::Loading(Resource::Application)]);

        let events = store.apply(StoreAction::Fulfilled(Payload::Entity(saved_application(4))));
        assert!(!store.application.loading);
        assert_eq!(store.application.entity, Some(saved_application(4)));
        assert_eq!(
            events,
            vec![StoreEvent::EntityLoaded(Some(ApplicationId::new(4)))]
        );
    }

    #[test]
    fn save_lifecycle_flags_success() {
        let mut store = Store::default();

        store.apply(StoreAction::Pending(RequestKind::Create));
        assert!(store.application.updating);
        assert!(!store.application.update_success);

        store.apply(StoreAction::Fulfilled(Payload::Saved(saved_application(9))));
        assert!(!store.application.updating);
        assert!(store.application.update_success);
        assert_eq!(store.application.entity, Some(saved_application(9)));
    }

    #[test]
    fn new_save_clears_previous_success_and_error() {
        let mut store = Store::default();
        store.apply(StoreAction::Rejected {
            kind: RequestKind::Update,
            message: "boom".to_owned(),
        });
        assert_eq!(store.error_message(), Some("boom"));

        store.apply(StoreAction::Pending(RequestKind::Update));
        assert_eq!(store.error_message(), None);
        assert!(!store.application.update_success);
    }

    #[test]
    fn rejection_only_touches_its_own_slice() {
        let mut store = Store::default();
        store.apply(StoreAction::Pending(RequestKind::List(Resource::Resume)));
        store.apply(StoreAction::Pending(RequestKind::Get));

        let events = store.apply(StoreAction::Rejected {
            kind: RequestKind::List(Resource::Resume),
            message: "resumes unavailable".to_owned(),
        });

        assert!(!store.resume.loading);
        assert!(store.application.loading);
        assert_eq!(
            events,
            vec![StoreEvent::Failed {
                kind: RequestKind::List(Resource::Resume),
                message: "resumes unavailable".to_owned(),
            }]
        );
    }

    #[test]
    fn reference_lists_feed_references_view() {
        let mut store = Store::default();
        store.apply(StoreAction::Fulfilled(Payload::Resumes(vec![
            Resume::new(ResumeId::new(1)),
            Resume::new(ResumeId::new(2)),
        ])));

        let references = store.references();
        assert_eq!(references.resumes.len(), 2);
        assert!(references.applicants.is_empty());
    }

    #[test]
    fn reset_restores_blank_application_slice() {
        let mut store = Store::default();
        store.apply(StoreAction::Fulfilled(Payload::Saved(saved_application(2))));

        let events = store.apply(StoreAction::Reset(Resource::Application));
        assert_eq!(store.application, Store::default().application);
        assert_eq!(events, vec![StoreEvent::Reset(Resource::Application)]);
    }
}

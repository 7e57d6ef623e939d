// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::{
    Applicant, Application, ApplicationId, JobPosting, Payload, Request, RequestKind, Resource,
    Resume, Store, StoreAction, StoreEvent,
};

pub trait Backend: Send + Sync {
    fn get_application(&self, id: ApplicationId) -> Result<Application>;
    fn list_applications(&self) -> Result<Vec<Application>>;
    fn create_application(&self, application: &Application) -> Result<Application>;
    fn update_application(&self, application: &Application) -> Result<Application>;
    fn list_resumes(&self) -> Result<Vec<Resume>>;
    fn list_job_postings(&self) -> Result<Vec<JobPosting>>;
    fn list_applicants(&self) -> Result<Vec<Applicant>>;
}

pub fn execute(backend: &dyn Backend, request: &Request) -> StoreAction {
    let kind = request.kind();
    let result = match request {
        Request::Reset => return StoreAction::Reset(Resource::Application),
        Request::GetEntity(id) => backend.get_application(*id).map(Payload::Entity),
        Request::GetEntities(Resource::Application) => {
            backend.list_applications().map(Payload::Applications)
        }
        Request::GetEntities(Resource::Resume) => backend.list_resumes().map(Payload::Resumes),
        Request::GetEntities(Resource::JobPosting) => {
            backend.list_job_postings().map(Payload::JobPostings)
        }
        Request::GetEntities(Resource::Applicant) => {
            backend.list_applicants().map(Payload::Applicants)
        }
        Request::CreateEntity(application) => {
            backend.create_application(application).map(Payload::Saved)
        }
        Request::UpdateEntity(application) => {
            backend.update_application(application).map(Payload::Saved)
        }
    };

    match result {
        Ok(payload) => StoreAction::Fulfilled(payload),
        Err(error) => {
            let message = format!("{error:#}");
            tracing::warn!(?kind, %message, "request failed");
            StoreAction::Rejected { kind, message }
        }
    }
}

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    tx: Sender<StoreAction>,
    rx: Receiver<StoreAction>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dispatch(&mut self, store: &mut Store, request: Request) -> Vec<StoreEvent> {
        let kind = request.kind();
        if kind == RequestKind::Reset {
            return store.apply(StoreAction::Reset(Resource::Application));
        }

        let events = store.apply(StoreAction::Pending(kind));
        tracing::debug!(?kind, "dispatching request");

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let action = execute(backend.as_ref(), &request);
            let _ = tx.send(action);
        });
        events
    }

    pub fn dispatch_all<I>(&mut self, store: &mut Store, requests: I) -> Vec<StoreEvent>
    where
        I: IntoIterator<Item = Request>,
    {
        requests
            .into_iter()
            .flat_map(|request| self.dispatch(store, request))
            .collect()
    }

    pub fn drain(&mut self, store: &mut Store) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            events.extend(store.apply(action));
        }
        events
    }

    pub fn settle(&mut self, store: &mut Store, timeout: Duration) -> Result<Vec<StoreEvent>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            bail!("settle timeout {timeout:?} is too large -- lower [api].timeout");
        };
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(action) => {
                    self.in_flight -= 1;
                    events.extend(store.apply(action));
                }
                Err(RecvTimeoutError::Timeout) => bail!(
                    "timed out after {timeout:?} waiting for {} request(s) -- check backend reachability",
                    self.in_flight
                ),
                Err(RecvTimeoutError::Disconnected) => bail!("request channel closed"),
            }
        }
        Ok(events)
    }
}

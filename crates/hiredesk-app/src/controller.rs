// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::OffsetDateTime;

use crate::{
    Application, ApplicationFormValues, ApplicationId, DisplayZone, FormFieldSpec, Request,
    Resource, Route, Store, application_fields, reconcile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    pub replace: bool,
}

impl Navigation {
    pub const fn push(route: Route) -> Self {
        Self {
            route,
            replace: false,
        }
    }

    pub const fn replace(route: Route) -> Self {
        Self {
            route,
            replace: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationUpdate {
    id: Option<ApplicationId>,
    zone: DisplayZone,
    saw_update_success: bool,
}

impl ApplicationUpdate {
    pub fn new(route: Route, zone: DisplayZone) -> Self {
        Self {
            id: route.application_id(),
            zone,
            saw_update_success: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn id(&self) -> Option<ApplicationId> {
        self.id
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn route(&self) -> Route {
        match self.id {
            Some(id) => Route::ApplicationEdit(id),
            None => Route::ApplicationNew,
        }
    }

    pub fn mount(&mut self, store: &Store) -> Vec<Request> {
        self.saw_update_success = store.application.update_success;

        let mut requests = Vec::with_capacity(4);
        requests.push(match self.id {
            Some(id) => Request::GetEntity(id),
            None => Request::Reset,
        });
        requests.extend(Resource::REFERENCES.map(Request::GetEntities));
        requests
    }

    pub fn fields(&self) -> Vec<FormFieldSpec> {
        application_fields(self.is_new())
    }

    pub fn is_loading(&self, store: &Store) -> bool {
        store.application.loading
    }

    pub fn can_save(&self, store: &Store) -> bool {
        !store.application.updating
    }

    pub fn default_values(&self, store: &Store, now: OffsetDateTime) -> ApplicationFormValues {
        if self.is_new() {
            return ApplicationFormValues::for_new(self.zone, now);
        }
        match &store.application.entity {
            Some(entity) => ApplicationFormValues::from_entity(entity, self.zone),
            None => ApplicationFormValues::default(),
        }
    }

    pub fn save(&self, values: &ApplicationFormValues, store: &Store) -> Result<Request> {
        values.validate(&self.fields())?;

        let base = if self.is_new() {
            Application::default()
        } else {
            store.application.entity.clone().unwrap_or_default()
        };
        let entity = reconcile(&base, values, store.references(), self.zone)?;

        Ok(if self.is_new() {
            Request::CreateEntity(entity)
        } else {
            Request::UpdateEntity(entity)
        })
    }

    /// Returns the trip back to the list when a save has just succeeded.
    pub fn observe(&mut self, store: &Store) -> Option<Navigation> {
        let success = store.application.update_success;
        let transitioned = success && !self.saw_update_success;
        self.saw_update_success = success;
        transitioned.then_some(Navigation::push(Route::ApplicationList))
    }

    pub fn cancel(&self) -> Navigation {
        Navigation::replace(Route::ApplicationList)
    }
}

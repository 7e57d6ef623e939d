// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use hiredesk_app::{
    ApplicantId, Application, ApplicationFormValues, ApplicationId, ApplicationUpdate, Backend,
    Dispatcher, DisplayZone, FieldKind, FormFieldSpec, JobId, Request, RequestKind, Resource,
    ResumeId, Route, Store, StoreEvent,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

const LIST_COLUMNS: [&str; 5] = ["id", "date", "resume", "job", "applicant"];
const FORM_TITLE: &str = "create or edit an application";
const LOAD_FAILED: &str = "application could not be loaded -- press esc to go back";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityFetch {
    Waiting,
    Arrived,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    controller: ApplicationUpdate,
    values: ApplicationFormValues,
    field_index: usize,
    fetch: EntityFetch,
    populated: bool,
}

impl FormUiState {
    fn current_field(&self) -> Option<FormFieldSpec> {
        self.controller.fields().get(self.field_index).copied()
    }

    // Only this mount's own entity result fills the form.
    fn track_entity_fetch(&mut self, event: &StoreEvent) -> Option<String> {
        if self.fetch != EntityFetch::Waiting {
            return None;
        }
        match event {
            StoreEvent::EntityLoaded(id) if *id == self.controller.id() => {
                self.fetch = EntityFetch::Arrived;
                None
            }
            StoreEvent::Failed {
                kind: RequestKind::Get,
                message,
            } => {
                self.fetch = EntityFetch::Failed;
                Some(format!("{LOAD_FAILED}: {message}"))
            }
            _ => None,
        }
    }
}

pub struct Session {
    dispatcher: Dispatcher,
    store: Store,
    zone: DisplayZone,
    route: Route,
    form: Option<FormUiState>,
    list_cursor: usize,
    status_line: Option<String>,
    clock: fn() -> OffsetDateTime,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>, zone: DisplayZone) -> Self {
        Self {
            dispatcher: Dispatcher::new(backend),
            store: Store::default(),
            zone,
            route: Route::ApplicationList,
            form: None,
            list_cursor: 0,
            status_line: None,
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn form_values(&self) -> Option<&ApplicationFormValues> {
        self.form.as_ref().map(|form| &form.values)
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(path = %route.path(), "navigate");
        self.route = route;
        match route {
            Route::ApplicationList => {
                self.form = None;
                let events = self.dispatcher.dispatch(
                    &mut self.store,
                    Request::GetEntities(Resource::Application),
                );
                self.absorb(events);
            }
            Route::ApplicationNew | Route::ApplicationEdit(_) => {
                let mut controller = ApplicationUpdate::new(route, self.zone);
                let requests = controller.mount(&self.store);
                let fetch = if controller.is_new() {
                    EntityFetch::Arrived
                } else {
                    EntityFetch::Waiting
                };
                self.form = Some(FormUiState {
                    controller,
                    values: ApplicationFormValues::default(),
                    field_index: 0,
                    fetch,
                    populated: false,
                });
                let events = self.dispatcher.dispatch_all(&mut self.store, requests);
                self.absorb(events);
            }
        }
    }

    pub fn pump(&mut self) {
        let events = self.dispatcher.drain(&mut self.store);
        self.absorb(events);
    }

    pub fn settle(&mut self, timeout: Duration) -> Result<()> {
        let events = self.dispatcher.settle(&mut self.store, timeout)?;
        self.absorb(events);
        Ok(())
    }

    fn absorb(&mut self, events: Vec<StoreEvent>) {
        for event in &events {
            if let Some(status) = status_for_event(event) {
                self.status_line = Some(status);
            }
            if let Some(form) = self.form.as_mut()
                && let Some(failure) = form.track_entity_fetch(event)
            {
                self.status_line = Some(failure);
            }
        }

        self.populate_form();
        self.clamp_list_cursor();

        let navigation = self
            .form
            .as_mut()
            .and_then(|form| form.controller.observe(&self.store));
        if let Some(navigation) = navigation {
            self.navigate(navigation.route);
        }
    }

    fn populate_form(&mut self) {
        let now = (self.clock)();
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.populated || form.fetch != EntityFetch::Arrived {
            return;
        }
        form.values = form.controller.default_values(&self.store, now);
        form.populated = true;
    }

    fn clamp_list_cursor(&mut self) {
        let len = self.store.application.entities.len();
        self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
    }

    fn selected_application_id(&self) -> Option<ApplicationId> {
        self.store
            .application
            .entities
            .get(self.list_cursor)
            .and_then(|application| application.application_id)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return true;
        }

        match self.route {
            Route::ApplicationList => self.handle_list_key(key),
            Route::ApplicationNew | Route::ApplicationEdit(_) => {
                self.handle_form_key(key);
                false
            }
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.list_cursor = self.list_cursor.saturating_add(1);
                self.clamp_list_cursor();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
            }
            KeyCode::Char('n') => self.navigate(Route::ApplicationNew),
            KeyCode::Char('e') | KeyCode::Enter => match self.selected_application_id() {
                Some(id) => self.navigate(Route::ApplicationEdit(id)),
                None => self.status_line = Some("no application selected".to_owned()),
            },
            KeyCode::Char('r') => self.navigate(Route::ApplicationList),
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                if let Some(form) = &self.form {
                    let navigation = form.controller.cancel();
                    self.navigate(navigation.route);
                }
            }
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Up | KeyCode::BackTab => self.move_field_cursor(-1),
            KeyCode::Down | KeyCode::Tab => self.move_field_cursor(1),
            KeyCode::Left => self.cycle_select(-1),
            KeyCode::Right => self.cycle_select(1),
            KeyCode::Backspace => self.edit_field_text(None),
            KeyCode::Char(ch) if !ctrl => self.edit_field_text(Some(ch)),
            _ => {}
        }
    }

    fn move_field_cursor(&mut self, delta: isize) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let len = form.controller.fields().len() as isize;
        if len == 0 {
            return;
        }
        form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
    }

    fn edit_field_text(&mut self, input: Option<char>) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(field) = form.current_field() else {
            return;
        };
        match field.kind {
            FieldKind::DateTime => match input {
                Some(ch) => form.values.application_date.push(ch),
                None => {
                    form.values.application_date.pop();
                }
            },
            FieldKind::Identifier => {
                self.status_line = Some(format!("{} is read-only", field.label));
            }
            FieldKind::Select(_) => {
                self.status_line = Some(format!("use left/right to choose a {}", field.label));
            }
        }
    }

    fn cycle_select(&mut self, delta: isize) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(field) = form.current_field() else {
            return;
        };
        let FieldKind::Select(resource) = field.kind else {
            self.status_line = Some(format!("{} has no choices", field.label));
            return;
        };

        let options = self.store.references().option_ids(resource);
        let values = &mut form.values;
        match resource {
            Resource::Resume => {
                values.resume = cycle_choice(values.resume.map(ResumeId::get), &options, delta)
                    .map(ResumeId::new);
            }
            Resource::JobPosting => {
                values.job_posting =
                    cycle_choice(values.job_posting.map(JobId::get), &options, delta)
                        .map(JobId::new);
            }
            Resource::Applicant => {
                values.applicant =
                    cycle_choice(values.applicant.map(ApplicantId::get), &options, delta)
                        .map(ApplicantId::new);
            }
            Resource::Application => {}
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = &self.form else {
            return;
        };
        if form.fetch == EntityFetch::Failed {
            self.status_line = Some(LOAD_FAILED.to_owned());
            return;
        }
        if !form.populated {
            self.status_line = Some("form is still loading".to_owned());
            return;
        }
        if !form.controller.can_save(&self.store) {
            self.status_line = Some("save already in progress".to_owned());
            return;
        }

        match form.controller.save(&form.values, &self.store) {
            Ok(request) => {
                let events = self.dispatcher.dispatch(&mut self.store, request);
                self.absorb(events);
            }
            Err(error) => {
                self.status_line = Some(format!("{error:#}"));
            }
        }
    }
}

// Slot 0 is the empty option; the rest follow `options`.
fn cycle_choice(current: Option<i64>, options: &[i64], delta: isize) -> Option<i64> {
    let len = options.len() as isize + 1;
    let position = current
        .and_then(|id| options.iter().position(|option| *option == id))
        .map_or(0, |index| index + 1) as isize;
    let next = (position + delta).rem_euclid(len) as usize;
    next.checked_sub(1).map(|index| options[index])
}

fn status_for_event(event: &StoreEvent) -> Option<String> {
    match event {
        StoreEvent::Failed { kind, message } => {
            Some(format!("{} request failed: {message}", kind.resource().label()))
        }
        StoreEvent::Saved(Some(id)) => Some(format!("saved application {id}")),
        StoreEvent::Saved(None) => Some("saved application".to_owned()),
        StoreEvent::Loading(_)
        | StoreEvent::Saving
        | StoreEvent::EntityLoaded(_)
        | StoreEvent::ListLoaded { .. }
        | StoreEvent::Reset(_) => None,
    }
}

pub fn run_app(session: &mut Session) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut tui = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        session.pump();

        if let Err(error) = tui.draw(|frame| render(frame, session)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if session.handle_key(key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn render(frame: &mut ratatui::Frame<'_>, session: &Session) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(session.route.path())
        .block(Block::default().title("hiredesk").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    match session.route {
        Route::ApplicationList => render_application_table(frame, layout[1], session),
        Route::ApplicationNew | Route::ApplicationEdit(_) => {
            let body = Paragraph::new(render_form_text(session))
                .block(Block::default().borders(Borders::ALL).title(FORM_TITLE));
            frame.render_widget(body, layout[1]);
        }
    }

    let status = Paragraph::new(status_text(session))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn render_application_table(frame: &mut ratatui::Frame<'_>, area: Rect, session: &Session) {
    let header = Row::new(LIST_COLUMNS.map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = session
        .store
        .application
        .entities
        .iter()
        .enumerate()
        .map(|(index, application)| {
            let row = Row::new(application_row_cells(application, session.zone));
            if index == session.list_cursor {
                row.style(Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                row
            }
        });

    let title = if session.store.application.loading {
        "applications (loading...)".to_owned()
    } else {
        format!("applications ({})", session.store.application.entities.len())
    };
    let table = Table::new(rows, [Constraint::Min(8); 5])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn application_row_cells(application: &Application, zone: DisplayZone) -> [String; 5] {
    fn id_text(id: Option<i64>) -> String {
        id.map(|id| id.to_string()).unwrap_or_default()
    }

    [
        id_text(application.application_id.map(ApplicationId::get)),
        zone.to_display(application.application_date),
        id_text(application.resume_id().map(ResumeId::get)),
        id_text(application.job_id().map(JobId::get)),
        id_text(application.applicant_id().map(ApplicantId::get)),
    ]
}

fn render_form_text(session: &Session) -> String {
    let Some(form) = &session.form else {
        return String::new();
    };
    if form.fetch == EntityFetch::Failed {
        return LOAD_FAILED.to_owned();
    }
    if !form.populated || form.controller.is_loading(&session.store) {
        return "Loading...".to_owned();
    }

    let mut lines = Vec::new();
    for (index, field) in form.controller.fields().iter().enumerate() {
        let cursor = if index == form.field_index { ">" } else { " " };
        let value = field_value_text(&form.values, field);
        let mut line = format!("{cursor} {}: {value}", field.label);
        if value.is_empty()
            && let Some(placeholder) = field.placeholder
        {
            line.push_str(&format!("<{placeholder}>"));
        }
        let flags = [
            field.required.then_some("required"),
            field.read_only.then_some("read-only"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
        if !flags.is_empty() {
            line.push_str(&format!(" ({})", flags.join(", ")));
        }
        lines.push(line);
    }

    lines.push(String::new());
    if form.controller.can_save(&session.store) {
        lines.push("[ctrl+s] save   [esc] back".to_owned());
    } else {
        lines.push("saving...   [esc] back".to_owned());
    }
    lines.join("\n")
}

fn field_value_text(values: &ApplicationFormValues, field: &FormFieldSpec) -> String {
    let choice = |id: Option<i64>| id.map_or_else(|| "(none)".to_owned(), |id| id.to_string());
    match field.kind {
        FieldKind::Identifier => values
            .application_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        FieldKind::DateTime => values.application_date.clone(),
        FieldKind::Select(Resource::Resume) => choice(values.resume.map(ResumeId::get)),
        FieldKind::Select(Resource::JobPosting) => choice(values.job_posting.map(JobId::get)),
        FieldKind::Select(Resource::Applicant) => choice(values.applicant.map(ApplicantId::get)),
        FieldKind::Select(Resource::Application) => String::new(),
    }
}

fn status_text(session: &Session) -> String {
    let hints = match session.route {
        Route::ApplicationList => "j/k move | n new | e edit | r refresh | q quit",
        Route::ApplicationNew | Route::ApplicationEdit(_) => {
            "up/down field | left/right choose | ctrl+s save | esc back"
        }
    };
    match &session.status_line {
        Some(status) => format!("{status} | {hints}"),
        None => hints.to_owned(),
    }
}

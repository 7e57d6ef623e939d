// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hiredesk_app::{
    Applicant, ApplicantId, Application, ApplicationId, Backend, ExtraFields, JobId, JobPosting,
    Resume, ResumeId,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "hiredesk";

const APPLICATION_SELECT: &str = "
    SELECT
      a.application_id, a.application_date, a.attributes,
      a.resume_id, r.attributes,
      a.job_id, j.attributes,
      a.applicant_id, p.attributes
    FROM applications a
    LEFT JOIN resumes r ON r.resume_id = a.resume_id
    LEFT JOIN job_postings j ON j.job_id = a.job_id
    LEFT JOIN applicants p ON p.applicant_id = a.applicant_id
";

const DEMO_RESUMES: [(i64, &str); 3] = [
    (1, "avery-walker.pdf"),
    (2, "jordan-hill.pdf"),
    (3, "riley-lopez.docx"),
];
const DEMO_JOB_POSTINGS: [(i64, &str); 3] = [
    (10, "Backend Engineer"),
    (11, "Site Reliability Engineer"),
    (12, "Data Engineer"),
];
const DEMO_APPLICANTS: [(i64, &str); 3] = [
    (100, "Avery Walker"),
    (101, "Jordan Hill"),
    (102, "Riley Lopez"),
];

pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn bootstrap(&self) -> Result<()> {
        self.conn()
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create schema")
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        for (id, file_name) in DEMO_RESUMES {
            self.insert_resume(&Resume {
                resume_id: ResumeId::new(id),
                extra: attributes_with("fileName", file_name),
            })?;
        }
        for (id, title) in DEMO_JOB_POSTINGS {
            self.insert_job_posting(&JobPosting {
                job_id: JobId::new(id),
                extra: attributes_with("title", title),
            })?;
        }
        for (id, name) in DEMO_APPLICANTS {
            self.insert_applicant(&Applicant {
                applicant_id: ApplicantId::new(id),
                extra: attributes_with("fullName", name),
            })?;
        }

        let now = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        for (offset_days, resume, job, applicant) in [(3, 1, 10, 100), (1, 2, 11, 101)] {
            self.create_application(&Application {
                application_id: None,
                application_date: Some(now - time::Duration::days(offset_days)),
                resume: Some(Resume::new(ResumeId::new(resume))),
                job_posting: Some(JobPosting::new(JobId::new(job))),
                applicant: Some(Applicant::new(ApplicantId::new(applicant))),
                extra: ExtraFields::new(),
            })?;
        }
        tracing::debug!("seeded demo data");
        Ok(())
    }

    pub fn insert_resume(&self, resume: &Resume) -> Result<()> {
        self.insert_reference(
            "INSERT INTO resumes (resume_id, attributes) VALUES (?, ?)",
            resume.resume_id.get(),
            &resume.extra,
        )
        .with_context(|| format!("insert resume {}", resume.resume_id))
    }

    pub fn insert_job_posting(&self, posting: &JobPosting) -> Result<()> {
        self.insert_reference(
            "INSERT INTO job_postings (job_id, attributes) VALUES (?, ?)",
            posting.job_id.get(),
            &posting.extra,
        )
        .with_context(|| format!("insert job posting {}", posting.job_id))
    }

    pub fn insert_applicant(&self, applicant: &Applicant) -> Result<()> {
        self.insert_reference(
            "INSERT INTO applicants (applicant_id, attributes) VALUES (?, ?)",
            applicant.applicant_id.get(),
            &applicant.extra,
        )
        .with_context(|| format!("insert applicant {}", applicant.applicant_id))
    }

    fn insert_reference(&self, sql: &str, id: i64, extra: &ExtraFields) -> Result<()> {
        let attributes = encode_attributes(extra)?;
        self.conn().execute(sql, params![id, attributes])?;
        Ok(())
    }

    fn list_references<T>(
        &self,
        sql: &str,
        build: impl Fn(i64, ExtraFields) -> T,
    ) -> Result<Vec<T>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let raw: String = row.get(1)?;
            Ok(build(id, decode_attributes(&raw)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn load_application(conn: &Connection, id: ApplicationId) -> Result<Option<Application>> {
        conn.query_row(
            &format!("{APPLICATION_SELECT} WHERE a.application_id = ?"),
            params![id.get()],
            application_from_row,
        )
        .optional()
        .with_context(|| format!("load application {id}"))
    }
}

impl Backend for LocalStore {
    fn get_application(&self, id: ApplicationId) -> Result<Application> {
        let conn = self.conn();
        Self::load_application(&conn, id)?
            .ok_or_else(|| anyhow!("application {id} not found -- it may have been deleted"))
    }

    fn list_applications(&self) -> Result<Vec<Application>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!("{APPLICATION_SELECT} ORDER BY a.application_id ASC"))
            .context("prepare applications query")?;
        let rows = stmt
            .query_map([], application_from_row)
            .context("query applications")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("decode applications")
    }

    fn create_application(&self, application: &Application) -> Result<Application> {
        if let Some(id) = application.application_id {
            bail!("application {id} already exists -- update it instead of creating it");
        }
        let conn = self.conn();
        conn.execute(
            "
            INSERT INTO applications (
              application_date, resume_id, job_id, applicant_id, attributes
            ) VALUES (?, ?, ?, ?, ?)
            ",
            params![
                format_datetime(application.application_date)?,
                application.resume_id().map(ResumeId::get),
                application.job_id().map(JobId::get),
                application.applicant_id().map(ApplicantId::get),
                encode_attributes(&application.extra)?,
            ],
        )
        .context("insert application")?;

        let id = ApplicationId::new(conn.last_insert_rowid());
        Self::load_application(&conn, id)?
            .ok_or_else(|| anyhow!("application {id} vanished after insert"))
    }

    fn update_application(&self, application: &Application) -> Result<Application> {
        let id = application.application_id.ok_or_else(|| {
            anyhow!("cannot update an application without an id -- create it instead")
        })?;
        let conn = self.conn();
        let rows_affected = conn
            .execute(
                "
                UPDATE applications
                SET application_date = ?, resume_id = ?, job_id = ?, applicant_id = ?,
                    attributes = ?
                WHERE application_id = ?
                ",
                params![
                    format_datetime(application.application_date)?,
                    application.resume_id().map(ResumeId::get),
                    application.job_id().map(JobId::get),
                    application.applicant_id().map(ApplicantId::get),
                    encode_attributes(&application.extra)?,
                    id.get(),
                ],
            )
            .with_context(|| format!("update application {id}"))?;
        if rows_affected == 0 {
            bail!("application {id} not found -- it may have been deleted");
        }

        Self::load_application(&conn, id)?
            .ok_or_else(|| anyhow!("application {id} vanished after update"))
    }

    fn list_resumes(&self) -> Result<Vec<Resume>> {
        self.list_references(
            "SELECT resume_id, attributes FROM resumes ORDER BY resume_id",
            |id, extra| Resume {
                resume_id: ResumeId::new(id),
                extra,
            },
        )
        .context("load resumes")
    }

    fn list_job_postings(&self) -> Result<Vec<JobPosting>> {
        self.list_references(
            "SELECT job_id, attributes FROM job_postings ORDER BY job_id",
            |id, extra| JobPosting {
                job_id: JobId::new(id),
                extra,
            },
        )
        .context("load job postings")
    }

    fn list_applicants(&self) -> Result<Vec<Applicant>> {
        self.list_references(
            "SELECT applicant_id, attributes FROM applicants ORDER BY applicant_id",
            |id, extra| Applicant {
                applicant_id: ApplicantId::new(id),
                extra,
            },
        )
        .context("load applicants")
    }
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    let date_raw: Option<String> = row.get(1)?;
    let attributes_raw: String = row.get(2)?;

    let resume = joined_reference(row, 3, 4)?.map(|(id, extra)| Resume {
        resume_id: ResumeId::new(id),
        extra,
    });
    let job_posting = joined_reference(row, 5, 6)?.map(|(id, extra)| JobPosting {
        job_id: JobId::new(id),
        extra,
    });
    let applicant = joined_reference(row, 7, 8)?.map(|(id, extra)| Applicant {
        applicant_id: ApplicantId::new(id),
        extra,
    });

    Ok(Application {
        application_id: Some(ApplicationId::new(row.get(0)?)),
        application_date: date_raw
            .as_deref()
            .map(parse_datetime)
            .transpose()
            .map_err(to_sql_error)?,
        resume,
        job_posting,
        applicant,
        extra: decode_attributes(&attributes_raw)?,
    })
}

fn joined_reference(
    row: &Row<'_>,
    id_column: usize,
    attributes_column: usize,
) -> rusqlite::Result<Option<(i64, ExtraFields)>> {
    let Some(id) = row.get::<_, Option<i64>>(id_column)? else {
        return Ok(None);
    };
    let raw: Option<String> = row.get(attributes_column)?;
    let extra = match raw {
        Some(raw) => decode_attributes(&raw)?,
        None => ExtraFields::new(),
    };
    Ok(Some((id, extra)))
}

fn attributes_with(key: &str, value: &str) -> ExtraFields {
    let mut extra = ExtraFields::new();
    extra.insert(key.to_owned(), serde_json::Value::from(value));
    extra
}

fn encode_attributes(extra: &ExtraFields) -> Result<String> {
    serde_json::to_string(extra).context("encode attributes")
}

fn decode_attributes(raw: &str) -> rusqlite::Result<ExtraFields> {
    serde_json::from_str(raw).map_err(|error| to_sql_error(error.into()))
}

fn format_datetime(value: Option<OffsetDateTime>) -> Result<Option<String>> {
    value
        .map(|instant| instant.format(&Rfc3339).context("format application date"))
        .transpose()
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("parse stored date {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("HIREDESK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set HIREDESK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("hiredesk.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    Ok(())
}

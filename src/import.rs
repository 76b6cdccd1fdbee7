// src/import.rs
//! Bulk CSV import for seekers and jobs.
//!
//! Rows use the same camelCase headers the API speaks. A malformed row is
//! logged and skipped; the rest of the file still loads.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::identity::{NewSeeker, SeekerRepository};
use crate::jobs::{JobRepository, NewJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Seekers,
    Jobs,
}

impl ImportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "seekers" | "seeker" => Some(ImportKind::Seekers),
            "jobs" | "job" => Some(ImportKind::Jobs),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeekerRecord {
    full_name: Option<String>,
    whatsapp_number: Option<String>,
    email: Option<String>,
    skill_type: Option<String>,
    skills: Option<String>,
    experience: Option<i64>,
    location: Option<String>,
    #[serde(rename = "currentCTC")]
    current_ctc: Option<f64>,
    #[serde(rename = "expectedCTC")]
    expected_ctc: Option<f64>,
    notice_period: Option<String>,
    last_working_date: Option<String>,
    bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobRecord {
    job_title: Option<String>,
    skill_type: Option<String>,
    skills: Option<String>,
    experience_required: Option<i64>,
    location: Option<String>,
    #[serde(rename = "maxCTC")]
    max_ctc: Option<f64>,
    notice_period: Option<String>,
    posted_by: Option<i64>,
}

fn split_csv_skills(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Load a CSV file into the given table. Returns how many rows landed and
/// how many were skipped.
pub async fn import_file(pool: &SqlitePool, kind: ImportKind, path: &Path) -> Result<ImportReport> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open import file: {}", path.display()))?;

    let report = match kind {
        ImportKind::Seekers => import_seekers(pool, &mut reader).await?,
        ImportKind::Jobs => import_jobs(pool, &mut reader).await?,
    };

    info!(
        "Import finished: {} inserted, {} skipped ({})",
        report.inserted,
        report.skipped,
        path.display()
    );
    Ok(report)
}

async fn import_seekers<R: std::io::Read>(
    pool: &SqlitePool,
    reader: &mut csv::Reader<R>,
) -> Result<ImportReport> {
    let repo = SeekerRepository::new(pool);
    let mut report = ImportReport::default();

    for (line, record) in reader.deserialize::<SeekerRecord>().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping seeker row {}: {}", line + 2, e);
                report.skipped += 1;
                continue;
            }
        };

        let seeker = NewSeeker {
            full_name: blank_to_none(record.full_name)
                .unwrap_or_else(|| "Unnamed Seeker".to_string()),
            whatsapp_number: blank_to_none(record.whatsapp_number),
            email: blank_to_none(record.email),
            skill_type: blank_to_none(record.skill_type),
            skills: split_csv_skills(record.skills),
            experience: record.experience.unwrap_or(0),
            location: blank_to_none(record.location),
            current_ctc: record.current_ctc,
            expected_ctc: record.expected_ctc,
            notice_period: blank_to_none(record.notice_period),
            last_working_date: blank_to_none(record.last_working_date),
            resume: None,
            bio: blank_to_none(record.bio),
        };

        match repo.create(seeker).await {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                warn!("Skipping seeker row {}: {}", line + 2, e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

async fn import_jobs<R: std::io::Read>(
    pool: &SqlitePool,
    reader: &mut csv::Reader<R>,
) -> Result<ImportReport> {
    let repo = JobRepository::new(pool);
    let mut report = ImportReport::default();

    for (line, record) in reader.deserialize::<JobRecord>().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping job row {}: {}", line + 2, e);
                report.skipped += 1;
                continue;
            }
        };

        // A posting with no provider cannot be attributed; drop the row.
        let posted_by = match record.posted_by {
            Some(id) => id,
            None => {
                warn!("Skipping job row {}: postedBy missing", line + 2);
                report.skipped += 1;
                continue;
            }
        };

        let job = NewJob {
            job_title: blank_to_none(record.job_title)
                .unwrap_or_else(|| "Unnamed Job".to_string()),
            skill_type: blank_to_none(record.skill_type),
            skills: split_csv_skills(record.skills),
            experience_required: record.experience_required.unwrap_or(0),
            location: blank_to_none(record.location),
            max_ctc: record.max_ctc,
            notice_period: blank_to_none(record.notice_period),
            posted_by,
        };

        match repo.create(job).await {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                warn!("Skipping job row {}: {}", line + 2, e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Same as [`import_file`] but reads from an in-memory buffer, for uploads
/// already pulled off the wire.
pub async fn import_bytes(
    pool: &SqlitePool,
    kind: ImportKind,
    data: &[u8],
) -> Result<ImportReport> {
    if data.is_empty() {
        bail!("Import file is empty");
    }
    let mut reader = csv::Reader::from_reader(data);
    match kind {
        ImportKind::Seekers => import_seekers(pool, &mut reader).await,
        ImportKind::Jobs => import_jobs(pool, &mut reader).await,
    }
}

// src/jobs.rs
//! Job catalog: postings, availability, admin edits.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{join_skills, JobPosting, JobRow, JobWithProvider, JobWithProviderRow};

pub(crate) const JOB_COLUMNS: &str = "id, job_title, skill_type, skills, experience_required, \
     location, max_ctc, notice_period, available, viewed, posted_by, created_at";

pub(crate) const JOB_WITH_PROVIDER_SELECT: &str =
    "SELECT j.id, j.job_title, j.skill_type, j.skills, j.experience_required, j.location, \
     j.max_ctc, j.notice_period, j.available, j.viewed, j.posted_by, j.created_at, \
     p.company_name, p.hr_name, p.hr_whatsapp_number \
     FROM jobs j LEFT JOIN providers p ON p.id = j.posted_by";

#[derive(Debug, Default, Clone)]
pub struct NewJob {
    pub job_title: String,
    pub skill_type: Option<String>,
    pub skills: Vec<String>,
    pub experience_required: i64,
    pub location: Option<String>,
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub posted_by: i64,
}

/// Partial admin edit; only supplied fields are written.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub job_title: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_required: Option<i64>,
    pub location: Option<String>,
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub posted_by: Option<i64>,
}

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, job: NewJob) -> Result<JobPosting> {
        let result = sqlx::query(
            "INSERT INTO jobs (job_title, skill_type, skills, experience_required, location, \
             max_ctc, notice_period, available, viewed, posted_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, TRUE, FALSE, ?, ?)",
        )
        .bind(&job.job_title)
        .bind(&job.skill_type)
        .bind(join_skills(&job.skills))
        .bind(job.experience_required)
        .bind(&job.location)
        .bind(job.max_ctc)
        .bind(&job.notice_period)
        .bind(job.posted_by)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to insert job posting")?;

        let id = result.last_insert_rowid();
        info!("Job {} posted by provider {}", id, job.posted_by);

        self.find_by_id(id)
            .await?
            .context("Job vanished after insert")
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<JobPosting>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?");
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(JobPosting::from))
    }

    pub async fn update(&self, id: i64, update: JobUpdate) -> Result<Option<JobPosting>> {
        let existing = match self.find_by_id(id).await? {
            Some(job) => job,
            None => return Ok(None),
        };

        let skills = update.skills.unwrap_or(existing.skills);
        sqlx::query(
            "UPDATE jobs SET job_title = ?, skill_type = ?, skills = ?, \
             experience_required = ?, location = ?, max_ctc = ?, notice_period = ?, \
             posted_by = ? WHERE id = ?",
        )
        .bind(update.job_title.unwrap_or(existing.job_title))
        .bind(update.skill_type.or(existing.skill_type))
        .bind(join_skills(&skills))
        .bind(
            update
                .experience_required
                .unwrap_or(existing.experience_required),
        )
        .bind(update.location.or(existing.location))
        .bind(update.max_ctc.or(existing.max_ctc))
        .bind(update.notice_period.or(existing.notice_period))
        .bind(update.posted_by.unwrap_or(existing.posted_by))
        .bind(id)
        .execute(self.pool)
        .await?;

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        sqlx::query("DELETE FROM applicants WHERE job_id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted job {}", id);
        }
        Ok(deleted)
    }

    /// Flip the availability flag; applicant records are untouched.
    pub async fn toggle_availability(&self, id: i64) -> Result<Option<JobPosting>> {
        let existing = match self.find_by_id(id).await? {
            Some(job) => job,
            None => return Ok(None),
        };

        sqlx::query("UPDATE jobs SET available = ? WHERE id = ?")
            .bind(!existing.available)
            .bind(id)
            .execute(self.pool)
            .await?;

        info!("Job {} availability -> {}", id, !existing.available);
        self.find_by_id(id).await
    }

    /// First five live postings, provider-enriched, newest first.
    pub async fn trending(&self) -> Result<Vec<JobWithProvider>> {
        let sql = format!(
            "{JOB_WITH_PROVIDER_SELECT} WHERE j.available = TRUE \
             ORDER BY j.created_at DESC LIMIT 5"
        );
        let rows: Vec<JobWithProviderRow> = sqlx::query_as(&sql).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(JobWithProvider::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::identity::{NewProvider, ProviderRepository};

    async fn seed_provider(pool: &SqlitePool) -> i64 {
        ProviderRepository::new(pool)
            .create(NewProvider {
                company_name: "Acme Fabrication".to_string(),
                hr_name: "Ravi".to_string(),
                hr_whatsapp_number: Some("+918800774455".to_string()),
                email: Some("hr@acme.example".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_stores_trimmed_skills_and_defaults_available() {
        let db = Database::in_memory().await.unwrap();
        let provider_id = seed_provider(db.pool()).await;
        let repo = JobRepository::new(db.pool());

        let job = repo
            .create(NewJob {
                job_title: "Fabrication Lead".to_string(),
                skills: vec!["Welder".to_string(), " Fabricator ".to_string()],
                experience_required: 12,
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(job.available);
        assert!(!job.viewed);
        assert_eq!(job.skills, vec!["Welder", "Fabricator"]);
    }

    #[tokio::test]
    async fn test_double_toggle_restores_availability() {
        let db = Database::in_memory().await.unwrap();
        let provider_id = seed_provider(db.pool()).await;
        let repo = JobRepository::new(db.pool());
        let job = repo
            .create(NewJob {
                job_title: "Fitter".to_string(),
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap();

        let once = repo.toggle_availability(job.id).await.unwrap().unwrap();
        assert!(!once.available);
        let twice = repo.toggle_availability(job.id).await.unwrap().unwrap();
        assert!(twice.available);

        assert!(repo.toggle_availability(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = Database::in_memory().await.unwrap();
        let provider_id = seed_provider(db.pool()).await;
        let repo = JobRepository::new(db.pool());
        let job = repo
            .create(NewJob {
                job_title: "Welder".to_string(),
                location: Some("Pune".to_string()),
                max_ctc: Some(450000.0),
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                job.id,
                JobUpdate {
                    location: Some("Nashik".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.location.as_deref(), Some("Nashik"));
        assert_eq!(updated.job_title, "Welder");
        assert_eq!(updated.max_ctc, Some(450000.0));
        assert_eq!(updated.posted_by, provider_id);
    }

    #[tokio::test]
    async fn test_trending_is_capped_and_live_only() {
        let db = Database::in_memory().await.unwrap();
        let provider_id = seed_provider(db.pool()).await;
        let repo = JobRepository::new(db.pool());

        for i in 0..7 {
            repo.create(NewJob {
                job_title: format!("Job {i}"),
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap();
        }
        let paused = repo
            .create(NewJob {
                job_title: "Paused".to_string(),
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap();
        repo.toggle_availability(paused.id).await.unwrap();

        let trending = repo.trending().await.unwrap();
        assert_eq!(trending.len(), 5);
        assert!(trending.iter().all(|j| j.available));
        assert!(trending
            .iter()
            .all(|j| j.posted_by.company_name.as_deref() == Some("Acme Fabrication")));
    }
}

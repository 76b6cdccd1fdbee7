// src/applications.rs
//! Application state machine: Unapplied -> Applied -> Connected.
//!
//! Every apply touches two sides, the job's applicant set and the seeker's
//! applied-jobs list. Both writes run in one transaction so a crash can
//! never leave them disagreeing.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::identity::SeekerRepository;
use crate::jobs::{JobRepository, JOB_WITH_PROVIDER_SELECT};
use crate::models::{
    ApplicationStatus, JobWithProvider, JobWithProviderRow, Seeker, SeekerRow, split_skills,
};

/// One applicant row as served to a provider dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantEntry {
    pub job_id: i64,
    pub job_title: String,
    pub seeker: ApplicantSeeker,
}

/// The seeker fields a provider sees about an applicant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSeeker {
    #[serde(rename = "_id")]
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
    pub skills: Vec<String>,
    pub experience: i64,
    pub location: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicantRow {
    job_id: i64,
    job_title: String,
    #[sqlx(flatten)]
    seeker: SeekerRow,
}

pub struct ApplicationService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApplicationService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a seeker's interest in a job. Idempotent on both sides:
    /// re-applying never duplicates an entry, and an explicit status only
    /// replaces the stored one when it is a real upgrade. `Connected`
    /// never regresses to `Applied`.
    pub async fn apply(
        &self,
        seeker_id: i64,
        job_id: i64,
        title: Option<&str>,
        status: Option<ApplicationStatus>,
    ) -> ApiResult<Seeker> {
        let jobs = JobRepository::new(self.pool);
        let job = jobs
            .find_by_id(job_id)
            .await
            .map_err(ApiError::server)?
            .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

        let seekers = SeekerRepository::new(self.pool);
        seekers
            .find_by_id(seeker_id)
            .await
            .map_err(ApiError::server)?
            .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))?;

        let mut tx = self.pool.begin().await.map_err(|e| ApiError::server(e.into()))?;

        sqlx::query(
            "INSERT OR IGNORE INTO applicants (job_id, seeker_id, applied_at) VALUES (?, ?, ?)",
        )
        .bind(job_id)
        .bind(seeker_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::server(e.into()))?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT status FROM applied_jobs WHERE seeker_id = ? AND job_id = ?")
                .bind(seeker_id)
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| ApiError::server(e.into()))?;

        match existing {
            None => {
                let initial = status.unwrap_or(ApplicationStatus::Applied);
                sqlx::query(
                    "INSERT INTO applied_jobs (seeker_id, job_id, title, status, updated_at) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(seeker_id)
                .bind(job_id)
                .bind(title.unwrap_or(&job.job_title))
                .bind(initial.as_str())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::server(e.into()))?;

                info!(
                    "Seeker {} -> job {} recorded as {}",
                    seeker_id,
                    job_id,
                    initial.as_str()
                );
            }
            Some((stored,)) => {
                let stored =
                    ApplicationStatus::parse(&stored).unwrap_or(ApplicationStatus::Applied);
                // Upgrade only on an explicit, different status; Connected
                // is terminal.
                if let Some(new_status) = status {
                    if new_status != stored && stored != ApplicationStatus::Connected {
                        sqlx::query(
                            "UPDATE applied_jobs SET status = ?, updated_at = ? \
                             WHERE seeker_id = ? AND job_id = ?",
                        )
                        .bind(new_status.as_str())
                        .bind(Utc::now())
                        .bind(seeker_id)
                        .bind(job_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| ApiError::server(e.into()))?;

                        info!(
                            "Seeker {} -> job {} upgraded to {}",
                            seeker_id,
                            job_id,
                            new_status.as_str()
                        );
                    }
                }
            }
        }

        tx.commit().await.map_err(|e| ApiError::server(e.into()))?;

        seekers
            .find_by_id(seeker_id)
            .await
            .map_err(ApiError::server)?
            .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))
    }

    /// Entry point for the WhatsApp deep-link action: same upsert with the
    /// status forced to Connected.
    pub async fn connect(
        &self,
        seeker_id: i64,
        job_id: i64,
        title: Option<&str>,
    ) -> ApiResult<Seeker> {
        self.apply(seeker_id, job_id, title, Some(ApplicationStatus::Connected))
            .await
    }

    /// Applicants for one job, or across all of a provider's postings.
    pub async fn applicants(
        &self,
        provider_id: Option<i64>,
        job_id: Option<i64>,
    ) -> ApiResult<Vec<ApplicantEntry>> {
        if provider_id.is_none() && job_id.is_none() {
            return Err(ApiError::Validation(
                "providerId or jobId is required".to_string(),
            ));
        }

        let base = "SELECT j.id AS job_id, j.job_title, \
             s.id, s.full_name, s.whatsapp_number, s.email, s.skill_type, s.skills, \
             s.experience, s.location, s.current_ctc, s.expected_ctc, s.notice_period, \
             s.last_working_date, s.resume, s.bio, s.created_at, s.updated_at \
             FROM applicants a \
             JOIN jobs j ON j.id = a.job_id \
             JOIN seekers s ON s.id = a.seeker_id";

        let rows: Vec<ApplicantRow> = if let Some(job_id) = job_id {
            sqlx::query_as(&format!("{base} WHERE j.id = ? ORDER BY j.id"))
                .bind(job_id)
                .fetch_all(self.pool)
                .await
                .map_err(|e| ApiError::server(e.into()))?
        } else {
            sqlx::query_as(&format!("{base} WHERE j.posted_by = ? ORDER BY j.id"))
                .bind(provider_id)
                .fetch_all(self.pool)
                .await
                .map_err(|e| ApiError::server(e.into()))?
        };

        Ok(rows
            .into_iter()
            .map(|row| ApplicantEntry {
                job_id: row.job_id,
                job_title: row.job_title,
                seeker: ApplicantSeeker {
                    id: row.seeker.id,
                    full_name: row.seeker.full_name,
                    email: row.seeker.email,
                    whatsapp_number: row.seeker.whatsapp_number,
                    skills: split_skills(&row.seeker.skills),
                    experience: row.seeker.experience,
                    location: row.seeker.location,
                    resume: row.seeker.resume,
                },
            })
            .collect())
    }

    /// The provider-enriched postings a seeker has applied to.
    pub async fn applied_for(&self, seeker_id: i64) -> ApiResult<Vec<JobWithProvider>> {
        SeekerRepository::new(self.pool)
            .find_by_id(seeker_id)
            .await
            .map_err(ApiError::server)?
            .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))?;

        let sql = format!(
            "{JOB_WITH_PROVIDER_SELECT} \
             JOIN applicants a ON a.job_id = j.id \
             WHERE a.seeker_id = ? ORDER BY j.created_at DESC, j.id DESC"
        );
        let rows: Vec<JobWithProviderRow> = sqlx::query_as(&sql)
            .bind(seeker_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| ApiError::server(e.into()))?;

        Ok(rows.into_iter().map(JobWithProvider::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::identity::{NewProvider, NewSeeker, ProviderRepository};
    use crate::jobs::NewJob;

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let provider_id = ProviderRepository::new(pool)
            .create(NewProvider {
                company_name: "Acme Fabrication".to_string(),
                hr_name: "Ravi".to_string(),
                hr_whatsapp_number: Some("+918800774455".to_string()),
                email: None,
            })
            .await
            .unwrap()
            .id;

        let seeker_id = SeekerRepository::new(pool)
            .create(NewSeeker {
                full_name: "Asha Verma".to_string(),
                email: Some("asha@example.com".to_string()),
                skills: vec!["Welder".to_string()],
                ..Default::default()
            })
            .await
            .unwrap()
            .id;

        let job_id = JobRepository::new(pool)
            .create(NewJob {
                job_title: "Senior Welder".to_string(),
                skills: vec!["Welder".to_string()],
                posted_by: provider_id,
                ..Default::default()
            })
            .await
            .unwrap()
            .id;

        (seeker_id, job_id)
    }

    #[tokio::test]
    async fn test_first_apply_records_both_sides() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        let seeker = service.apply(seeker_id, job_id, None, None).await.unwrap();

        assert_eq!(seeker.applied_jobs.len(), 1);
        assert_eq!(seeker.applied_jobs[0].job_id, job_id);
        assert_eq!(seeker.applied_jobs[0].status, ApplicationStatus::Applied);
        // Title falls back to the job's own title.
        assert_eq!(seeker.applied_jobs[0].title, "Senior Welder");

        let applicants = service.applicants(None, Some(job_id)).await.unwrap();
        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0].seeker.id, seeker_id);
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        for _ in 0..3 {
            service.apply(seeker_id, job_id, None, None).await.unwrap();
        }

        let seeker = service.apply(seeker_id, job_id, None, None).await.unwrap();
        assert_eq!(seeker.applied_jobs.len(), 1);

        let applicants = service.applicants(None, Some(job_id)).await.unwrap();
        assert_eq!(applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_connect_after_apply_upgrades_in_place() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        service.apply(seeker_id, job_id, None, None).await.unwrap();
        let seeker = service.connect(seeker_id, job_id, None).await.unwrap();

        assert_eq!(seeker.applied_jobs.len(), 1);
        assert_eq!(seeker.applied_jobs[0].status, ApplicationStatus::Connected);

        let applicants = service.applicants(None, Some(job_id)).await.unwrap();
        assert_eq!(applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_connected_never_downgrades() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        service.connect(seeker_id, job_id, None).await.unwrap();
        let seeker = service
            .apply(seeker_id, job_id, None, Some(ApplicationStatus::Applied))
            .await
            .unwrap();

        assert_eq!(seeker.applied_jobs.len(), 1);
        assert_eq!(seeker.applied_jobs[0].status, ApplicationStatus::Connected);
    }

    #[tokio::test]
    async fn test_unapplied_can_connect_directly() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        let seeker = service
            .connect(seeker_id, job_id, Some("Senior Welder"))
            .await
            .unwrap();
        assert_eq!(seeker.applied_jobs[0].status, ApplicationStatus::Connected);
    }

    #[tokio::test]
    async fn test_unknown_references_are_rejected() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        let missing_job = service.apply(seeker_id, 9999, None, None).await;
        assert!(matches!(missing_job, Err(ApiError::NotFound(_))));

        let missing_seeker = service.apply(9999, job_id, None, None).await;
        assert!(matches!(missing_seeker, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_applied_for_lists_enriched_postings() {
        let db = Database::in_memory().await.unwrap();
        let (seeker_id, job_id) = seed(db.pool()).await;
        let service = ApplicationService::new(db.pool());

        service.apply(seeker_id, job_id, None, None).await.unwrap();
        let applied = service.applied_for(seeker_id).await.unwrap();

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].id, job_id);
        assert_eq!(
            applied[0].posted_by.company_name.as_deref(),
            Some("Acme Fabrication")
        );

        assert!(matches!(
            service.applied_for(9999).await,
            Err(ApiError::NotFound(_))
        ));
    }
}

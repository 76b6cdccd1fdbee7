// src/identity.rs
//! Identity store: seekers, providers and admins, keyed by contact.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{
    Admin, AdminRow, AppliedJob, ApplicationStatus, IdentityRecord, Provider, ProviderRow, Role,
    Seeker, SeekerRow, join_skills,
};

const SEEKER_COLUMNS: &str = "id, full_name, whatsapp_number, email, skill_type, skills, \
     experience, location, current_ctc, expected_ctc, notice_period, last_working_date, \
     resume, bio, created_at, updated_at";

const PROVIDER_COLUMNS: &str = "id, company_name, hr_name, hr_whatsapp_number, email, created_at";

/// Resolve an identity of the given role by either contact field. This is
/// the single dispatch point for role-based lookups.
pub async fn lookup_identity(
    pool: &SqlitePool,
    role: Role,
    whatsapp_number: Option<&str>,
    email: Option<&str>,
) -> Result<Option<IdentityRecord>> {
    match role {
        Role::Seeker => Ok(SeekerRepository::new(pool)
            .find_by_contact(whatsapp_number, email)
            .await?
            .map(IdentityRecord::Seeker)),
        Role::Provider => Ok(ProviderRepository::new(pool)
            .find_by_contact(whatsapp_number, email)
            .await?
            .map(IdentityRecord::Provider)),
        Role::Admin => Ok(AdminRepository::new(pool)
            .find_by_contact(whatsapp_number, email)
            .await?
            .map(IdentityRecord::Admin)),
    }
}

pub async fn load_applied_jobs(pool: &SqlitePool, seeker_id: i64) -> Result<Vec<AppliedJob>> {
    let rows: Vec<(i64, String, String)> =
        sqlx::query_as("SELECT job_id, title, status FROM applied_jobs WHERE seeker_id = ?")
            .bind(seeker_id)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(job_id, title, status)| AppliedJob {
            job_id,
            title,
            status: ApplicationStatus::parse(&status).unwrap_or(ApplicationStatus::Applied),
        })
        .collect())
}

// ===== Seekers =====

#[derive(Debug, Default, Clone)]
pub struct NewSeeker {
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Vec<String>,
    pub experience: i64,
    pub location: Option<String>,
    pub current_ctc: Option<f64>,
    pub expected_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub last_working_date: Option<String>,
    pub resume: Option<String>,
    pub bio: Option<String>,
}

/// Partial update; only supplied fields are written.
#[derive(Debug, Default, Clone)]
pub struct SeekerUpdate {
    pub full_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<i64>,
    pub location: Option<String>,
    pub current_ctc: Option<f64>,
    pub expected_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub last_working_date: Option<String>,
    pub resume: Option<String>,
    pub bio: Option<String>,
}

pub struct SeekerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SeekerRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a seeker matching either contact field, when present.
    pub async fn find_by_contact(
        &self,
        whatsapp_number: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Seeker>> {
        let sql = format!(
            "SELECT {SEEKER_COLUMNS} FROM seekers \
             WHERE (whatsapp_number = ? AND ? IS NOT NULL) OR (email = ? AND ? IS NOT NULL) \
             LIMIT 1"
        );
        let row: Option<SeekerRow> = sqlx::query_as(&sql)
            .bind(whatsapp_number)
            .bind(whatsapp_number)
            .bind(email)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        self.hydrate(row).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Seeker>> {
        let sql = format!("SELECT {SEEKER_COLUMNS} FROM seekers WHERE id = ?");
        let row: Option<SeekerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        self.hydrate(row).await
    }

    async fn hydrate(&self, row: Option<SeekerRow>) -> Result<Option<Seeker>> {
        match row {
            Some(row) => {
                let applied = load_applied_jobs(self.pool, row.id).await?;
                Ok(Some(row.into_seeker(applied)))
            }
            None => Ok(None),
        }
    }

    pub async fn create(&self, seeker: NewSeeker) -> Result<Seeker> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO seekers (full_name, whatsapp_number, email, skill_type, skills, \
             experience, location, current_ctc, expected_ctc, notice_period, \
             last_working_date, resume, bio, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&seeker.full_name)
        .bind(&seeker.whatsapp_number)
        .bind(&seeker.email)
        .bind(seeker.skill_type.as_deref().unwrap_or("IT"))
        .bind(join_skills(&seeker.skills))
        .bind(seeker.experience)
        .bind(&seeker.location)
        .bind(seeker.current_ctc)
        .bind(seeker.expected_ctc)
        .bind(&seeker.notice_period)
        .bind(&seeker.last_working_date)
        .bind(&seeker.resume)
        .bind(&seeker.bio)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .context("Failed to insert seeker")?;

        let id = result.last_insert_rowid();
        info!("Created seeker {} ({})", id, seeker.full_name);

        self.find_by_id(id)
            .await?
            .context("Seeker vanished after insert")
    }

    pub async fn update(&self, id: i64, update: SeekerUpdate) -> Result<Option<Seeker>> {
        let existing = match self.find_by_id(id).await? {
            Some(s) => s,
            None => return Ok(None),
        };

        let skills = update.skills.unwrap_or(existing.skills);
        sqlx::query(
            "UPDATE seekers SET full_name = ?, whatsapp_number = ?, email = ?, skill_type = ?, \
             skills = ?, experience = ?, location = ?, current_ctc = ?, expected_ctc = ?, \
             notice_period = ?, last_working_date = ?, resume = ?, bio = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(update.full_name.unwrap_or(existing.full_name))
        .bind(update.whatsapp_number.or(existing.whatsapp_number))
        .bind(update.email.or(existing.email))
        .bind(update.skill_type.unwrap_or(existing.skill_type))
        .bind(join_skills(&skills))
        .bind(update.experience.unwrap_or(existing.experience))
        .bind(update.location.or(existing.location))
        .bind(update.current_ctc.or(existing.current_ctc))
        .bind(update.expected_ctc.or(existing.expected_ctc))
        .bind(update.notice_period.or(existing.notice_period))
        .bind(update.last_working_date.or(existing.last_working_date))
        .bind(update.resume.or(existing.resume))
        .bind(update.bio.or(existing.bio))
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        self.find_by_id(id).await
    }

    /// Hard delete (admin action). The seeker's applied-jobs entries go
    /// with the record; job-side applicant back-references are left as-is.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        sqlx::query("DELETE FROM applied_jobs WHERE seeker_id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM seekers WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted seeker {}", id);
        }
        Ok(deleted)
    }

    /// Admin search over seekers: normalized skill terms plus location
    /// substring, both optional.
    pub async fn search(
        &self,
        skills: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<Seeker>> {
        let rows: Vec<SeekerRow> = match location {
            Some(loc) => {
                let sql = format!(
                    "SELECT {SEEKER_COLUMNS} FROM seekers WHERE location LIKE ? ORDER BY id"
                );
                sqlx::query_as(&sql)
                    .bind(format!("%{loc}%"))
                    .fetch_all(self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {SEEKER_COLUMNS} FROM seekers ORDER BY id");
                sqlx::query_as(&sql).fetch_all(self.pool).await?
            }
        };

        let mut seekers = Vec::with_capacity(rows.len());
        for row in rows {
            let applied = load_applied_jobs(self.pool, row.id).await?;
            seekers.push(row.into_seeker(applied));
        }

        if let Some(terms) = skills {
            seekers.retain(|s| crate::search::skills_match(&s.skills, terms));
        }
        Ok(seekers)
    }
}

// ===== Providers =====

#[derive(Debug, Default, Clone)]
pub struct NewProvider {
    pub company_name: String,
    pub hr_name: String,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ProviderUpdate {
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
}

pub struct ProviderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProviderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_contact(
        &self,
        whatsapp_number: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Provider>> {
        let sql = format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers \
             WHERE (hr_whatsapp_number = ? AND ? IS NOT NULL) OR (email = ? AND ? IS NOT NULL) \
             LIMIT 1"
        );
        let row: Option<ProviderRow> = sqlx::query_as(&sql)
            .bind(whatsapp_number)
            .bind(whatsapp_number)
            .bind(email)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Provider::from))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = ?");
        let row: Option<ProviderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Provider::from))
    }

    pub async fn create(&self, provider: NewProvider) -> Result<Provider> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO providers (company_name, hr_name, hr_whatsapp_number, email, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&provider.company_name)
        .bind(&provider.hr_name)
        .bind(&provider.hr_whatsapp_number)
        .bind(&provider.email)
        .bind(now)
        .execute(self.pool)
        .await
        .context("Failed to insert provider")?;

        let id = result.last_insert_rowid();
        info!("Created provider {} ({})", id, provider.company_name);

        self.find_by_id(id)
            .await?
            .context("Provider vanished after insert")
    }

    pub async fn update(&self, id: i64, update: ProviderUpdate) -> Result<Option<Provider>> {
        let existing = match self.find_by_id(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        sqlx::query(
            "UPDATE providers SET company_name = ?, hr_name = ?, hr_whatsapp_number = ?, \
             email = ? WHERE id = ?",
        )
        .bind(update.company_name.unwrap_or(existing.company_name))
        .bind(update.hr_name.unwrap_or(existing.hr_name))
        .bind(update.hr_whatsapp_number.or(existing.hr_whatsapp_number))
        .bind(update.email.or(existing.email))
        .bind(id)
        .execute(self.pool)
        .await?;

        self.find_by_id(id).await
    }
}

// ===== Admins =====

pub struct AdminRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_contact(
        &self,
        whatsapp_number: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, name, whatsapp_number, email, created_at FROM admins \
             WHERE (whatsapp_number = ? AND ? IS NOT NULL) OR (email = ? AND ? IS NOT NULL) \
             LIMIT 1",
        )
        .bind(whatsapp_number)
        .bind(whatsapp_number)
        .bind(email)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Admin::from))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, name, whatsapp_number, email, created_at FROM admins WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Admin::from))
    }

    /// Admins are seeded through the CLI, never through the public API.
    pub async fn create(
        &self,
        name: Option<&str>,
        whatsapp_number: Option<&str>,
        email: Option<&str>,
    ) -> Result<Admin> {
        let result = sqlx::query(
            "INSERT INTO admins (name, whatsapp_number, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(whatsapp_number)
        .bind(email)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to insert admin")?;

        let id = result.last_insert_rowid();
        info!("Seeded admin {}", id);

        self.find_by_id(id)
            .await?
            .context("Admin vanished after insert")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn sample_seeker() -> NewSeeker {
        NewSeeker {
            full_name: "Asha Verma".to_string(),
            whatsapp_number: Some("+919900112233".to_string()),
            email: Some("asha@example.com".to_string()),
            skills: vec!["Welder".to_string(), "Fitter".to_string()],
            experience: 24,
            location: Some("Pune".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_find_seeker_by_either_contact() {
        let db = Database::in_memory().await.unwrap();
        let repo = SeekerRepository::new(db.pool());
        let created = repo.create(sample_seeker()).await.unwrap();

        let by_phone = repo
            .find_by_contact(Some("+919900112233"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.id, created.id);

        let by_email = repo
            .find_by_contact(None, Some("asha@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);

        let miss = repo
            .find_by_contact(Some("+910000000000"), None)
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_partial_seeker_update_keeps_other_fields() {
        let db = Database::in_memory().await.unwrap();
        let repo = SeekerRepository::new(db.pool());
        let created = repo.create(sample_seeker()).await.unwrap();

        let updated = repo
            .update(
                created.id,
                SeekerUpdate {
                    location: Some("Mumbai".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.location.as_deref(), Some("Mumbai"));
        assert_eq!(updated.full_name, "Asha Verma");
        assert_eq!(updated.skills, vec!["Welder", "Fitter"]);
    }

    #[tokio::test]
    async fn test_lookup_identity_dispatches_on_role() {
        let db = Database::in_memory().await.unwrap();
        SeekerRepository::new(db.pool())
            .create(sample_seeker())
            .await
            .unwrap();
        ProviderRepository::new(db.pool())
            .create(NewProvider {
                company_name: "Acme Fabrication".to_string(),
                hr_name: "Ravi".to_string(),
                hr_whatsapp_number: Some("+918800774455".to_string()),
                email: Some("hr@acme.example".to_string()),
            })
            .await
            .unwrap();

        let seeker = lookup_identity(db.pool(), Role::Seeker, None, Some("asha@example.com"))
            .await
            .unwrap();
        assert!(matches!(seeker, Some(IdentityRecord::Seeker(_))));

        let provider = lookup_identity(db.pool(), Role::Provider, Some("+918800774455"), None)
            .await
            .unwrap();
        assert!(matches!(provider, Some(IdentityRecord::Provider(_))));

        let admin = lookup_identity(db.pool(), Role::Admin, None, Some("asha@example.com"))
            .await
            .unwrap();
        assert!(admin.is_none());
    }

    #[tokio::test]
    async fn test_seeker_search_by_skill_and_location() {
        let db = Database::in_memory().await.unwrap();
        let repo = SeekerRepository::new(db.pool());
        repo.create(sample_seeker()).await.unwrap();
        repo.create(NewSeeker {
            full_name: "Binod Kumar".to_string(),
            email: Some("binod@example.com".to_string()),
            skills: vec!["Electrician".to_string()],
            location: Some("Nagpur".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let welders = repo.search(Some("welder"), None).await.unwrap();
        assert_eq!(welders.len(), 1);
        assert_eq!(welders[0].full_name, "Asha Verma");

        let nagpur = repo.search(None, Some("nag")).await.unwrap();
        assert_eq!(nagpur.len(), 1);
        assert_eq!(nagpur[0].full_name, "Binod Kumar");
    }
}

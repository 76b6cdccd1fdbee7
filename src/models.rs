// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role tag. All role branching goes through this enum rather than
/// string comparison at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Provider,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "seeker" => Some(Role::Seeker),
            "provider" => Some(Role::Provider),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }
}

/// State of a seeker's interest in a job posting. `Connected` is terminal;
/// an existing entry never regresses to `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Connected,
}

impl ApplicationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Applied" => Some(ApplicationStatus::Applied),
            "Connected" => Some(ApplicationStatus::Connected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Connected => "Connected",
        }
    }
}

/// One entry in a seeker's applied-jobs list. Unique per (seeker, job).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub job_id: i64,
    pub title: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seeker {
    #[serde(rename = "_id")]
    pub id: i64,
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub skill_type: String,
    pub skills: Vec<String>,
    pub experience: i64,
    pub location: Option<String>,
    #[serde(rename = "currentCTC")]
    pub current_ctc: Option<f64>,
    #[serde(rename = "expectedCTC")]
    pub expected_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub last_working_date: Option<String>,
    pub resume: Option<String>,
    pub bio: Option<String>,
    pub applied_jobs: Vec<AppliedJob>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(rename = "_id")]
    pub id: i64,
    pub company_name: String,
    pub hr_name: String,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A resolved identity of any role, as returned by the single lookup
/// function in the identity store.
#[derive(Debug, Clone)]
pub enum IdentityRecord {
    Seeker(Seeker),
    Provider(Provider),
    Admin(Admin),
}

impl IdentityRecord {
    pub fn id(&self) -> i64 {
        match self {
            IdentityRecord::Seeker(s) => s.id,
            IdentityRecord::Provider(p) => p.id,
            IdentityRecord::Admin(a) => a.id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            IdentityRecord::Seeker(s) => serde_json::to_value(s).unwrap_or_default(),
            IdentityRecord::Provider(p) => serde_json::to_value(p).unwrap_or_default(),
            IdentityRecord::Admin(a) => serde_json::to_value(a).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(rename = "_id")]
    pub id: i64,
    pub job_title: String,
    pub skill_type: Option<String>,
    pub skills: Vec<String>,
    pub experience_required: i64,
    pub location: Option<String>,
    #[serde(rename = "maxCTC")]
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub available: bool,
    pub viewed: bool,
    pub posted_by: i64,
    pub created_at: DateTime<Utc>,
}

/// The denormalized provider fields attached to a posting for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    #[serde(rename = "_id")]
    pub id: i64,
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub hr_whatsapp_number: Option<String>,
}

/// A posting enriched with its provider, the shape search results and
/// applied-jobs listings are served in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithProvider {
    #[serde(rename = "_id")]
    pub id: i64,
    pub job_title: String,
    pub skill_type: Option<String>,
    pub skills: Vec<String>,
    pub experience_required: i64,
    pub location: Option<String>,
    #[serde(rename = "maxCTC")]
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub available: bool,
    pub viewed: bool,
    pub posted_by: ProviderSummary,
    pub created_at: DateTime<Utc>,
}

/// Skills are stored as one comma-joined TEXT column; terms are trimmed on
/// the way in and empty terms dropped.
pub fn join_skills(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ===== Row types (sqlx) =====

#[derive(Debug, sqlx::FromRow)]
pub struct SeekerRow {
    pub id: i64,
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub skill_type: String,
    pub skills: String,
    pub experience: i64,
    pub location: Option<String>,
    pub current_ctc: Option<f64>,
    pub expected_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub last_working_date: Option<String>,
    pub resume: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeekerRow {
    pub fn into_seeker(self, applied_jobs: Vec<AppliedJob>) -> Seeker {
        Seeker {
            id: self.id,
            full_name: self.full_name,
            whatsapp_number: self.whatsapp_number,
            email: self.email,
            skill_type: self.skill_type,
            skills: split_skills(&self.skills),
            experience: self.experience,
            location: self.location,
            current_ctc: self.current_ctc,
            expected_ctc: self.expected_ctc,
            notice_period: self.notice_period,
            last_working_date: self.last_working_date,
            resume: self.resume,
            bio: self.bio,
            applied_jobs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub job_title: String,
    pub skill_type: Option<String>,
    pub skills: String,
    pub experience_required: i64,
    pub location: Option<String>,
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub available: bool,
    pub viewed: bool,
    pub posted_by: i64,
    pub created_at: DateTime<Utc>,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        JobPosting {
            id: row.id,
            job_title: row.job_title,
            skill_type: row.skill_type,
            skills: split_skills(&row.skills),
            experience_required: row.experience_required,
            location: row.location,
            max_ctc: row.max_ctc,
            notice_period: row.notice_period,
            available: row.available,
            viewed: row.viewed,
            posted_by: row.posted_by,
            created_at: row.created_at,
        }
    }
}

/// Job columns joined with the posting provider's display fields.
#[derive(Debug, sqlx::FromRow)]
pub struct JobWithProviderRow {
    pub id: i64,
    pub job_title: String,
    pub skill_type: Option<String>,
    pub skills: String,
    pub experience_required: i64,
    pub location: Option<String>,
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub available: bool,
    pub viewed: bool,
    pub posted_by: i64,
    pub created_at: DateTime<Utc>,
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub hr_whatsapp_number: Option<String>,
}

impl From<JobWithProviderRow> for JobWithProvider {
    fn from(row: JobWithProviderRow) -> Self {
        JobWithProvider {
            id: row.id,
            job_title: row.job_title,
            skill_type: row.skill_type,
            skills: split_skills(&row.skills),
            experience_required: row.experience_required,
            location: row.location,
            max_ctc: row.max_ctc,
            notice_period: row.notice_period,
            available: row.available,
            viewed: row.viewed,
            posted_by: ProviderSummary {
                id: row.posted_by,
                company_name: row.company_name,
                hr_name: row.hr_name,
                hr_whatsapp_number: row.hr_whatsapp_number,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: i64,
    pub company_name: String,
    pub hr_name: String,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Provider {
            id: row.id,
            company_name: row.company_name,
            hr_name: row.hr_name,
            hr_whatsapp_number: row.hr_whatsapp_number,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AdminRow {
    pub id: i64,
    pub name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            name: row.name,
            whatsapp_number: row.whatsapp_number,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

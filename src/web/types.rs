// src/web/types.rs
//! Wire types: JSON payloads, multipart forms, query parameters.
//!
//! Field names follow the frontend's camelCase convention. A few payload
//! fields are lenient unions because clients have historically sent them
//! in more than one shape.

use rocket::form::FromForm;
use rocket::fs::TempFile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::IdentityRecord;

/// Paths the running server writes to.
pub struct ServerConfig {
    pub uploads_dir: PathBuf,
}

// ---- auth ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpPayload {
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub login_request: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpIssuedResponse {
    pub message: String,
    pub server_otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpPayload {
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub otp: Option<String>,
    pub server_otp: Option<String>,
    #[serde(default)]
    pub bypass: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResponse {
    pub message: String,
    pub user: Option<serde_json::Value>,
    pub is_new_user: bool,
    pub token: Option<String>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

/// `{message, user}` as returned by registration and profile edits.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: serde_json::Value,
}

impl ProfileResponse {
    pub fn new(message: impl Into<String>, user: &IdentityRecord) -> Self {
        Self {
            message: message.into(),
            user: user.to_json(),
        }
    }
}

// ---- lenient unions ----

/// Skills arrive either as a JSON array or a comma-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsField {
    List(Vec<String>),
    Csv(String),
}

impl SkillsField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            SkillsField::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            SkillsField::Csv(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Numbers arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberLike::Int(v) => Some(*v as f64),
            NumberLike::Float(v) => Some(*v),
            NumberLike::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberLike::Int(v) => Some(*v),
            NumberLike::Float(v) => Some(*v as i64),
            NumberLike::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The posting provider, either a bare id or an embedded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProviderRef {
    Id(i64),
    Embedded {
        #[serde(rename = "_id")]
        id: i64,
    },
}

impl ProviderRef {
    pub fn id(&self) -> i64 {
        match self {
            ProviderRef::Id(id) => *id,
            ProviderRef::Embedded { id } => *id,
        }
    }
}

// ---- profiles ----

/// Multipart form for seeker registration and profile edits. `resume` is
/// the optional file part.
#[derive(FromForm)]
pub struct SeekerProfileForm<'f> {
    // Updates carry the record id under the Mongo-era `_id` key.
    #[field(name = "_id")]
    pub seeker_id: Option<i64>,
    #[field(name = "fullName")]
    pub full_name: Option<String>,
    #[field(name = "whatsappNumber")]
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    #[field(name = "skillType")]
    pub skill_type: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<i64>,
    pub location: Option<String>,
    #[field(name = "currentCTC")]
    pub current_ctc: Option<f64>,
    #[field(name = "expectedCTC")]
    pub expected_ctc: Option<f64>,
    #[field(name = "noticePeriod")]
    pub notice_period: Option<String>,
    #[field(name = "lastWorkingDate")]
    pub last_working_date: Option<String>,
    pub bio: Option<String>,
    pub resume: Option<TempFile<'f>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCreatePayload {
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdatePayload {
    #[serde(rename = "_id", alias = "providerId")]
    pub provider_id: Option<i64>,
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub hr_whatsapp_number: Option<String>,
    pub email: Option<String>,
}

#[derive(FromForm)]
pub struct GetProfileParams {
    pub role: String,
    #[field(name = "whatsappNumber")]
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
}

// ---- jobs ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostJobPayload {
    pub job_title: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Option<SkillsField>,
    pub experience_required: Option<NumberLike>,
    pub location: Option<String>,
    #[serde(rename = "maxCTC")]
    pub max_ctc: Option<NumberLike>,
    pub notice_period: Option<String>,
    pub posted_by: Option<ProviderRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobPayload {
    // The dashboard sends the Mongo-era `_id` key; `jobId` also accepted.
    #[serde(rename = "_id", alias = "jobId")]
    pub job_id: i64,
    pub job_title: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Option<SkillsField>,
    pub experience_required: Option<NumberLike>,
    pub location: Option<String>,
    #[serde(rename = "maxCTC")]
    pub max_ctc: Option<NumberLike>,
    pub notice_period: Option<String>,
    pub posted_by: Option<ProviderRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobPayload {
    pub job_id: i64,
}

#[derive(FromForm)]
pub struct SearchParams {
    pub skills: Option<String>,
    pub experience: Option<i64>,
    pub location: Option<String>,
    #[field(name = "minCTC")]
    pub min_ctc: Option<f64>,
    #[field(name = "maxCTC")]
    pub max_ctc: Option<f64>,
    #[field(name = "noticePeriod")]
    pub notice_period: Option<String>,
    pub filters: Option<String>,
    #[field(name = "postedBy")]
    pub posted_by: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: crate::models::JobPosting,
    pub success: bool,
}

/// `{success, data}` envelope used by the trending and applied-for
/// listings.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<crate::models::JobWithProvider>,
}

// ---- applications ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyJobPayload {
    pub seeker_id: i64,
    pub job_id: i64,
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(FromForm)]
pub struct ApplicantsParams {
    #[field(name = "providerId")]
    pub provider_id: Option<i64>,
    #[field(name = "jobId")]
    pub job_id: Option<i64>,
}

#[derive(FromForm)]
pub struct AppliedForParams {
    #[field(name = "seekerId")]
    pub seeker_id: Option<i64>,
}

/// `{message, seeker}` as the apply and admin seeker-update endpoints
/// have always answered.
#[derive(Debug, Serialize)]
pub struct SeekerEnvelope {
    pub message: String,
    pub seeker: serde_json::Value,
}

// ---- admin ----

#[derive(FromForm)]
pub struct SeekersSearchParams {
    pub skills: Option<String>,
    pub location: Option<String>,
}

#[derive(FromForm)]
pub struct ExcelUploadForm<'f> {
    #[field(name = "type")]
    pub kind: String,
    pub file: TempFile<'f>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSeekerPayload {
    pub seeker_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeekerPayload {
    #[serde(rename = "_id", alias = "seekerId")]
    pub seeker_id: i64,
    pub full_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub skill_type: Option<String>,
    pub skills: Option<SkillsField>,
    pub experience: Option<NumberLike>,
    pub location: Option<String>,
    #[serde(rename = "currentCTC")]
    pub current_ctc: Option<NumberLike>,
    #[serde(rename = "expectedCTC")]
    pub expected_ctc: Option<NumberLike>,
    pub notice_period: Option<String>,
    pub last_working_date: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MassEmailPayload {
    pub seeker_ids: Vec<i64>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MassEmailResponse {
    pub message: String,
    pub delivered: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_field_accepts_both_shapes() {
        let list: SkillsField = serde_json::from_str(r#"["Welder", " Fitter "]"#).unwrap();
        assert_eq!(list.into_vec(), vec!["Welder", "Fitter"]);

        let csv: SkillsField = serde_json::from_str(r#""Welder, Fitter,""#).unwrap();
        assert_eq!(csv.into_vec(), vec!["Welder", "Fitter"]);
    }

    #[test]
    fn test_number_like_coerces_strings() {
        let n: NumberLike = serde_json::from_str("\"450000\"").unwrap();
        assert_eq!(n.as_f64(), Some(450000.0));
        assert_eq!(n.as_i64(), Some(450000));

        let n: NumberLike = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.as_f64(), Some(12.5));

        let n: NumberLike = serde_json::from_str("\"many\"").unwrap();
        assert_eq!(n.as_f64(), None);
    }

    #[test]
    fn test_provider_ref_accepts_id_or_object() {
        let bare: ProviderRef = serde_json::from_str("7").unwrap();
        assert_eq!(bare.id(), 7);

        let embedded: ProviderRef = serde_json::from_str(r#"{"_id": 7}"#).unwrap();
        assert_eq!(embedded.id(), 7);
    }

    #[test]
    fn test_post_job_payload_parses_frontend_shape() {
        let payload: PostJobPayload = serde_json::from_str(
            r#"{
                "jobTitle": "Senior Welder",
                "skills": "Arc Welder, Fabricator",
                "experienceRequired": "24",
                "maxCTC": 500000,
                "postedBy": {"_id": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(payload.job_title.as_deref(), Some("Senior Welder"));
        assert_eq!(
            payload.skills.unwrap().into_vec(),
            vec!["Arc Welder", "Fabricator"]
        );
        assert_eq!(payload.experience_required.unwrap().as_i64(), Some(24));
        assert_eq!(payload.posted_by.unwrap().id(), 3);
    }
}

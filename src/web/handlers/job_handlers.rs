// src/web/handlers/job_handlers.rs
//! Posting, search, applications and the admin moderation surface.

use rocket::form::Form;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use crate::applications::{ApplicantEntry, ApplicationService};
use crate::database::Database;
use crate::dispatch::OtpChannel;
use crate::error::{ApiError, ApiResult};
use crate::identity::{SeekerRepository, SeekerUpdate};
use crate::import::{import_bytes, ImportKind};
use crate::jobs::{JobRepository, JobUpdate, NewJob};
use crate::models::{ApplicationStatus, IdentityRecord, JobWithProvider, Seeker};
use crate::search::{search_jobs, SearchCriteria};
use crate::web::types::{
    ApplicantsParams, AppliedForParams, ApplyJobPayload, DeleteJobPayload, DeleteSeekerPayload,
    ExcelUploadForm, JobListResponse, JobResponse, MassEmailPayload, MassEmailResponse,
    MessageResponse, PostJobPayload, SearchParams, SeekerEnvelope, SeekersSearchParams,
    UpdateJobPayload, UpdateSeekerPayload,
};

pub async fn post_job_handler(
    payload: Json<PostJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    let payload = payload.into_inner();

    let job_title = payload
        .job_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Job title is required".to_string()))?;
    let posted_by = payload
        .posted_by
        .map(|p| p.id())
        .ok_or_else(|| ApiError::Validation("Provider reference is required".to_string()))?;

    let job = JobRepository::new(db.pool())
        .create(NewJob {
            job_title,
            skill_type: payload.skill_type,
            skills: payload.skills.map(|s| s.into_vec()).unwrap_or_default(),
            experience_required: payload
                .experience_required
                .and_then(|n| n.as_i64())
                .unwrap_or(0),
            location: payload.location,
            max_ctc: payload.max_ctc.and_then(|n| n.as_f64()),
            notice_period: payload.notice_period,
            posted_by,
        })
        .await
        .map_err(ApiError::server)?;

    Ok(Json(JobResponse {
        message: "Job posted successfully".to_string(),
        job,
        success: true,
    }))
}

pub async fn search_jobs_handler(
    params: SearchParams,
    db: &State<Database>,
) -> ApiResult<Json<Vec<JobWithProvider>>> {
    let criteria = SearchCriteria {
        skills: params.skills,
        experience: params.experience,
        location: params.location,
        min_ctc: params.min_ctc,
        max_ctc: params.max_ctc,
        notice_period: params.notice_period,
        filters: params.filters,
        posted_by: params.posted_by,
    };

    let jobs = search_jobs(db.pool(), &criteria)
        .await
        .map_err(ApiError::server)?;
    Ok(Json(jobs))
}

pub async fn apply_job_handler(
    payload: Json<ApplyJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<SeekerEnvelope>> {
    let status = match payload.status.as_deref() {
        Some(raw) => Some(
            ApplicationStatus::parse(raw)
                .ok_or_else(|| ApiError::Validation("Invalid status specified".to_string()))?,
        ),
        None => None,
    };

    let seeker = ApplicationService::new(db.pool())
        .apply(
            payload.seeker_id,
            payload.job_id,
            payload.title.as_deref(),
            status,
        )
        .await?;

    Ok(Json(SeekerEnvelope {
        message: "Application recorded".to_string(),
        seeker: IdentityRecord::Seeker(seeker).to_json(),
    }))
}

pub async fn toggle_availability_handler(
    job_id: i64,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    let job = JobRepository::new(db.pool())
        .toggle_availability(job_id)
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    Ok(Json(JobResponse {
        message: "Job availability toggled".to_string(),
        job,
        success: true,
    }))
}

pub async fn applicants_handler(
    params: ApplicantsParams,
    db: &State<Database>,
) -> ApiResult<Json<Vec<ApplicantEntry>>> {
    let applicants = ApplicationService::new(db.pool())
        .applicants(params.provider_id, params.job_id)
        .await?;
    Ok(Json(applicants))
}

pub async fn applied_for_handler(
    params: AppliedForParams,
    db: &State<Database>,
) -> ApiResult<Json<JobListResponse>> {
    let seeker_id = params
        .seeker_id
        .ok_or_else(|| ApiError::Validation("Seeker ID is required".to_string()))?;

    let jobs = ApplicationService::new(db.pool())
        .applied_for(seeker_id)
        .await?;
    Ok(Json(JobListResponse {
        success: true,
        message: Some("Applied jobs fetched successfully".to_string()),
        data: jobs,
    }))
}

pub async fn trending_skills_handler(db: &State<Database>) -> ApiResult<Json<JobListResponse>> {
    let jobs = JobRepository::new(db.pool())
        .trending()
        .await
        .map_err(ApiError::server)?;
    Ok(Json(JobListResponse {
        success: true,
        message: None,
        data: jobs,
    }))
}

// ---- admin ----

pub async fn update_job_handler(
    payload: Json<UpdateJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    let payload = payload.into_inner();
    let job = JobRepository::new(db.pool())
        .update(
            payload.job_id,
            JobUpdate {
                job_title: payload.job_title,
                skill_type: payload.skill_type,
                skills: payload.skills.map(|s| s.into_vec()),
                experience_required: payload.experience_required.and_then(|n| n.as_i64()),
                location: payload.location,
                max_ctc: payload.max_ctc.and_then(|n| n.as_f64()),
                notice_period: payload.notice_period,
                posted_by: payload.posted_by.map(|p| p.id()),
            },
        )
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    Ok(Json(JobResponse {
        message: "Job updated successfully".to_string(),
        job,
        success: true,
    }))
}

pub async fn delete_job_handler(
    payload: Json<DeleteJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = JobRepository::new(db.pool())
        .delete(payload.job_id)
        .await
        .map_err(ApiError::server)?;
    if !deleted {
        return Err(ApiError::NotFound("Job not found".to_string()));
    }
    Ok(Json(MessageResponse::ok("Job deleted successfully")))
}

pub async fn delete_seeker_handler(
    payload: Json<DeleteSeekerPayload>,
    db: &State<Database>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = SeekerRepository::new(db.pool())
        .delete(payload.seeker_id)
        .await
        .map_err(ApiError::server)?;
    if !deleted {
        return Err(ApiError::NotFound("Seeker not found".to_string()));
    }
    Ok(Json(MessageResponse::ok("Seeker deleted successfully")))
}

pub async fn update_seeker_handler(
    payload: Json<UpdateSeekerPayload>,
    db: &State<Database>,
) -> ApiResult<Json<SeekerEnvelope>> {
    let payload = payload.into_inner();
    let updated = SeekerRepository::new(db.pool())
        .update(
            payload.seeker_id,
            SeekerUpdate {
                full_name: payload.full_name,
                whatsapp_number: payload.whatsapp_number,
                email: payload.email,
                skill_type: payload.skill_type,
                skills: payload.skills.map(|s| s.into_vec()),
                experience: payload.experience.and_then(|n| n.as_i64()),
                location: payload.location,
                current_ctc: payload.current_ctc.and_then(|n| n.as_f64()),
                expected_ctc: payload.expected_ctc.and_then(|n| n.as_f64()),
                notice_period: payload.notice_period,
                last_working_date: payload.last_working_date,
                resume: None,
                bio: payload.bio,
            },
        )
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))?;

    Ok(Json(SeekerEnvelope {
        message: "Seeker updated successfully".to_string(),
        seeker: IdentityRecord::Seeker(updated).to_json(),
    }))
}

pub async fn search_seekers_handler(
    params: SeekersSearchParams,
    db: &State<Database>,
) -> ApiResult<Json<Vec<Seeker>>> {
    let seekers = SeekerRepository::new(db.pool())
        .search(params.skills.as_deref(), params.location.as_deref())
        .await
        .map_err(ApiError::server)?;
    Ok(Json(seekers))
}

pub async fn mass_email_handler(
    payload: Json<MassEmailPayload>,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
) -> ApiResult<Json<MassEmailResponse>> {
    let payload = payload.into_inner();
    if payload.seeker_ids.is_empty() {
        return Err(ApiError::Validation(
            "At least one seeker is required".to_string(),
        ));
    }

    let subject = payload.subject.unwrap_or_default();
    let body = payload.body.unwrap_or_default();
    let message = if subject.is_empty() {
        body.clone()
    } else {
        format!("{subject}\n\n{body}")
    };

    let repo = SeekerRepository::new(db.pool());
    let mut delivered = 0;
    let mut skipped = 0;

    for seeker_id in payload.seeker_ids {
        let seeker = repo.find_by_id(seeker_id).await.map_err(ApiError::server)?;
        let email = seeker.as_ref().and_then(|s| s.email.clone());
        match email {
            Some(address) => match channel.send(&address, &message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Mass email to seeker {} failed: {}", seeker_id, e);
                    skipped += 1;
                }
            },
            None => {
                warn!("Seeker {} has no email address, skipping", seeker_id);
                skipped += 1;
            }
        }
    }

    info!("Mass email done: {} delivered, {} skipped", delivered, skipped);
    Ok(Json(MassEmailResponse {
        message: "Mass emails sent successfully".to_string(),
        delivered,
        skipped,
    }))
}

pub async fn upload_excel_handler(
    form: Form<ExcelUploadForm<'_>>,
    db: &State<Database>,
) -> ApiResult<Json<serde_json::Value>> {
    let kind = ImportKind::parse(&form.kind)
        .ok_or_else(|| ApiError::Validation("Invalid type specified".to_string()))?;

    // TempFile::path() is None only for text parts masquerading as files.
    let path = form
        .file
        .path()
        .ok_or_else(|| ApiError::Validation("Invalid uploaded file".to_string()))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::server(e.into()))?;

    let report = import_bytes(db.pool(), kind, &bytes)
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let response = match kind {
        ImportKind::Seekers => serde_json::json!({
            "message": "Seekers uploaded successfully",
            "seekersCount": report.inserted,
            "skipped": report.skipped,
        }),
        ImportKind::Jobs => serde_json::json!({
            "message": "Jobs uploaded successfully",
            "jobsCount": report.inserted,
            "skipped": report.skipped,
        }),
    };
    Ok(Json(response))
}

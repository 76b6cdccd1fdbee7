// src/web/handlers/profile_handlers.rs
//! Seeker and provider profile creation and edits.

use std::path::Path;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{ApiError, ApiResult};
use crate::identity::{
    NewProvider, NewSeeker, ProviderRepository, ProviderUpdate, SeekerRepository, SeekerUpdate,
};
use crate::models::{split_skills, IdentityRecord};
use crate::web::types::{
    ProfileResponse, ProviderCreatePayload, ProviderUpdatePayload, SeekerProfileForm, ServerConfig,
};

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Store an uploaded resume under a fresh name and return its public path.
async fn persist_resume(
    file: &mut TempFile<'_>,
    uploads_dir: &Path,
) -> ApiResult<String> {
    let extension = file
        .content_type()
        .and_then(|ct| ct.extension())
        .map(|e| e.as_str().to_string())
        .unwrap_or_else(|| "pdf".to_string());
    let filename = format!("{}.{}", Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| ApiError::server(e.into()))?;
    let target = uploads_dir.join(&filename);
    file.persist_to(&target)
        .await
        .map_err(|e| ApiError::server(e.into()))?;

    info!("Stored resume at {}", target.display());
    Ok(format!("/uploads/{filename}"))
}

pub async fn create_seeker_handler(
    mut form: Form<SeekerProfileForm<'_>>,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> ApiResult<Json<ProfileResponse>> {
    let full_name = non_blank(form.full_name.as_ref())
        .ok_or_else(|| ApiError::Validation("Full name is required".to_string()))?;

    let whatsapp = non_blank(form.whatsapp_number.as_ref());
    let email = non_blank(form.email.as_ref());
    if whatsapp.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "WhatsApp number or email is required".to_string(),
        ));
    }

    let repo = SeekerRepository::new(db.pool());
    let existing = repo
        .find_by_contact(whatsapp.as_deref(), email.as_deref())
        .await
        .map_err(ApiError::server)?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User already exists. Please login.".to_string(),
        ));
    }

    let resume = match form.resume.as_mut() {
        Some(file) => Some(persist_resume(file, &config.uploads_dir).await?),
        None => None,
    };

    let seeker = repo
        .create(NewSeeker {
            full_name,
            whatsapp_number: whatsapp,
            email,
            skill_type: non_blank(form.skill_type.as_ref()),
            skills: form
                .skills
                .as_deref()
                .map(split_skills)
                .unwrap_or_default(),
            experience: form.experience.unwrap_or(0),
            location: non_blank(form.location.as_ref()),
            current_ctc: form.current_ctc,
            expected_ctc: form.expected_ctc,
            notice_period: non_blank(form.notice_period.as_ref()),
            last_working_date: non_blank(form.last_working_date.as_ref()),
            resume,
            bio: non_blank(form.bio.as_ref()),
        })
        .await
        .map_err(ApiError::server)?;

    Ok(Json(ProfileResponse::new(
        "Profile created successfully",
        &IdentityRecord::Seeker(seeker),
    )))
}

pub async fn update_seeker_profile_handler(
    mut form: Form<SeekerProfileForm<'_>>,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> ApiResult<Json<ProfileResponse>> {
    let seeker_id = form
        .seeker_id
        .ok_or_else(|| ApiError::Validation("Seeker ID is required".to_string()))?;

    let repo = SeekerRepository::new(db.pool());
    repo.find_by_id(seeker_id)
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))?;

    let resume = match form.resume.as_mut() {
        Some(file) => Some(persist_resume(file, &config.uploads_dir).await?),
        None => None,
    };

    let updated = repo
        .update(
            seeker_id,
            SeekerUpdate {
                full_name: non_blank(form.full_name.as_ref()),
                whatsapp_number: non_blank(form.whatsapp_number.as_ref()),
                email: non_blank(form.email.as_ref()),
                skill_type: non_blank(form.skill_type.as_ref()),
                skills: form.skills.as_deref().map(split_skills),
                experience: form.experience,
                location: non_blank(form.location.as_ref()),
                current_ctc: form.current_ctc,
                expected_ctc: form.expected_ctc,
                notice_period: non_blank(form.notice_period.as_ref()),
                last_working_date: non_blank(form.last_working_date.as_ref()),
                resume,
                bio: non_blank(form.bio.as_ref()),
            },
        )
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Seeker not found".to_string()))?;

    Ok(Json(ProfileResponse::new(
        "Seeker profile updated successfully",
        &IdentityRecord::Seeker(updated),
    )))
}

pub async fn create_provider_handler(
    payload: Json<ProviderCreatePayload>,
    db: &State<Database>,
) -> ApiResult<Json<ProfileResponse>> {
    let company_name = non_blank(payload.company_name.as_ref())
        .ok_or_else(|| ApiError::Validation("Company name is required".to_string()))?;
    let hr_name = non_blank(payload.hr_name.as_ref())
        .ok_or_else(|| ApiError::Validation("HR name is required".to_string()))?;

    let whatsapp = non_blank(payload.hr_whatsapp_number.as_ref());
    let email = non_blank(payload.email.as_ref());
    if whatsapp.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "WhatsApp number or email is required".to_string(),
        ));
    }

    let repo = ProviderRepository::new(db.pool());
    let existing = repo
        .find_by_contact(whatsapp.as_deref(), email.as_deref())
        .await
        .map_err(ApiError::server)?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Provider already exists. Please login.".to_string(),
        ));
    }

    let provider = repo
        .create(NewProvider {
            company_name,
            hr_name,
            hr_whatsapp_number: whatsapp,
            email,
        })
        .await
        .map_err(ApiError::server)?;

    Ok(Json(ProfileResponse::new(
        "Profile created successfully",
        &IdentityRecord::Provider(provider),
    )))
}

pub async fn update_provider_handler(
    payload: Json<ProviderUpdatePayload>,
    db: &State<Database>,
) -> ApiResult<Json<ProfileResponse>> {
    let provider_id = payload
        .provider_id
        .ok_or_else(|| ApiError::Validation("Provider ID is required".to_string()))?;

    let repo = ProviderRepository::new(db.pool());
    let updated = repo
        .update(
            provider_id,
            ProviderUpdate {
                company_name: non_blank(payload.company_name.as_ref()),
                hr_name: non_blank(payload.hr_name.as_ref()),
                hr_whatsapp_number: non_blank(payload.hr_whatsapp_number.as_ref()),
                email: non_blank(payload.email.as_ref()),
            },
        )
        .await
        .map_err(ApiError::server)?
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))?;

    Ok(Json(ProfileResponse::new(
        "Provider profile updated successfully",
        &IdentityRecord::Provider(updated),
    )))
}

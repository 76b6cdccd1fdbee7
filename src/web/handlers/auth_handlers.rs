// src/web/handlers/auth_handlers.rs
//! OTP issue/verify and profile retrieval.

use rocket::serde::json::Json;
use rocket::State;

use crate::database::Database;
use crate::dispatch::OtpChannel;
use crate::environment::Secrets;
use crate::error::{ApiError, ApiResult};
use crate::identity::lookup_identity;
use crate::models::Role;
use crate::otp::OtpManager;
use crate::web::types::{
    GetProfileParams, OtpIssuedResponse, RequestOtpPayload, VerifiedResponse, VerifyOtpPayload,
};

pub async fn request_otp_handler(
    payload: Json<RequestOtpPayload>,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
    secrets: &State<Secrets>,
) -> ApiResult<Json<OtpIssuedResponse>> {
    let manager = OtpManager::new(db.pool(), channel.as_ref(), secrets);
    let issued = manager
        .request_challenge(
            payload.whatsapp_number.as_deref(),
            payload.email.as_deref(),
            payload.role.as_deref(),
            payload.login_request,
        )
        .await?;

    Ok(Json(OtpIssuedResponse {
        message: issued.message,
        server_otp: issued.server_otp,
    }))
}

pub async fn verify_otp_handler(
    payload: Json<VerifyOtpPayload>,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
    secrets: &State<Secrets>,
) -> ApiResult<Json<VerifiedResponse>> {
    let manager = OtpManager::new(db.pool(), channel.as_ref(), secrets);
    let outcome = manager
        .verify_challenge(
            payload.whatsapp_number.as_deref(),
            payload.email.as_deref(),
            payload.role.as_deref(),
            payload.otp.as_deref(),
            payload.server_otp.as_deref(),
            payload.bypass,
        )
        .await?;

    Ok(Json(VerifiedResponse {
        message: outcome.message,
        user: outcome.user.as_ref().map(|u| u.to_json()),
        is_new_user: outcome.is_new_user,
        token: outcome.token,
        success: true,
    }))
}

pub async fn get_profile_handler(
    params: GetProfileParams,
    db: &State<Database>,
) -> ApiResult<Json<serde_json::Value>> {
    let role = Role::parse(params.role.trim())
        .ok_or_else(|| ApiError::Validation("Invalid role specified".to_string()))?;

    let record = lookup_identity(
        db.pool(),
        role,
        params.whatsapp_number.as_deref(),
        params.email.as_deref(),
    )
    .await
    .map_err(ApiError::server)?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(record.to_json()))
}

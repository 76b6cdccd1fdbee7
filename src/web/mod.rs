// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Request, Response, State};
use serde_json::{json, Value};
use tracing::info;

use crate::applications::ApplicantEntry;
use crate::auth::AdminUser;
use crate::database::Database;
use crate::dispatch::{channel_from_secrets, OtpChannel};
use crate::environment::{EnvironmentConfig, Secrets};
use crate::error::ApiResult;
use crate::models::{JobWithProvider, Seeker};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ---- auth routes ----

#[post("/request-otp", data = "<payload>")]
pub async fn request_otp(
    payload: Json<RequestOtpPayload>,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
    secrets: &State<Secrets>,
) -> ApiResult<Json<OtpIssuedResponse>> {
    handlers::request_otp_handler(payload, db, channel, secrets).await
}

#[post("/verify-otp", data = "<payload>")]
pub async fn verify_otp(
    payload: Json<VerifyOtpPayload>,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
    secrets: &State<Secrets>,
) -> ApiResult<Json<VerifiedResponse>> {
    handlers::verify_otp_handler(payload, db, channel, secrets).await
}

#[get("/profile?<params..>")]
pub async fn get_profile(
    params: GetProfileParams,
    db: &State<Database>,
) -> ApiResult<Json<Value>> {
    handlers::get_profile_handler(params, db).await
}

// Same lookup, reachable from the profile mount as well.
#[get("/get-profile?<params..>")]
pub async fn get_profile_alias(
    params: GetProfileParams,
    db: &State<Database>,
) -> ApiResult<Json<Value>> {
    handlers::get_profile_handler(params, db).await
}

// ---- profile routes ----

#[post("/seeker", data = "<form>")]
pub async fn create_seeker(
    form: Form<SeekerProfileForm<'_>>,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> ApiResult<Json<ProfileResponse>> {
    handlers::create_seeker_handler(form, db, config).await
}

#[post("/seeker/update", data = "<form>")]
pub async fn update_seeker_profile(
    form: Form<SeekerProfileForm<'_>>,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> ApiResult<Json<ProfileResponse>> {
    handlers::update_seeker_profile_handler(form, db, config).await
}

#[post("/provider", data = "<payload>")]
pub async fn create_provider(
    payload: Json<ProviderCreatePayload>,
    db: &State<Database>,
) -> ApiResult<Json<ProfileResponse>> {
    handlers::create_provider_handler(payload, db).await
}

#[post("/provider/update", data = "<payload>")]
pub async fn update_provider(
    payload: Json<ProviderUpdatePayload>,
    db: &State<Database>,
) -> ApiResult<Json<ProfileResponse>> {
    handlers::update_provider_handler(payload, db).await
}

// ---- job routes ----

#[post("/post", data = "<payload>")]
pub async fn post_job(
    payload: Json<PostJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    handlers::post_job_handler(payload, db).await
}

#[get("/search?<params..>")]
pub async fn search(
    params: SearchParams,
    db: &State<Database>,
) -> ApiResult<Json<Vec<JobWithProvider>>> {
    handlers::search_jobs_handler(params, db).await
}

#[post("/apply-job", data = "<payload>")]
pub async fn apply_job(
    payload: Json<ApplyJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<SeekerEnvelope>> {
    handlers::apply_job_handler(payload, db).await
}

// Alias kept for older clients.
#[post("/apply", data = "<payload>")]
pub async fn apply(
    payload: Json<ApplyJobPayload>,
    db: &State<Database>,
) -> ApiResult<Json<SeekerEnvelope>> {
    handlers::apply_job_handler(payload, db).await
}

// Path spelling matches what deployed clients already call.
#[post("/change/availibility/<job_id>")]
pub async fn change_availability(
    job_id: i64,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    handlers::toggle_availability_handler(job_id, db).await
}

#[get("/applicants?<params..>")]
pub async fn applicants(
    params: ApplicantsParams,
    db: &State<Database>,
) -> ApiResult<Json<Vec<ApplicantEntry>>> {
    handlers::applicants_handler(params, db).await
}

#[get("/get/appliedfor?<params..>")]
pub async fn applied_for(
    params: AppliedForParams,
    db: &State<Database>,
) -> ApiResult<Json<JobListResponse>> {
    handlers::applied_for_handler(params, db).await
}

#[get("/trending-skills")]
pub async fn trending_skills(db: &State<Database>) -> ApiResult<Json<JobListResponse>> {
    handlers::trending_skills_handler(db).await
}

// ---- admin routes ----

#[post("/update-job", data = "<payload>")]
pub async fn update_job(
    payload: Json<UpdateJobPayload>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<JobResponse>> {
    handlers::update_job_handler(payload, db).await
}

#[post("/delete", data = "<payload>")]
pub async fn delete_job(
    payload: Json<DeleteJobPayload>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<MessageResponse>> {
    handlers::delete_job_handler(payload, db).await
}

// Alias kept for older clients.
#[post("/delete-job", data = "<payload>")]
pub async fn delete_job_alias(
    payload: Json<DeleteJobPayload>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<MessageResponse>> {
    handlers::delete_job_handler(payload, db).await
}

#[post("/delete-seeker", data = "<payload>")]
pub async fn delete_seeker(
    payload: Json<DeleteSeekerPayload>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<MessageResponse>> {
    handlers::delete_seeker_handler(payload, db).await
}

#[post("/update-seeker", data = "<payload>")]
pub async fn update_seeker(
    payload: Json<UpdateSeekerPayload>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<SeekerEnvelope>> {
    handlers::update_seeker_handler(payload, db).await
}

#[get("/seekers?<params..>")]
pub async fn search_seekers(
    params: SeekersSearchParams,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<Vec<Seeker>>> {
    handlers::search_seekers_handler(params, db).await
}

#[post("/mass-email", data = "<payload>")]
pub async fn mass_email(
    payload: Json<MassEmailPayload>,
    _admin: AdminUser,
    db: &State<Database>,
    channel: &State<Box<dyn OtpChannel>>,
) -> ApiResult<Json<MassEmailResponse>> {
    handlers::mass_email_handler(payload, db, channel).await
}

#[post("/upload-excel", data = "<form>")]
pub async fn upload_excel(
    form: Form<ExcelUploadForm<'_>>,
    _admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<Json<Value>> {
    handlers::upload_excel_handler(form, db).await
}

#[options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[get("/health")]
pub async fn health(db: &State<Database>) -> ApiResult<Json<MessageResponse>> {
    db.health_check()
        .await
        .map_err(crate::error::ApiError::server)?;
    Ok(Json(MessageResponse::ok("ok")))
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<Value> {
    Json(json!({ "success": false, "message": "Invalid request format" }))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<Value> {
    Json(json!({ "success": false, "message": "Resource not found" }))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<Value> {
    Json(json!({ "success": false, "message": "Malformed request body" }))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<Value> {
    Json(json!({ "success": false, "message": "Internal server error" }))
}

// Main server start function
pub async fn start_web_server(
    env_config: EnvironmentConfig,
    secrets: Secrets,
    port: u16,
) -> Result<()> {
    tokio::fs::create_dir_all(&env_config.uploads_path).await?;

    let db = Database::new(&env_config.database_path).await?;
    let channel: Box<dyn OtpChannel> = channel_from_secrets(&secrets);
    let server_config = ServerConfig {
        uploads_dir: env_config.uploads_path.clone(),
    };

    info!("Starting job board API server on port {}", port);
    info!("Database: {}", env_config.database_path.display());
    info!("Uploads: {}", env_config.uploads_path.display());

    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", "0.0.0.0"));

    let _rocket = rocket::custom(figment)
        .attach(Cors)
        .manage(db)
        .manage(secrets)
        .manage(channel)
        .manage(server_config)
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount("/", routes![all_options, health])
        .mount("/auth", routes![request_otp, verify_otp, get_profile])
        .mount(
            "/profile",
            routes![
                get_profile_alias,
                create_seeker,
                update_seeker_profile,
                create_provider,
                update_provider,
            ],
        )
        .mount(
            "/jobs",
            routes![
                post_job,
                search,
                apply_job,
                apply,
                change_availability,
                applicants,
                applied_for,
                trending_skills,
                update_job,
                delete_job,
                delete_job_alias,
                delete_seeker,
                update_seeker,
                search_seekers,
                mass_email,
                upload_excel,
            ],
        )
        .launch()
        .await?;

    Ok(())
}

use std::sync::Arc;
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::auth::{Auth, Role};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::*;
use crate::rate_limit::RateLimiterFacade;
use crate::repo::Repo;
use crate::require_role;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/auth/me").route(web::get().to(auth_me)))
            .service(
                web::resource("/complaints")
                    .route(web::get().to(list_complaints))
                    .route(web::post().to(submit_complaint)),
            )
            .service(
                web::resource("/complaints/{id}/status")
                    .route(web::patch().to(update_complaint_status)),
            )
            .service(web::resource("/admin/stats").route(web::get().to(admin_overview)))
            .service(
                web::resource("/amenities")
                    .route(web::get().to(list_amenities))
                    .route(web::post().to(create_amenity)),
            )
            .service(web::resource("/amenities/{id}").route(web::delete().to(delete_amenity)))
            .service(
                web::resource("/announcements")
                    .route(web::get().to(list_announcements))
                    .route(web::post().to(publish_announcement)),
            )
            .service(web::resource("/announcements/{id}").route(web::delete().to(delete_announcement))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub rate_limiter: Option<RateLimiterFacade>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo, rate_limiter: None }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiterFacade) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

fn bad_request(e: MissingField) -> ApiError {
    ApiError::BadRequest(e.to_string())
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn auth_me(auth: Auth) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(auth.0.user()))
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints",
    responses(
        (status = 200, description = "Admins see every complaint, citizens only their own", body = [Complaint]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_complaints(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let complaints = match auth.0.role {
        Role::Admin => data.repo.list_complaints().await?,
        Role::Citizen => data.repo.list_complaints_for(auth.user_id()).await?,
    };
    Ok(HttpResponse::Ok().json(complaints))
}

#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    request_body = SubmitComplaint,
    responses(
        (status = 201, description = "Complaint recorded as Pending", body = Complaint),
        (status = 400, description = "Issue or location missing", body = ApiErrorBody),
        (status = 429, description = "Too many submissions")
    )
)]
pub async fn submit_complaint(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<SubmitComplaint>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate().map_err(bad_request)?;
    if let Some(rl) = &data.rate_limiter {
        if !rl.allow_complaint(auth.user_id()) {
            return Err(ApiError::TooManyRequests);
        }
    }
    let complaint = data.repo.create_complaint(NewComplaint {
        user_id: auth.0.sub.clone(),
        name: auth.0.name.clone(),
        issue: body.issue,
        location: body.location,
    }).await?;
    tracing::info!(complaint_id = complaint.id, user_id = %complaint.user_id, "complaint submitted");
    Ok(HttpResponse::Created().json(complaint))
}

#[utoipa::path(
    patch,
    path = "/api/v1/complaints/{id}/status",
    request_body = StatusUpdate,
    params(("id" = i64, Path, description = "Complaint id")),
    responses(
        (status = 200, description = "Status set and updated_at refreshed", body = Complaint),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Complaint not found")
    )
)]
pub async fn update_complaint_status(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    let id = path.into_inner();
    let complaint = data.repo
        .update_complaint_status(id, payload.status, Utc::now())
        .await?;
    tracing::info!(complaint_id = id, status = %complaint.status, "complaint status changed");
    Ok(HttpResponse::Ok().json(complaint))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Counts per status plus the newest complaints", body = Overview),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn admin_overview(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    let complaints = data.repo.list_complaints().await?;
    let stats = ComplaintStats::tally(&complaints);
    let recent = complaints.into_iter().take(RECENT_COMPLAINTS).collect();
    Ok(HttpResponse::Ok().json(Overview { stats, recent }))
}

#[utoipa::path(
    get,
    path = "/api/v1/amenities",
    responses((status = 200, description = "List amenities", body = [Amenity]))
)]
pub async fn list_amenities(_auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let amenities = data.repo.list_amenities().await?;
    Ok(HttpResponse::Ok().json(amenities))
}

#[utoipa::path(
    post,
    path = "/api/v1/amenities",
    request_body = NewAmenity,
    responses(
        (status = 201, description = "Amenity created", body = Amenity),
        (status = 400, description = "Name or location missing", body = ApiErrorBody),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_amenity(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewAmenity>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    let new = payload.into_inner();
    new.validate().map_err(bad_request)?;
    let amenity = data.repo.create_amenity(new).await?;
    Ok(HttpResponse::Created().json(amenity))
}

#[utoipa::path(
    delete,
    path = "/api/v1/amenities/{id}",
    params(("id" = i64, Path, description = "Amenity id")),
    responses(
        (status = 204, description = "Amenity deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Amenity not found")
    )
)]
pub async fn delete_amenity(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    data.repo.delete_amenity(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    responses((status = 200, description = "List announcements", body = [Announcement]))
)]
pub async fn list_announcements(_auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let announcements = data.repo.list_announcements().await?;
    Ok(HttpResponse::Ok().json(announcements))
}

#[utoipa::path(
    post,
    path = "/api/v1/announcements",
    request_body = PublishAnnouncement,
    responses(
        (status = 201, description = "Announcement published", body = Announcement),
        (status = 400, description = "Title or content missing", body = ApiErrorBody),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn publish_announcement(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<PublishAnnouncement>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    let body = payload.into_inner();
    body.validate().map_err(bad_request)?;
    let announcement = data.repo.create_announcement(NewAnnouncement {
        title: body.title,
        content: body.content,
        created_by: auth.0.sub.clone(),
    }).await?;
    Ok(HttpResponse::Created().json(announcement))
}

#[utoipa::path(
    delete,
    path = "/api/v1/announcements/{id}",
    params(("id" = i64, Path, description = "Announcement id")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Announcement not found")
    )
)]
pub async fn delete_announcement(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Admin);
    data.repo.delete_announcement(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

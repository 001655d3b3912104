use crate::error::ApiErrorBody;
use crate::models::{
    Amenity, Announcement, Complaint, ComplaintStats, NewAmenity, Overview, PublishAnnouncement,
    Role, StatusUpdate, SubmitComplaint, User,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::auth_me,
        crate::routes::list_complaints,
        crate::routes::submit_complaint,
        crate::routes::update_complaint_status,
        crate::routes::admin_overview,
        crate::routes::list_amenities,
        crate::routes::create_amenity,
        crate::routes::delete_amenity,
        crate::routes::list_announcements,
        crate::routes::publish_announcement,
        crate::routes::delete_announcement,
    ),
    components(schemas(
        User, Role, Complaint, SubmitComplaint, StatusUpdate, ComplaintStats, Overview,
        Amenity, NewAmenity, Announcement, PublishAnnouncement, ApiErrorBody
    )),
    tags(
        (name = "complaints", description = "Citizen issue reports and triage"),
        (name = "amenities", description = "City facilities"),
        (name = "announcements", description = "Public notices"),
    )
)]
pub struct ApiDoc;

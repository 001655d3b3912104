#![cfg(feature = "inmem-store")]

use actix_web::{test, App};
use civic_portal::{
    auth::create_jwt,
    models::{Amenity, Announcement, Complaint, Role, User},
    rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimiterFacade},
    repo::inmem::InMemRepo,
    config, AppState, SecurityHeaders,
};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;

const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

fn setup_env() {
    std::env::set_var("JWT_SECRET", SECRET);
}

fn token(id: &str, name: &str, role: Role) -> String {
    create_jwt(&User { id: id.into(), full_name: name.into(), role }).unwrap()
}
fn admin_token() -> String { token("admin-1", "Ada Admin", Role::Admin) }
fn alice_token() -> String { token("alice", "Alice Citizen", Role::Citizen) }
fn bob_token() -> String { token("bob", "Bob Citizen", Role::Citizen) }

fn bearer(t: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {t}"))
}

fn state() -> AppState {
    AppState::new(Arc::new(InMemRepo::ephemeral()))
}

#[actix_web::test]
#[serial]
async fn citizen_submission_and_admin_triage_flow() {
    setup_env();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;

    // alice submits
    let req = test::TestRequest::post()
        .uri("/api/v1/complaints")
        .insert_header(bearer(&alice_token()))
        .set_json(&json!({"issue": "Pothole on Main St", "location": "Main St & 5th"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Complaint = test::read_body_json(resp).await;
    assert_eq!(created.user_id, "alice");
    assert_eq!(created.name, "Alice Citizen");
    assert_eq!(created.status.as_str(), "Pending");

    // bob submits
    let req = test::TestRequest::post()
        .uri("/api/v1/complaints")
        .insert_header(bearer(&bob_token()))
        .set_json(&json!({"issue": "Streetlight out", "location": "Oak Ave"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // alice only sees her own
    let req = test::TestRequest::get().uri("/api/v1/complaints").insert_header(bearer(&alice_token())).to_request();
    let mine: Vec<Complaint> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine.len(), 1);
    assert!(mine.iter().all(|c| c.user_id == "alice"));

    // admin sees everything, newest first
    let req = test::TestRequest::get().uri("/api/v1/complaints").insert_header(bearer(&admin_token())).to_request();
    let all: Vec<Complaint> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].user_id, "bob");

    // citizens cannot change status
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/complaints/{}/status", created.id))
        .insert_header(bearer(&alice_token()))
        .set_json(&json!({"status": "Resolved"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // admin moves it along
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/complaints/{}/status", created.id))
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"status": "In-Progress"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let updated: Complaint = test::read_body_json(resp).await;
    assert_eq!(updated.status.as_str(), "In-Progress");
    assert!(updated.updated_at >= created.updated_at);

    // unknown label is rejected by the body extractor
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/complaints/{}/status", created.id))
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"status": "Closed"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // missing complaint
    let req = test::TestRequest::patch()
        .uri("/api/v1/complaints/4242/status")
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"status": "Resolved"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    // overview counts
    let req = test::TestRequest::get().uri("/api/v1/admin/stats").insert_header(bearer(&admin_token())).to_request();
    let overview: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(overview["total"], 2);
    assert_eq!(overview["pending"], 1);
    assert_eq!(overview["in_progress"], 1);
    assert_eq!(overview["resolved"], 0);
    assert_eq!(overview["recent"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/v1/admin/stats").insert_header(bearer(&alice_token())).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
#[serial]
async fn blank_fields_are_rejected_without_insert() {
    setup_env();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;

    for body in [json!({"issue": "", "location": "Main St"}), json!({"issue": "Leak", "location": "   "})] {
        let req = test::TestRequest::post()
            .uri("/api/v1/complaints")
            .insert_header(bearer(&alice_token()))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let err: serde_json::Value = test::read_body_json(resp).await;
        assert!(err["error"].as_str().unwrap().ends_with("is required"));
    }

    let req = test::TestRequest::get().uri("/api/v1/complaints").insert_header(bearer(&admin_token())).to_request();
    let all: Vec<Complaint> = test::call_and_read_body_json(&app, req).await;
    assert!(all.is_empty());
}

#[actix_web::test]
#[serial]
async fn amenity_and_announcement_admin_crud() {
    setup_env();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;

    // citizens may not create
    let req = test::TestRequest::post()
        .uri("/api/v1/amenities")
        .insert_header(bearer(&alice_token()))
        .set_json(&json!({"name": "Park", "type": "park", "location": "X"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // labels outside the five categories are rejected
    let req = test::TestRequest::post()
        .uri("/api/v1/amenities")
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"name": "Fountain", "type": "fountain", "location": "Downtown"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let mut ids = Vec::new();
    for (name, kind) in [("Riverside", "park"), ("St. Mary", "hospital"), ("Fountain", "other")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/amenities")
            .insert_header(bearer(&admin_token()))
            .set_json(&json!({"name": name, "type": kind, "location": "Downtown", "description": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let a: Amenity = test::read_body_json(resp).await;
        ids.push(a.id);
    }

    let req = test::TestRequest::get().uri("/api/v1/amenities").insert_header(bearer(&alice_token())).to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed[0]["name"], "Fountain");
    assert_eq!(listed[0]["type"], "other");

    // delete, then citizen view excludes it
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/amenities/{}", ids[0]))
        .insert_header(bearer(&admin_token()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
    let req = test::TestRequest::get().uri("/api/v1/amenities").insert_header(bearer(&alice_token())).to_request();
    let after: Vec<Amenity> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(after.len(), 2);
    assert!(!after.iter().any(|a| a.id == ids[0]));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/amenities/{}", ids[0]))
        .insert_header(bearer(&admin_token()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    // announcement author is stamped from the token
    let req = test::TestRequest::post()
        .uri("/api/v1/announcements")
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"title": "Road works", "content": "Main St closed Monday"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let ann: Announcement = test::read_body_json(resp).await;
    assert_eq!(ann.created_by, "admin-1");

    let req = test::TestRequest::post()
        .uri("/api/v1/announcements")
        .insert_header(bearer(&admin_token()))
        .set_json(&json!({"title": "", "content": "x"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/announcements/{}", ann.id))
        .insert_header(bearer(&alice_token()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/announcements/{}", ann.id))
        .insert_header(bearer(&admin_token()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = test::TestRequest::get().uri("/api/v1/announcements").insert_header(bearer(&bob_token())).to_request();
    let anns: Vec<Announcement> = test::call_and_read_body_json(&app, req).await;
    assert!(anns.is_empty());
}

#[actix_web::test]
#[serial]
async fn auth_me_and_missing_token() {
    setup_env();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/me").insert_header(bearer(&alice_token())).to_request();
    let me: User = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me, User { id: "alice".into(), full_name: "Alice Citizen".into(), role: Role::Citizen });

    let req = test::TestRequest::get().uri("/api/v1/complaints").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/amenities")
        .insert_header(("Authorization", "Bearer garbage"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
#[serial]
async fn submissions_are_rate_limited_per_user() {
    setup_env();
    let limiter = RateLimiterFacade::new(
        InMemoryRateLimiter::new(true),
        RateLimitConfig { complaint_limit: 1, complaint_window: std::time::Duration::from_secs(60) },
    );
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state().with_rate_limiter(limiter)))
            .configure(config)
    ).await;

    let submit = |t: String| test::TestRequest::post()
        .uri("/api/v1/complaints")
        .insert_header(bearer(&t))
        .set_json(&json!({"issue": "Trash", "location": "Park"}))
        .to_request();

    assert_eq!(test::call_service(&app, submit(alice_token())).await.status(), 201);
    assert_eq!(test::call_service(&app, submit(alice_token())).await.status(), 429);
    assert_eq!(test::call_service(&app, submit(bob_token())).await.status(), 201);
}

#[actix_web::test]
#[serial]
async fn security_headers_present() {
    setup_env();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::new(false))
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;
    let req = test::TestRequest::get().uri("/api/v1/amenities").insert_header(bearer(&alice_token())).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert!(headers.get("content-security-policy").is_some());
    assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("strict-transport-security").is_none());

    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::new(true))
            .app_data(actix_web::web::Data::new(state()))
            .configure(config)
    ).await;
    let req = test::TestRequest::get().uri("/api/v1/amenities").insert_header(bearer(&alice_token())).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get("strict-transport-security").is_some());
}

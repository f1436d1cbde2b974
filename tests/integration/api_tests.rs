//! API integration tests
//!
//! These run against a server started with the default dev configuration
//! and the seed data from scripts/seed.sql (lab 1 with five computers,
//! lab 2 with two, student id 2, lecturer id 3, admin id 4 managing
//! lab 1, super admin id 1).

use chrono::{Duration, Utc};
use labreserve_server::models::user::UserClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const JWT_SECRET: &str = "change-me-in-production";

fn make_token(user_id: i32, student: bool, lecturer: bool, admin: bool, super_admin: bool) -> String {
    let now = Utc::now();
    let claims = UserClaims {
        sub: format!("user-{}", user_id),
        user_id,
        is_student: student,
        is_lecturer: lecturer,
        is_admin: admin,
        is_super_admin: super_admin,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    claims.create_token(JWT_SECRET).expect("Failed to sign token")
}

fn student_token() -> String {
    make_token(2, true, false, false, false)
}

fn lecturer_token() -> String {
    make_token(3, false, true, false, false)
}

fn admin_token() -> String {
    make_token(4, false, false, true, false)
}

fn super_admin_token() -> String {
    make_token(1, false, false, true, true)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_missing_token_is_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/labs", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_labs() {
    let client = Client::new();

    let response = client
        .get(format!("{}/labs", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_booking_rejects_inverted_window() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(1);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 1,
            "start_time": start,
            "end_time": start - Duration::hours(1),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "end_before_start");
}

#[tokio::test]
#[ignore]
async fn test_lecturer_cannot_book_computer() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(1);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "computer_id": 1,
            "start_time": start,
            "end_time": start + Duration::hours(1),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_booking_approval_flow() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(2);

    // Student requests a slot
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 2,
            "start_time": start,
            "end_time": start + Duration::hours(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let booking: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(booking["status"], "pending");
    let id = booking["id"].as_i64().expect("No booking id");

    // Admin approves it
    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let approved: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(approved["status"], "approved");
    assert!(approved["approved_at"].is_string());

    // A second approval attempt hits the transition guard
    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_second_overlapping_approval_loses() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(3);

    // Two pending requests for overlapping windows on the same computer
    let mut ids = Vec::new();
    for offset in [0, 30] {
        let response = client
            .post(format!("{}/bookings", BASE_URL))
            .header("Authorization", format!("Bearer {}", student_token()))
            .json(&json!({
                "computer_id": 3,
                "start_time": start + Duration::minutes(offset),
                "end_time": start + Duration::minutes(offset) + Duration::hours(1),
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse response");
        ids.push(body["id"].as_i64().expect("No booking id"));
    }

    // First approval wins
    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, ids[0]))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Second one conflicts with the now-approved slot
    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, ids[1]))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "slot_taken");
}

#[tokio::test]
#[ignore]
async fn test_touching_windows_do_not_conflict() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(4);

    // Back-to-back bookings on the same computer
    let mut ids = Vec::new();
    for offset in [0, 60] {
        let response = client
            .post(format!("{}/bookings", BASE_URL))
            .header("Authorization", format!("Bearer {}", student_token()))
            .json(&json!({
                "computer_id": 4,
                "start_time": start + Duration::minutes(offset),
                "end_time": start + Duration::minutes(offset + 60),
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse response");
        ids.push(body["id"].as_i64().expect("No booking id"));
    }

    // Both approvals succeed: the first ends exactly when the second starts
    for id in ids {
        let response = client
            .post(format!("{}/bookings/{}/approve", BASE_URL, id))
            .header("Authorization", format!("Bearer {}", admin_token()))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }
}

#[tokio::test]
#[ignore]
async fn test_session_blocks_booking_in_same_lab() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(5);

    // Lecturer requests the whole lab
    let response = client
        .post(format!("{}/sessions", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "lab_id": 1,
            "title": "Operating Systems Practical",
            "start_time": start,
            "end_time": start + Duration::hours(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let session: Value = response.json().await.expect("Failed to parse response");
    let session_id = session["id"].as_i64().expect("No session id");

    let response = client
        .post(format!("{}/sessions/{}/approve", BASE_URL, session_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // A booking overlapping the approved session is refused up front
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 5,
            "start_time": start + Duration::minutes(30),
            "end_time": start + Duration::minutes(90),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_recurring_conflict_reports_dates() {
    let client = Client::new();
    let anchor = (Utc::now() + Duration::days(14)).date_naive();

    // Approved weekly template
    let response = client
        .post(format!("{}/recurring-sessions", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "lab_id": 1,
            "title": "Databases Lab",
            "start_date": anchor,
            "end_date": anchor + Duration::days(21),
            "start_time": "14:00:00",
            "end_time": "16:00:00",
            "cadence": "weekly",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let template: Value = response.json().await.expect("Failed to parse response");
    let template_id = template["id"].as_i64().expect("No template id");

    let response = client
        .post(format!("{}/recurring-sessions/{}/approve", BASE_URL, template_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // A daily template over the same range collides on the weekly dates
    // and nothing of it is materialized
    let response = client
        .post(format!("{}/recurring-sessions", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "lab_id": 1,
            "title": "Networks Lab",
            "start_date": anchor,
            "end_date": anchor + Duration::days(21),
            "start_time": "15:00:00",
            "end_time": "17:00:00",
            "cadence": "daily",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "recurrence_conflict");
    let dates = body["conflict_dates"].as_array().expect("No conflict dates");
    assert_eq!(dates.len(), 4);
}

#[tokio::test]
#[ignore]
async fn test_small_lab_approval_blocked_by_booking() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(6);

    // Approved booking in the two-computer lab
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 6,
            "start_time": start,
            "end_time": start + Duration::hours(1),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().expect("No booking id");

    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // A session over the same window can be requested but not approved:
    // the lab is too small to displace the booking
    let response = client
        .post(format!("{}/sessions", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "lab_id": 2,
            "title": "GPU Computing Practical",
            "start_time": start,
            "end_time": start + Duration::hours(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let session: Value = response.json().await.expect("Failed to parse response");
    let session_id = session["id"].as_i64().expect("No session id");

    let response = client
        .post(format!("{}/sessions/{}/approve", BASE_URL, session_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_attendance_check_in_follows_status() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(7);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 7,
            "start_time": start,
            "end_time": start + Duration::hours(1),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().expect("No booking id");

    let response = client
        .post(format!("{}/bookings/{}/approve", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Marking absent leaves no check-in time
    let response = client
        .post(format!("{}/bookings/{}/attendance", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .json(&json!({ "status": "absent" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let record: Value = response.json().await.expect("Failed to parse response");
    assert!(record["check_in_time"].is_null());

    // Re-marking present stamps it
    let response = client
        .post(format!("{}/bookings/{}/attendance", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .json(&json!({ "status": "present" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let record: Value = response.json().await.expect("Failed to parse response");
    assert!(record["check_in_time"].is_string());

    // Re-marking absent afterwards keeps the original check-in
    let response = client
        .post(format!("{}/bookings/{}/attendance", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", super_admin_token()))
        .json(&json!({ "status": "absent" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let record: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(record["status"], "absent");
    assert!(record["check_in_time"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_recurring_cancel_notifies_attendees() {
    let client = Client::new();
    let anchor = (Utc::now() + Duration::days(40)).date_naive();

    let response = client
        .post(format!("{}/recurring-sessions", BASE_URL))
        .header("Authorization", format!("Bearer {}", lecturer_token()))
        .json(&json!({
            "lab_id": 1,
            "title": "Compilers Lab",
            "start_date": anchor,
            "end_date": anchor + Duration::days(21),
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "cadence": "weekly",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let template: Value = response.json().await.expect("Failed to parse response");
    let template_id = template["id"].as_i64().expect("No template id");

    let response = client
        .post(format!("{}/recurring-sessions/{}/approve", BASE_URL, template_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Student joins one of the materialized occurrences
    let response = client
        .get(format!("{}/sessions/upcoming", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let sessions: Value = response.json().await.expect("Failed to parse response");
    let occurrence_id = sessions
        .as_array()
        .expect("Not an array")
        .iter()
        .find(|s| s["title"] == "Compilers Lab")
        .and_then(|s| s["id"].as_i64())
        .expect("No materialized occurrence");

    let response = client
        .post(format!("{}/sessions/{}/join", BASE_URL, occurrence_id))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Cancelling the template removes the occurrences and tells the
    // registered student about it
    let response = client
        .post(format!("{}/recurring-sessions/{}/cancel", BASE_URL, template_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/notifications", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let notifications: Value = response.json().await.expect("Failed to parse response");
    assert!(notifications
        .as_array()
        .expect("Not an array")
        .iter()
        .any(|n| {
            n["kind"] == "session_cancelled"
                && n["message"].as_str().is_some_and(|m| m.contains("Compilers Lab"))
        }));
}

#[tokio::test]
#[ignore]
async fn test_rating_flow() {
    let client = Client::new();
    let start = Utc::now() + Duration::days(8);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "computer_id": 1,
            "start_time": start,
            "end_time": start + Duration::hours(1),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let booking_id = booking["id"].as_i64().expect("No booking id");

    // Scores off the scale are refused
    let response = client
        .post(format!("{}/bookings/{}/rating", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .json(&json!({ "score": 9 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "score_out_of_range");

    // First rating, then a revision by the same admin
    let response = client
        .post(format!("{}/bookings/{}/rating", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .json(&json!({ "score": 4, "comment": "solid work" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let first: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(first["score"], 4);

    let response = client
        .post(format!("{}/bookings/{}/rating", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .json(&json!({ "score": 5 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let revised: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(revised["score"], 5);
    assert_eq!(revised["id"], first["id"]);

    let response = client
        .get(format!("{}/students/2/rating-summary", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let summary: Value = response.json().await.expect("Failed to parse response");
    assert!(summary["rating_count"].as_i64().expect("No count") >= 1);
    assert!(summary["average_score"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_free_timeslots_grid() {
    let client = Client::new();

    // Seven days of hourly slots between 08:00 and 20:00
    let response = client
        .get(format!("{}/labs/1/timeslots", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let slots: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(slots.as_array().expect("Not an array").len(), 7 * 12);

    let response = client
        .get(format!("{}/labs/1/timeslots?computer_id=1", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // A computer from another lab is not part of this grid
    let response = client
        .get(format!("{}/labs/1/timeslots?computer_id=6", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_notifications_flow() {
    let client = Client::new();

    let response = client
        .get(format!("{}/notifications", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/notifications/mark-read", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/notifications/unread", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["unread"], 0);
}

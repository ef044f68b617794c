mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use guestlist_backend::models::user::UserRole;
use guestlist_backend::routes::api_router;

use support::{hashed, TestBackend};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

const BOUNDARY: &str = "guestlist-test-boundary";

fn multipart_csv_request(uri: &str, token: &str, csv: &str, content_type: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"import\"; filename=\"roster.csv\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::from(body))
        .unwrap()
}

struct Fixture {
    backend: TestBackend,
    app: axum::Router,
    token: String,
    event_id: i32,
}

fn fixture() -> Fixture {
    let backend = TestBackend::new();
    let owner = backend
        .users
        .add_user("owner@example.com", &hashed("pass123"), UserRole::NormalUser, true);
    let event = backend.events.add_event("Launch Party", owner.id);
    let state = backend.state(true);
    let token = state.tokens.issue_session(owner.id).unwrap();
    let app = api_router(state);
    Fixture {
        backend,
        app,
        token,
        event_id: event.id,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clean_csv_import_returns_201_and_persists_every_row() {
    let f = fixture();
    let csv = "\
first_name,last_name,email,company_name,title,table_no,role
Ada,Lovelace,ada@example.com,Analytical,Engineer,4,guest
Alan,Turing,alan@example.com,Bletchley,Cryptanalyst,,speaker
";

    let response = f
        .app
        .oneshot(multipart_csv_request(
            &format!("/api/v1/event/{}/attendees/import", f.event_id),
            &f.token,
            csv,
            "text/csv",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Attendees imported successfully");
    assert_eq!(body["created"], 2);
    assert_eq!(f.backend.attendees.count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_row_downgrades_import_to_206_with_itemized_problems() {
    let f = fixture();
    f.backend.attendees.add_attendee("dup@example.com", f.event_id);

    let csv = "\
first_name,last_name,email,company_name,title,table_no,role
Ada,Lovelace,ada@example.com,,,,
Dup,Guest,dup@example.com,,,,
";

    let response = f
        .app
        .oneshot(multipart_csv_request(
            &format!("/api/v1/event/{}/attendees/import", f.event_id),
            &f.token,
            csv,
            "text/csv",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let body = body_json(response).await;
    assert_eq!(body["created"], 1);
    let problems = body["problems"].as_array().expect("problems list");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0]["email"], "dup@example.com");
}

#[tokio::test]
async fn non_csv_upload_is_rejected_wholesale() {
    let f = fixture();

    let response = f
        .app
        .oneshot(multipart_csv_request(
            &format!("/api/v1/event/{}/attendees/import", f.event_id),
            &f.token,
            "not,a,roster",
            "application/pdf",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid file type");
    assert_eq!(f.backend.attendees.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invitation_dispatch_reports_success_and_itemizes_failures() {
    let f = fixture();
    f.backend.templates.add_template(f.event_id);
    f.backend.attendees.add_attendee("a@example.com", f.event_id);
    f.backend.attendees.add_attendee("b@example.com", f.event_id);

    let uri = format!("/api/v1/event/{}/attendees/send_invitation", f.event_id);
    let request = |token: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header(header::COOKIE, format!("token={token}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = f.app.clone().oneshot(request(&f.token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invitation emails sent successfully");
    assert_eq!(body["sent"], 2);
    assert_eq!(f.backend.mailer.invitation_count(), 2);

    // A bouncing recipient downgrades the next run to a 206 with the
    // failed address itemized.
    f.backend.attendees.add_attendee("bounce@example.com", f.event_id);
    f.backend.mailer.fail_for("bounce@example.com");

    let response = f.app.oneshot(request(&f.token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let body = body_json(response).await;
    assert_eq!(body["sent"], 2);
    assert_eq!(body["failed"][0]["email"], "bounce@example.com");
}

#[tokio::test]
async fn dispatch_without_template_is_404_and_sends_nothing() {
    let f = fixture();
    f.backend.attendees.add_attendee("a@example.com", f.event_id);

    let response = f
        .app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!(
                    "/api/v1/event/{}/attendees/send_invitation",
                    f.event_id
                ))
                .header(header::COOKIE, format!("token={}", f.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(f.backend.mailer.invitation_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn roster_teardown_deletes_images_then_rows() {
    let f = fixture();
    let kept = f.backend.attendees.add_attendee("keep@example.com", f.event_id);
    f.backend.attendees.add_attendee("other@example.com", f.event_id);
    f.backend.images.fail_delete_for(&kept.qr_code);

    let response = f
        .app
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/v1/event/{}/attendees", f.event_id))
                .header(header::COOKIE, format!("token={}", f.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // One image failed to delete; the rows are gone regardless.
    assert_eq!(body["failed_image_deletions"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["failed_image_deletions"][0]["email"],
        "keep@example.com"
    );
    assert_eq!(f.backend.attendees.count(), 0);
    assert_eq!(f.backend.images.deleted.lock().unwrap().len(), 1);
}

/// End-to-end tests for the Rollcall API
///
/// Each test drives the full router (auth middleware included) against a real
/// database and skips itself when `DATABASE_URL` is not set. Every test uses
/// unique emails, roll numbers, and codes so they can share one database.
mod common;

use axum::http::StatusCode;
use common::{body_json, create_student_row, create_subject_row, create_user, TestContext};
use rollcall_shared::models::user::UserRole;
use serde_json::json;

macro_rules! ctx_or_skip {
    () => {
        match TestContext::new().await.unwrap() {
            Some(ctx) => ctx,
            None => return,
        }
    };
}

#[tokio::test]
async fn test_health_reports_connected_database() {
    let ctx = ctx_or_skip!();

    let response = ctx.request("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let ctx = ctx_or_skip!();
    let email = format!("flow-{}@example.edu", common::unique());

    // Open registration defaults to the student role
    let response = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Flow Tester",
                "email": email,
                "password": common::TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"]["password_hash"].is_null());
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    // Login with the same credentials
    let response = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": common::TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    // Wrong password gets the same non-committal 401
    let response = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrongpass99" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");

    // The access token works against /me
    let response = ctx
        .request("GET", "/api/auth/me", Some(&access_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], email);

    // The refresh token yields a fresh access token
    let response = ctx
        .request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["access_token"].is_string());

    // A refresh token is not accepted as a bearer token
    let response = ctx
        .request("GET", "/api/auth/me", Some(&refresh_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = ctx_or_skip!();
    let email = format!("dup-{}@example.edu", common::unique());
    let payload = json!({
        "name": "First",
        "email": email,
        "password": common::TEST_PASSWORD,
    });

    let response = ctx
        .request("POST", "/api/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .request("POST", "/api/auth/register", None, Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Email already exists");
}

#[tokio::test]
async fn test_privileged_registration_requires_admin() {
    let ctx = ctx_or_skip!();
    let payload = json!({
        "name": "Would-be Teacher",
        "email": format!("t-{}@example.edu", common::unique()),
        "password": common::TEST_PASSWORD,
        "role": "teacher",
    });

    // Anonymous caller cannot create a teacher account
    let response = ctx
        .request("POST", "/api/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin can
    let response = ctx
        .request(
            "POST",
            "/api/auth/register",
            Some(&ctx.admin_token),
            Some(json!({
                "name": "Real Teacher",
                "email": format!("t-{}@example.edu", common::unique()),
                "password": common::TEST_PASSWORD,
                "role": "teacher",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user"]["role"], "teacher");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = ctx_or_skip!();

    let response = ctx.request("GET", "/api/students", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .request("GET", "/api/students", Some("not-a-real-token"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_student_crud_with_uniqueness() {
    let ctx = ctx_or_skip!();
    let suffix = common::unique();
    let payload = json!({
        "name": "Rohan Iyer",
        "email": format!("rohan-{}@example.edu", suffix),
        "roll_number": format!("CS-{}", suffix),
        "department": "Computer Science",
        "year": 2,
        "section": "B",
    });

    // Create
    let response = ctx
        .request("POST", "/api/students", Some(&ctx.admin_token), Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Duplicate roll number conflicts
    let mut dup = payload.clone();
    dup["email"] = json!(format!("other-{}@example.edu", suffix));
    let response = ctx
        .request("POST", "/api/students", Some(&ctx.admin_token), Some(dup))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Roll number already exists");

    // Update
    let response = ctx
        .request(
            "PUT",
            &format!("/api/students/{}", id),
            Some(&ctx.admin_token),
            Some(json!({ "year": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["year"], 3);

    // Soft delete, then the row is still fetchable but inactive
    let response = ctx
        .request("DELETE", &format!("/api/students/{}", id), Some(&ctx.admin_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .request("GET", &format!("/api/students/{}", id), Some(&ctx.admin_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_active"], false);

    // Unknown id is a 404
    let response = ctx
        .request(
            "GET",
            "/api/students/00000000-0000-0000-0000-000000000000",
            Some(&ctx.admin_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_student_writes_are_role_gated() {
    let ctx = ctx_or_skip!();
    let student_user = create_user(&ctx.db, UserRole::Student).await.unwrap();
    let student_token = ctx.token_for(&student_user);

    let response = ctx
        .request(
            "POST",
            "/api/students",
            Some(&student_token),
            Some(json!({
                "name": "Nope",
                "email": format!("nope-{}@example.edu", common::unique()),
                "roll_number": format!("N-{}", common::unique()),
                "department": "Art",
                "year": 1,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_validation_maps_to_400() {
    let ctx = ctx_or_skip!();

    let response = ctx
        .request(
            "POST",
            "/api/students",
            Some(&ctx.admin_token),
            Some(json!({
                "name": "",
                "email": "not-an-email",
                "roll_number": format!("V-{}", common::unique()),
                "department": "Physics",
                "year": 99,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("year"));
}

#[tokio::test]
async fn test_student_list_pagination() {
    let ctx = ctx_or_skip!();
    // A department unique to this test isolates the filter
    let department = format!("PaginationDept-{}", common::unique());
    for _ in 0..3 {
        create_student_row(&ctx.db, &department).await.unwrap();
    }

    let uri = format!("/api/students?department={}&per_page=2", department);
    let response = ctx.request("GET", &uri, Some(&ctx.admin_token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);

    let uri = format!("/api/students?department={}&per_page=2&page=2", department);
    let response = ctx.request("GET", &uri, Some(&ctx.admin_token), None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_subject_teacher_assignment_is_checked() {
    let ctx = ctx_or_skip!();
    let student_user = create_user(&ctx.db, UserRole::Student).await.unwrap();

    // A student account cannot own a subject
    let response = ctx
        .request(
            "POST",
            "/api/subjects",
            Some(&ctx.admin_token),
            Some(json!({
                "name": "Linear Algebra",
                "code": format!("MA-{}", common::unique()),
                "department": "Mathematics",
                "teacher_id": student_user.id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A teacher account can
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let response = ctx
        .request(
            "POST",
            "/api/subjects",
            Some(&ctx.admin_token),
            Some(json!({
                "name": "Linear Algebra",
                "code": format!("MA-{}", common::unique()),
                "department": "Mathematics",
                "teacher_id": teacher.id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["teacher_id"], json!(teacher.id));
    assert_eq!(body["credits"], 3);
}

#[tokio::test]
async fn test_attendance_remark_upserts_in_place() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let teacher_token = ctx.token_for(&teacher);
    let student = create_student_row(&ctx.db, "Upsert").await.unwrap();
    let subject = create_subject_row(&ctx.db, Some(teacher.id)).await.unwrap();

    let mark = |status: &str| {
        json!({
            "student_id": student.id,
            "subject_id": subject.id,
            "date": "2026-03-02",
            "status": status,
        })
    };

    let response = ctx
        .request("POST", "/api/attendance", Some(&teacher_token), Some(mark("present")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;

    // Re-marking the same (student, subject, date) replaces, not duplicates
    let response = ctx
        .request("POST", "/api/attendance", Some(&teacher_token), Some(mark("absent")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = body_json(response).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["status"], "absent");

    let uri = format!(
        "/api/attendance?student_id={}&subject_id={}",
        student.id, subject.id
    );
    let response = ctx.request("GET", &uri, Some(&teacher_token), None).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["status"], "absent");
}

#[tokio::test]
async fn test_attendance_rejects_unknown_student() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let subject = create_subject_row(&ctx.db, Some(teacher.id)).await.unwrap();

    let response = ctx
        .request(
            "POST",
            "/api/attendance",
            Some(&ctx.token_for(&teacher)),
            Some(json!({
                "student_id": "00000000-0000-0000-0000-000000000000",
                "subject_id": subject.id,
                "date": "2026-03-02",
                "status": "present",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_mark_and_subject_report() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let teacher_token = ctx.token_for(&teacher);
    let a = create_student_row(&ctx.db, "Bulk").await.unwrap();
    let b = create_student_row(&ctx.db, "Bulk").await.unwrap();
    let subject = create_subject_row(&ctx.db, Some(teacher.id)).await.unwrap();

    // Two class days for both students
    for (date, a_status, b_status) in [
        ("2026-03-02", "present", "absent"),
        ("2026-03-03", "late", "absent"),
    ] {
        let response = ctx
            .request(
                "POST",
                "/api/attendance/bulk",
                Some(&teacher_token),
                Some(json!({
                    "subject_id": subject.id,
                    "date": date,
                    "entries": [
                        { "student_id": a.id, "status": a_status },
                        { "student_id": b.id, "status": b_status },
                    ],
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["marked"], 2);
    }

    let uri = format!("/api/attendance/report/subject/{}", subject.id);
    let response = ctx.request("GET", &uri, Some(&teacher_token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let students = body["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);

    let row_a = students
        .iter()
        .find(|r| r["student_id"] == json!(a.id))
        .unwrap();
    // present + late out of two days
    assert_eq!(row_a["total"], 2);
    assert_eq!(row_a["percentage"], 100.0);

    let row_b = students
        .iter()
        .find(|r| r["student_id"] == json!(b.id))
        .unwrap();
    assert_eq!(row_b["percentage"], 0.0);
}

#[tokio::test]
async fn test_student_report_percentage_arithmetic() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let teacher_token = ctx.token_for(&teacher);
    let student = create_student_row(&ctx.db, "Report").await.unwrap();
    let subject = create_subject_row(&ctx.db, Some(teacher.id)).await.unwrap();

    // 2 present, 1 absent, 1 late -> 3/4 attended = 75%
    for (date, status) in [
        ("2026-03-02", "present"),
        ("2026-03-03", "absent"),
        ("2026-03-04", "late"),
        ("2026-03-05", "present"),
    ] {
        let response = ctx
            .request(
                "POST",
                "/api/attendance",
                Some(&teacher_token),
                Some(json!({
                    "student_id": student.id,
                    "subject_id": subject.id,
                    "date": date,
                    "status": status,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let uri = format!("/api/attendance/report/student/{}", student.id);
    let response = ctx.request("GET", &uri, Some(&teacher_token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let row = body["subjects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["subject_id"] == json!(subject.id))
        .unwrap();
    assert_eq!(row["total"], 4);
    assert_eq!(row["present"], 2);
    assert_eq!(row["absent"], 1);
    assert_eq!(row["late"], 1);
    assert_eq!(row["percentage"], 75.0);

    // Restricting the range to the absent day drops the percentage to zero
    let uri = format!(
        "/api/attendance/report/student/{}?from=2026-03-03&to=2026-03-03",
        student.id
    );
    let response = ctx.request("GET", &uri, Some(&teacher_token), None).await;
    let body = body_json(response).await;
    let row = &body["subjects"].as_array().unwrap()[0];
    assert_eq!(row["total"], 1);
    assert_eq!(row["percentage"], 0.0);
}

#[tokio::test]
async fn test_student_sees_only_own_records() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let teacher_token = ctx.token_for(&teacher);

    // Roster row and a login sharing the same email
    let student_row = create_student_row(&ctx.db, "SelfScope").await.unwrap();
    let login = rollcall_shared::models::user::User::create(
        &ctx.db,
        rollcall_shared::models::user::CreateUser {
            name: student_row.name.clone(),
            email: student_row.email.clone(),
            password_hash: rollcall_shared::auth::password::hash_password(common::TEST_PASSWORD)
                .unwrap(),
            role: UserRole::Student,
            department: None,
        },
    )
    .await
    .unwrap();
    let student_token = ctx.token_for(&login);

    let other_row = create_student_row(&ctx.db, "SelfScope").await.unwrap();
    let subject = create_subject_row(&ctx.db, Some(teacher.id)).await.unwrap();

    for row in [&student_row, &other_row] {
        ctx.request(
            "POST",
            "/api/attendance",
            Some(&teacher_token),
            Some(json!({
                "student_id": row.id,
                "subject_id": subject.id,
                "date": "2026-03-02",
                "status": "present",
            })),
        )
        .await;
    }

    // The student's list is scoped to their own roster row
    let response = ctx
        .request("GET", "/api/attendance", Some(&student_token), None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["student_id"], json!(student_row.id));

    // Own report is allowed, someone else's is not
    let uri = format!("/api/attendance/report/student/{}", student_row.id);
    let response = ctx.request("GET", &uri, Some(&student_token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/api/attendance/report/student/{}", other_row.id);
    let response = ctx.request("GET", &uri, Some(&student_token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Students cannot mark attendance
    let response = ctx
        .request(
            "POST",
            "/api/attendance",
            Some(&student_token),
            Some(json!({
                "student_id": student_row.id,
                "subject_id": subject.id,
                "date": "2026-03-09",
                "status": "present",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_summary_shape_and_gating() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();

    let response = ctx
        .request(
            "GET",
            "/api/dashboard/summary?threshold=80",
            Some(&ctx.token_for(&teacher)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["total_students"].is_i64());
    assert!(body["total_subjects"].is_i64());
    assert!(body["total_teachers"].as_i64().unwrap() >= 1);
    assert_eq!(body["threshold"], 80.0);
    assert!(body["today"]["present"].is_i64());
    assert!(body["low_attendance"].is_array());

    // Students do not get the dashboard
    let student_user = create_user(&ctx.db, UserRole::Student).await.unwrap();
    let response = ctx
        .request(
            "GET",
            "/api/dashboard/summary",
            Some(&ctx.token_for(&student_user)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let ctx = ctx_or_skip!();
    let teacher = create_user(&ctx.db, UserRole::Teacher).await.unwrap();

    let response = ctx
        .request("GET", "/api/users", Some(&ctx.token_for(&teacher)), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .request("GET", "/api/users?role=teacher", Some(&ctx.admin_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["total"].as_i64().unwrap() >= 1);

    // Deactivated accounts cannot log in afterwards
    let victim = create_user(&ctx.db, UserRole::Teacher).await.unwrap();
    let response = ctx
        .request(
            "DELETE",
            &format!("/api/users/{}", victim.id),
            Some(&ctx.admin_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": victim.email, "password": common::TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

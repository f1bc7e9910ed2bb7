mod helpers;

use axum::http::StatusCode;
use db::models::{lesson, module, subject, user};
use helpers::{TestApp, make_test_app};
use serde_json::{Value, json};

async fn module_fixture(app: &TestApp) -> module::Model {
    let maths = subject::Model::create(&app.db, "Mathematics").await.unwrap();
    module::Model::create(&app.db, maths.id, "Fractions", None, 1).await.unwrap()
}

fn question(text: &str) -> Value {
    json!({ "text": text, "options": ["1", "2", "3", "4"], "correct_option": 0 })
}

#[tokio::test]
async fn create_module_echoes_the_local_id() {
    let app = make_test_app().await;
    let maths = subject::Model::create(&app.db, "Mathematics").await.unwrap();
    let local_id = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

    let (status, json) = app
        .send(
            "POST",
            "/api/modules",
            Some(json!({ "local_id": local_id, "subject_id": maths.id, "name": "Decimals" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["state"], "synced");
    assert_eq!(json["data"]["item"]["name"], "Decimals");
}

#[tokio::test]
async fn failed_write_returns_the_draft() {
    let app = make_test_app().await;

    let (status, json) = app
        .send("POST", "/api/modules", Some(json!({ "subject_id": 999, "name": "Orphan" })))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["state"], "write_failed");
    assert_eq!(json["data"]["draft"]["input"]["name"], "Orphan");
    assert!(json["data"]["draft"]["local_id"].is_string());
}

#[tokio::test]
async fn quiz_validation_errors_are_bad_requests() {
    let app = make_test_app().await;
    let module = module_fixture(&app).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/quizzes",
            Some(json!({
                "module_id": module.id,
                "title": "Check",
                "passing_score": 120,
                "questions": [question("Q1")]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Passing score must be between 0 and 100");
}

#[tokio::test]
async fn attempts_are_capped() {
    let app = make_test_app().await;
    let module = module_fixture(&app).await;
    let student = user::Model::create(&app.db, "Ada", "ada@example.com", user::Role::Student, None)
        .await
        .unwrap();

    let (status, json) = app
        .send(
            "POST",
            "/api/quizzes",
            Some(json!({
                "module_id": module.id,
                "title": "Check",
                "passing_score": 70,
                "questions": [question("Q1"), question("Q2")]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let quiz_id = json["data"]["item"]["id"].as_i64().unwrap();

    let uri = format!("/api/quizzes/{quiz_id}/attempts");
    let body = json!({ "student_id": student.id, "correct_answers": 1, "total_questions": 2 });
    for n in 1..=3 {
        let (status, json) = app.send("POST", &uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["attempt_number"], n);
        assert_eq!(json["data"]["score"], 50);
    }

    let (status, _) = app.send("POST", &uri, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_a_quiz_unbinds_its_lesson() {
    let app = make_test_app().await;
    let module = module_fixture(&app).await;
    let halves = lesson::Model::create(&app.db, module.id, "Halves", "", 1, None).await.unwrap();

    let (_, json) = app
        .send(
            "POST",
            "/api/quizzes",
            Some(json!({
                "module_id": module.id,
                "title": "Halves check",
                "passing_score": 50,
                "lesson_id": halves.id,
                "questions": [question("Half of 4?")]
            })),
        )
        .await;
    let quiz_id = json["data"]["item"]["id"].as_i64().unwrap();

    let (status, json) = app.send("DELETE", &format!("/api/quizzes/{quiz_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["steps"][0]["step"], "clear_lesson_quiz_refs");
    assert_eq!(json["data"]["steps"][0]["rows_affected"], 1);

    let (status, _) = app.send("DELETE", &format!("/api/quizzes/{quiz_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_completion_and_module_delete() {
    let app = make_test_app().await;
    let module = module_fixture(&app).await;
    let student = user::Model::create(&app.db, "Ada", "ada@example.com", user::Role::Student, None)
        .await
        .unwrap();

    let (status, json) = app
        .send(
            "POST",
            "/api/lessons",
            Some(json!({ "module_id": module.id, "title": "Halves", "sort_order": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let lesson_id = json["data"]["item"]["id"].as_i64().unwrap();

    let uri = format!("/api/lessons/{lesson_id}/complete");
    let (status, _) = app.send("POST", &uri, Some(json!({ "student_id": student.id }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = app.send("DELETE", &format!("/api/modules/{}", module.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let steps = json["data"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 6);
    assert_eq!(steps[5]["step"], "delete_module");
}

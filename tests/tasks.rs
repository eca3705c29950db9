mod common;

use std::net::TcpListener;

use actix_web::{http::StatusCode, rt, test, App, HttpServer};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use taskboard::models::{Task, TaskPriority, TaskStatus};
use taskboard::services::Page;

use common::{bearer, call_status, register, test_state};

fn task_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Initial description",
        "priority": TaskPriority::Medium,
        "due_date": Utc::now() + Duration::days(3)
    })
}

#[actix_rt::test]
async fn test_create_task_unauthorized() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let state = test_state(vec![]);
    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new().configure(move |cfg| state.configure(cfg))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/api/tasks", port))
        .json(&task_payload("Unauthorized Task"))
        .send()
        .await
        .expect("Failed to send request");

    let status = resp.status();
    let body: Value = resp.json().await.expect("error body is JSON");
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    handle.stop(false).await;
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let state = test_state(vec![]);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let user = register(&app, "crud@example.com", "password123").await;

    // Create
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&user.access_token))
        .set_json(task_payload("CRUD Task Original"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Task = test::read_body_json(resp).await;
    assert_eq!(created.title, "CRUD Task Original");
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.priority, TaskPriority::Medium);
    assert_eq!(created.user_id, user.user.id);

    // Read
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(bearer(&user.access_token))
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    // Partial update leaves other fields alone
    let req = test::TestRequest::patch()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(bearer(&user.access_token))
        .set_json(json!({ "status": "in_progress" }))
        .to_request();
    let updated: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);

    // Delete, then it is gone
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(bearer(&user.access_token))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(bearer(&user.access_token))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_tasks_are_private_to_their_owner() {
    let state = test_state(vec![]);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let owner = register(&app, "owner@example.com", "password123").await;
    let intruder = register(&app, "intruder@example.com", "password123").await;

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&owner.access_token))
        .set_json(task_payload("Private"))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;

    let uri = format!("/api/tasks/{}", task.id);
    let attempts = [
        test::TestRequest::get().uri(&uri),
        test::TestRequest::patch().uri(&uri).set_json(json!({ "title": "Mine now" })),
        test::TestRequest::delete().uri(&uri),
    ];
    for attempt in attempts {
        let req = attempt.insert_header(bearer(&intruder.access_token)).to_request();
        assert_eq!(call_status(&app, req).await, StatusCode::NOT_FOUND);
    }

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&intruder.access_token))
        .to_request();
    let page: Page<Task> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.total_count, 0);
    assert!(page.items.is_empty());
}

#[actix_rt::test]
async fn test_list_pagination_and_filters() {
    let state = test_state(vec![]);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let user = register(&app, "lister@example.com", "password123").await;

    for i in 1..=12 {
        let mut payload = task_payload(&format!("Task {:02}", i));
        if i % 4 == 0 {
            payload["priority"] = json!("high");
        }
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(&user.access_token))
            .set_json(payload)
            .to_request();
        assert_eq!(call_status(&app, req).await, StatusCode::CREATED);
    }

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/tasks?{}", query))
            .insert_header(bearer(&user.access_token))
            .to_request()
    };

    let page: Page<Task> =
        test::call_and_read_body_json(&app, list("page=2&limit=5&sortKey=title&sortAsc=true")).await;
    assert_eq!(page.total_count, 12);
    assert_eq!(page.pages, 3);
    let titles: Vec<&str> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Task 06", "Task 07", "Task 08", "Task 09", "Task 10"]);

    // Out-of-window values fall back to defaults instead of failing.
    let page: Page<Task> = test::call_and_read_body_json(&app, list("page=abc&limit=500")).await;
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.pages, 2);

    let page: Page<Task> = test::call_and_read_body_json(&app, list("priority=high")).await;
    assert_eq!(page.total_count, 3);
    assert!(page.items.iter().all(|t| t.priority == TaskPriority::High));

    let page: Page<Task> = test::call_and_read_body_json(&app, list("title=task%2011")).await;
    assert_eq!(page.total_count, 1);

    let page: Page<Task> = test::call_and_read_body_json(&app, list("title=nothing")).await;
    assert_eq!((page.total_count, page.pages, page.items.len()), (0, 0, 0));

    assert_eq!(
        call_status(&app, list("status=someday")).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        call_status(&app, list("created_at_start=yesterday")).await,
        StatusCode::BAD_REQUEST
    );
}

#[actix_rt::test]
async fn test_invalid_task_inputs() {
    let state = test_state(vec![]);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let user = register(&app, "invalid@example.com", "password123").await;

    let long_description = "d".repeat(1001);
    let cases = [
        task_payload(""),
        task_payload(&"t".repeat(201)),
        json!({
            "title": "Too wordy",
            "description": long_description,
            "due_date": Utc::now()
        }),
    ];
    for payload in cases {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(&user.access_token))
            .set_json(&payload)
            .to_request();
        assert_eq!(call_status(&app, req).await, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

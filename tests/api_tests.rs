use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use std::sync::Arc;
use task_manager_api::application::auth_service::AuthService;
use task_manager_api::application::task_service::TaskService;
use task_manager_api::data::task_repository::InMemoryTaskRepository;
use task_manager_api::data::user_repository::InMemoryUserRepository;
use task_manager_api::presentation::handlers::AppState;
use task_manager_api::presentation::middleware::RequestLogMiddleware;
use task_manager_api::presentation::routes::{api_scope, cors};

// Same stack as the binary
macro_rules! setup_test {
    () => {{
        let auth_service = Arc::new(
            AuthService::new(
                Arc::new(InMemoryUserRepository::new()),
                "test-secret-key-for-testing-only".to_string(),
            )
            .with_token_ttl(3600),
        );
        let state = web::Data::new(AppState {
            auth_service: auth_service.clone(),
            task_service: TaskService::new(Arc::new(InMemoryTaskRepository::new())),
        });

        test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(cors(None))
                .wrap(RequestLogMiddleware)
                .service(api_scope(auth_service)),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_health_check() {
    let app = setup_test!();

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert!(resp.headers().contains_key("x-response-time"));

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_rejected_requests_still_get_request_id() {
    let app = setup_test!();

    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[actix_web::test]
async fn test_caller_request_id_is_echoed() {
    let app = setup_test!();

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("x-request-id", "trace-42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "trace-42");
}

#[actix_web::test]
async fn test_end_to_end_example() {
    let app = setup_test!();

    // Alice registers
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "name": "Alice",
            "email": "a@x.com",
            "password": "pw123456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let alice_token = body["token"].as_str().unwrap().to_string();

    // Alice creates a task
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", alice_token)))
        .set_json(serde_json::json!({ "title": "Buy milk" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["task"]["status"], "todo");
    assert_eq!(body["task"]["priority"], "medium");
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    // Search finds it
    let req = test::TestRequest::get()
        .uri("/api/tasks?search=milk")
        .insert_header(("Authorization", format!("Bearer {}", alice_token)))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["tasks"][0]["id"], task_id.as_str());

    // Bob cannot read it
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "name": "Bob",
            "email": "b@x.com",
            "password": "pw654321"
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "email": "b@x.com", "password": "pw654321" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let bob_token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_id))
        .insert_header(("Authorization", format!("Bearer {}", bob_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // And Bob's list is empty
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", bob_token)))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

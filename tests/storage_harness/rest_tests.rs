//! REST integration test macro for storage backends.
//!
//! The `rest_integration_tests!` macro generates HTTP-level tests that drive a
//! repository through full round-trips:
//! JSON → HTTP request → handler → EntityService → repository → HTTP response → JSON.
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_rest_create`: POST 201 with id and version
//! - `test_rest_read`: GET 200
//! - `test_rest_update`: PUT 200 with a new version
//! - `test_rest_update_stale`: PUT with an old version → 409 problem
//! - `test_rest_delete`: DELETE 204, then GET 404 problem
//!
//! ## Query
//! - `test_rest_query`: filter, sort and pagination through the query string
//! - `test_rest_query_errors`: malformed and disallowed queries → 400 problem
//!
//! ## Errors
//! - `test_rest_invalid_id`: GET with garbage id → 400 problem
//! - `test_rest_validation`: POST without summary → 400 problem
//! - `test_rest_unknown_path`: 404 problem

/// Generate a REST integration test suite for a storage backend.
///
/// `$factory` must produce a fresh, empty `Repository<TicketWithMetadata>`.
#[macro_export]
macro_rules! rest_integration_tests {
    ($factory:expr) => {
        mod rest_integration_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use serde_json::{Value, json};
            use ticket::server::ServerBuilder;

            async fn make_server() -> TestServer {
                let repository = $factory;
                let router = ServerBuilder::new()
                    .register_resource(service_for(repository))
                    .build();
                TestServer::try_new(router).unwrap()
            }

            async fn create(server: &TestServer, summary: &str, status: &str) -> Value {
                let response = server
                    .post("/api/v1/tickets")
                    .json(&json!({"summary": summary, "status": status}))
                    .await;
                response.assert_status(StatusCode::CREATED);
                response.json()
            }

            fn assert_problem(body: &Value, status: u16, type_uri: &str) {
                assert_eq!(body["status"], status);
                assert_eq!(body["type"], type_uri);
                assert!(body["title"].is_string());
                assert!(body["detail"].is_string());
            }

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_rest_create() {
                let server = make_server().await;
                let body = create(&server, "Printer jam", "open").await;

                assert_uuid(body["id"].as_str().unwrap());
                assert!(!body["version"].as_str().unwrap().is_empty());
                assert_eq!(body["summary"], "Printer jam");
                assert_eq!(body["description"], "");
                assert_eq!(body["status"], "open");
            }

            #[tokio::test]
            async fn test_rest_read() {
                let server = make_server().await;
                let created = create(&server, "Printer jam", "open").await;
                let id = created["id"].as_str().unwrap();

                let response = server.get(&format!("/api/v1/tickets/{}", id)).await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body, created);
            }

            #[tokio::test]
            async fn test_rest_update() {
                let server = make_server().await;
                let created = create(&server, "Printer jam", "open").await;
                let id = created["id"].as_str().unwrap();

                let response = server
                    .put(&format!("/api/v1/tickets/{}", id))
                    .json(&json!({
                        "version": created["version"],
                        "summary": "Printer jam",
                        "status": "closed"
                    }))
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["id"], created["id"]);
                assert_eq!(body["status"], "closed");
                assert_ne!(body["version"], created["version"]);
            }

            #[tokio::test]
            async fn test_rest_update_stale() {
                let server = make_server().await;
                let created = create(&server, "Printer jam", "open").await;
                let path = format!("/api/v1/tickets/{}", created["id"].as_str().unwrap());
                let stale = json!({
                    "version": created["version"],
                    "summary": "Printer jam",
                    "status": "closed"
                });

                server.put(&path).json(&stale).await.assert_status_ok();

                let response = server.put(&path).json(&stale).await;
                response.assert_status(StatusCode::CONFLICT);
                let body: Value = response.json();
                assert_problem(&body, 409, "ticket:err:conflict");
                assert_eq!(body["detail"], "update ticket failed: version conflict");
            }

            #[tokio::test]
            async fn test_rest_delete() {
                let server = make_server().await;
                let created = create(&server, "Printer jam", "open").await;
                let path = format!("/api/v1/tickets/{}", created["id"].as_str().unwrap());

                server
                    .delete(&path)
                    .await
                    .assert_status(StatusCode::NO_CONTENT);

                let response = server.get(&path).await;
                response.assert_status_not_found();
                assert_problem(&response.json(), 404, "ticket:err:notfound");
            }

            // ==============================================================
            // Query
            // ==============================================================

            #[tokio::test]
            async fn test_rest_query() {
                let server = make_server().await;
                for (summary, status) in [
                    ("alpha", "open"),
                    ("bravo", "closed"),
                    ("charlie", "open"),
                    ("delta", "open"),
                ] {
                    create(&server, summary, status).await;
                }

                let response = server
                    .get("/api/v1/tickets?filter=status%3D%3Dopen&sort=summary+desc&page=1&size=2")
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["page"], 1);
                assert_eq!(body["size"], 2);
                let names: Vec<&str> = body["results"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|t| t["summary"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["delta", "charlie"]);

                let response = server
                    .get("/api/v1/tickets?filter=status==resolved")
                    .await;
                let body: Value = response.json();
                assert_eq!(body["page"], 0);
                assert_eq!(body["size"], 0);
                assert_eq!(body["results"], json!([]));
            }

            #[tokio::test]
            async fn test_rest_query_errors() {
                let server = make_server().await;

                let cases = [
                    ("/api/v1/tickets?sort=summary%20up", "invalid sort: summary up"),
                    ("/api/v1/tickets?page=abc", "invalid page: abc"),
                    ("/api/v1/tickets?filter=summary%3Ea", "invalid filter operator: >"),
                    ("/api/v1/tickets?filter=owner==bob", "invalid filter field: owner"),
                ];
                for (path, detail) in cases {
                    let response = server.get(path).await;
                    response.assert_status_bad_request();
                    let body: Value = response.json();
                    assert_problem(&body, 400, "ticket:err:badrequest");
                    assert_eq!(body["detail"], detail, "for {}", path);
                }
            }

            // ==============================================================
            // Errors
            // ==============================================================

            #[tokio::test]
            async fn test_rest_invalid_id() {
                let server = make_server().await;
                let response = server.get("/api/v1/tickets/not-a-uuid").await;
                response.assert_status_bad_request();
                let body: Value = response.json();
                assert_eq!(body["detail"], "invalid id: not-a-uuid");
            }

            #[tokio::test]
            async fn test_rest_validation() {
                let server = make_server().await;
                let response = server
                    .post("/api/v1/tickets")
                    .json(&json!({"status": "open"}))
                    .await;
                response.assert_status_bad_request();
                let body: Value = response.json();
                assert_eq!(body["detail"], "invalid ticket: missing field: summary");
            }

            #[tokio::test]
            async fn test_rest_unknown_path() {
                let server = make_server().await;
                let response = server.get("/api/v1/widgets").await;
                response.assert_status_not_found();
                assert_problem(&response.json(), 404, "ticket:err:notfound");
            }
        }
    };
}

//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    account::{get_accounts, post_account},
    auth::{auth_guard, post_log_in},
    endpoints,
    group::{get_groups, post_group},
    not_found::get_404_not_found,
    purge::delete_me,
    record::{delete_record_endpoint, get_records, post_record},
    register_user::post_register_user,
};

/// Return a router with all the app's routes.
///
/// Everything except registration and log-in sits behind the bearer token
/// guard.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(post_register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::ACCOUNTS, get(get_accounts).post(post_account))
        .route(endpoints::RECORDS, get(get_records).post(post_record))
        .route(endpoints::RECORD, delete(delete_record_endpoint))
        .route(endpoints::GROUPS, get(get_groups).post(post_group))
        .route(endpoints::ME, delete(delete_me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, auth::LoginErrorMode, endpoints, routing::build_router};

    const TEST_EMAIL: &str = "test@test.com";
    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "wowwhatasecret", LoginErrorMode::default())
            .expect("Could not create app state");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn register_and_log_in(server: &TestServer) -> String {
        server
            .post(endpoints::USERS)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();

        response.json::<String>()
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let server = get_test_server();

        for path in [endpoints::ACCOUNTS, endpoints::RECORDS, endpoints::GROUPS] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
        server
            .delete(endpoints::ME)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_and_log_in_do_not_require_a_token() {
        let server = get_test_server();

        let token = register_and_log_in(&server).await;

        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn unknown_paths_respond_with_json_404() {
        let server = get_test_server();

        let response = server.get("/api/nonsense").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.json::<Value>()["message"].is_string());
    }

    #[tokio::test]
    async fn user_can_manage_their_data_with_a_token() {
        let server = get_test_server();
        let token = register_and_log_in(&server).await;

        let account_response = server
            .post(endpoints::ACCOUNTS)
            .authorization_bearer(&token)
            .json(&json!({
                "kind": "bank",
                "name": "台新薪轉",
                "balance": 86400.0,
                "bank_code": "812",
                "bank_name": "台新銀行",
                "account_number": "2001-0123-4567"
            }))
            .await;
        account_response.assert_status_ok();

        let accounts = server
            .get(endpoints::ACCOUNTS)
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(accounts.as_array().map(Vec::len), Some(1));

        let record_response = server
            .post(endpoints::RECORDS)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": 120.0,
                "date": "2024-06-01",
                "description": "Beef noodle soup"
            }))
            .await;
        record_response.assert_status(StatusCode::CREATED);
        let record_id = record_response.json::<Value>()["id"]
            .as_i64()
            .expect("record response should contain an integer id");

        server
            .delete(&endpoints::format_endpoint(endpoints::RECORD, record_id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let group_response = server
            .post(endpoints::GROUPS)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Flatmates" }))
            .await;
        group_response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn purged_user_cannot_log_in_again() {
        let server = get_test_server();
        let token = register_and_log_in(&server).await;

        let response = server
            .delete(endpoints::ME)
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "ok": true }));

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

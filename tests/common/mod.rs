//! Test application: a full router behind `axum_test::TestServer` with one
//! company already created.

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use payroll::config::AppConfig;
use payroll::server::ServerBuilder;
use serde_json::{Value, json};
use uuid::Uuid;

/// GSTIN registered in Karnataka (state code 29)
pub const COMPANY_GSTIN: &str = "29ABCDE1234F1Z5";

pub fn server_with(config: AppConfig) -> TestServer {
    let app = ServerBuilder::new()
        .with_config(config)
        .build()
        .expect("Failed to build router");
    TestServer::new(app)
}

fn header(name: &'static str, value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_str(value).expect("valid header value"),
    )
}

/// Attach gateway identity headers
pub fn identify(
    request: TestRequest,
    user: Uuid,
    role: &str,
    company: Option<Uuid>,
) -> TestRequest {
    let (n, v) = header("x-user-id", &user.to_string());
    let request = request.add_header(n, v);
    let (n, v) = header("x-user-role", role);
    let request = request.add_header(n, v);
    match company {
        Some(company) => {
            let (n, v) = header("x-company-id", &company.to_string());
            request.add_header(n, v)
        }
        None => request,
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub company_id: Uuid,
    pub admin_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::with_defaults()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let server = server_with(config);
        let admin_id = Uuid::new_v4();
        let company_id = create_company(&server, admin_id, "Acme Traders").await;
        Self {
            server,
            company_id,
            admin_id,
        }
    }

    /// Admin requests in the test company
    pub fn get(&self, path: &str) -> TestRequest {
        self.as_role("admin", self.server.get(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.as_role("admin", self.server.post(path))
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.as_role("admin", self.server.put(path))
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.as_role("admin", self.server.delete(path))
    }

    pub fn as_role(&self, role: &str, request: TestRequest) -> TestRequest {
        identify(request, self.admin_id, role, Some(self.company_id))
    }

    pub fn as_user(&self, user: Uuid, role: &str, request: TestRequest) -> TestRequest {
        identify(request, user, role, Some(self.company_id))
    }

    /// POST as admin, expect 201, return the body
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.post(path).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    pub async fn fetch(&self, path: &str) -> Value {
        let response = self.get(path).await;
        response.assert_status_ok();
        response.json()
    }
}

/// Create a company as a fresh admin and return its id
pub async fn create_company(server: &TestServer, admin: Uuid, name: &str) -> Uuid {
    let response = identify(server.post("/api/companies"), admin, "admin", None)
        .json(&json!({
            "name": name,
            "gstin": COMPANY_GSTIN,
            "state": "Karnataka",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    id_of(&body)
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("response has an id")
}

pub fn error_code(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	body::Body,
	http::{header::HeaderName, header::HeaderValue, Method, Request, StatusCode},
	response::Response,
	Router,
};
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tessera_server_auth::{ProjectId, TenantId, UserId};
use tessera_server_db::{
	create_pool, run_migrations,
	testing::{Fixture, TestDb},
	SessionRepository,
};
use tower::ServiceExt;

use tessera_server::{create_app_state, create_router, ServerConfig};

#[derive(Clone)]
pub struct TestUser {
	pub id: UserId,
	pub session_token: String,
}

impl TestUser {
	pub fn auth_header(&self) -> (HeaderName, HeaderValue) {
		(
			HeaderName::from_static("cookie"),
			HeaderValue::from_str(&format!("tessera_session={}", self.session_token)).unwrap(),
		)
	}

	pub fn bearer_header(&self) -> (HeaderName, HeaderValue) {
		(
			HeaderName::from_static("authorization"),
			HeaderValue::from_str(&format!("Bearer {}", self.session_token)).unwrap(),
		)
	}
}

#[derive(Clone)]
pub struct TenantFixture {
	pub tenant: TenantId,
	pub admin: TestUser,
	pub manager: TestUser,
	/// Assigned to `project_a` only.
	pub user: TestUser,
	pub project_a: ProjectId,
	pub project_b: ProjectId,
}

impl TenantFixture {
	/// `/api/{path}?tenantId=..[&projectId=..]`
	pub fn url(&self, path: &str, project: Option<ProjectId>) -> String {
		let sep = if path.contains('?') { '&' } else { '?' };
		match project {
			Some(p) => format!("/api/{path}{sep}tenantId={}&projectId={p}", self.tenant),
			None => format!("/api/{path}{sep}tenantId={}", self.tenant),
		}
	}
}

#[derive(Clone)]
pub struct Fixtures {
	pub tenant_a: TenantFixture,
	pub tenant_b: TenantFixture,
}

pub struct TestApp {
	pub router: Router,
	pub fixtures: Fixtures,
	_temp_dir: TempDir,
}

impl TestApp {
	pub async fn new() -> Self {
		let temp_dir = tempfile::tempdir().unwrap();
		let db_url = format!("sqlite:{}", temp_dir.path().join("scoping.db").display());
		let pool = create_pool(&db_url, 4).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let db = TestDb { pool: pool.clone() };
		let sessions = SessionRepository::new(pool.clone());
		let tenant_a = create_tenant_fixture(&db, &sessions).await;
		let tenant_b = create_tenant_fixture(&db, &sessions).await;

		let state = create_app_state(pool, &ServerConfig::default());
		Self {
			router: create_router(state),
			fixtures: Fixtures { tenant_a, tenant_b },
			_temp_dir: temp_dir,
		}
	}

	pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self
			.request(Method::GET, path, user, Option::<()>::None)
			.await
	}

	pub async fn post(&self, path: &str, user: Option<&TestUser>, body: impl Serialize) -> Response<Body> {
		self.request(Method::POST, path, user, Some(body)).await
	}

	pub async fn put(&self, path: &str, user: Option<&TestUser>, body: impl Serialize) -> Response<Body> {
		self.request(Method::PUT, path, user, Some(body)).await
	}

	pub async fn delete(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self
			.request(Method::DELETE, path, user, Option::<()>::None)
			.await
	}

	pub async fn send(&self, request: Request<Body>) -> Response<Body> {
		self.router.clone().oneshot(request).await.unwrap()
	}

	async fn request<T: Serialize>(
		&self,
		method: Method,
		path: &str,
		user: Option<&TestUser>,
		body: Option<T>,
	) -> Response<Body> {
		let mut builder = Request::builder().method(method).uri(path);
		if let Some(test_user) = user {
			let (name, value) = test_user.auth_header();
			builder = builder.header(name, value);
		}
		let request_body = match body {
			Some(b) => {
				builder = builder.header("content-type", "application/json");
				Body::from(serde_json::to_string(&b).unwrap())
			}
			None => Body::empty(),
		};
		self.send(builder.body(request_body).unwrap()).await
	}

	/// POST and return the created JSON, asserting 201.
	pub async fn create(&self, path: &str, user: &TestUser, body: Value) -> Value {
		let response = self.post(path, Some(user), body).await;
		let (status, json) = into_json(response).await;
		assert_eq!(status, StatusCode::CREATED, "create {path}: {json}");
		json
	}
}

pub async fn into_json(response: Response<Body>) -> (StatusCode, Value) {
	let (parts, body) = response.into_parts();
	let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(parts.status, value)
}

pub struct AuthzCase {
	pub name: &'static str,
	pub method: Method,
	pub path: String,
	pub user: Option<TestUser>,
	pub body: Option<Value>,
	pub expected_status: StatusCode,
	/// When set, the `error` code the response body must carry.
	pub expected_error: Option<&'static str>,
}

pub async fn run_authz_cases(app: &TestApp, cases: &[AuthzCase]) {
	for case in cases {
		let response = match (&case.method, &case.body) {
			(m, Some(body)) if *m == Method::POST => {
				app.post(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, Some(body)) if *m == Method::PUT => {
				app.put(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, _) if *m == Method::DELETE => app.delete(&case.path, case.user.as_ref()).await,
			_ => app.get(&case.path, case.user.as_ref()).await,
		};

		let (status, body) = into_json(response).await;
		if status != case.expected_status {
			panic!(
				"Case '{}': {} {} - expected {}, got {}\nResponse body: {}",
				case.name, case.method, case.path, case.expected_status, status, body
			);
		}
		if let Some(code) = case.expected_error {
			assert_eq!(
				body["error"], code,
				"Case '{}': {} {} - wrong error code\nResponse body: {}",
				case.name, case.method, case.path, body
			);
		}
	}
}

async fn create_tenant_fixture(db: &TestDb, sessions: &SessionRepository) -> TenantFixture {
	let f = Fixture::new(db).await;
	TenantFixture {
		tenant: f.tenant,
		admin: login(sessions, f.admin).await,
		manager: login(sessions, f.manager).await,
		user: login(sessions, f.user).await,
		project_a: f.project_a,
		project_b: f.project_b,
	}
}

async fn login(sessions: &SessionRepository, user_id: UserId) -> TestUser {
	let (_, session_token) = sessions.create_session(&user_id, 24).await.unwrap();
	TestUser {
		id: user_id,
		session_token,
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	body::Body,
	http::{Method, Request, StatusCode},
};
use serde_json::json;

use super::support::{into_json, run_authz_cases, AuthzCase, TestApp, TestUser};

fn stakeholder(name: &str) -> serde_json::Value {
	json!({ "name": name, "influence": 3, "interest": 4 })
}

fn document(code: &str) -> serde_json::Value {
	json!({ "code": code, "title": "Environmental Management Plan", "revision": 1 })
}

#[tokio::test]
async fn test_record_authorization() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;
	let bogus = TestUser {
		id: a.user.id,
		session_token: "0".repeat(64),
	};

	let cases = vec![
		AuthzCase {
			name: "unauthenticated_cannot_list",
			method: Method::GET,
			path: a.url("documents", None),
			user: None,
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
			expected_error: None,
		},
		AuthzCase {
			name: "unknown_token_is_unauthenticated",
			method: Method::GET,
			path: a.url("documents", None),
			user: Some(bogus),
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
			expected_error: None,
		},
		AuthzCase {
			name: "missing_tenant_is_rejected",
			method: Method::GET,
			path: "/api/documents".to_string(),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("missing_tenant_context"),
		},
		AuthzCase {
			name: "malformed_tenant_is_rejected",
			method: Method::GET,
			path: "/api/documents?tenantId=acme".to_string(),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("validation_error"),
		},
		AuthzCase {
			name: "other_tenant_member_is_forbidden",
			method: Method::GET,
			path: a.url("documents", None),
			user: Some(b.admin.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "foreign_project_is_rejected",
			method: Method::GET,
			path: a.url("stakeholders", Some(b.project_a)),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("project_not_in_tenant"),
		},
		AuthzCase {
			name: "project_scoped_list_requires_project",
			method: Method::GET,
			path: a.url("stakeholders", None),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("missing_project_context"),
		},
		AuthzCase {
			name: "user_can_list_assigned_project",
			method: Method::GET,
			path: a.url("stakeholders", Some(a.project_a)),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_list_unassigned_project",
			method: Method::GET,
			path: a.url("stakeholders", Some(a.project_b)),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_can_list_any_project",
			method: Method::GET,
			path: a.url("stakeholders", Some(a.project_b)),
			user: Some(a.manager.clone()),
			body: None,
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "user_can_create_in_assigned_project",
			method: Method::POST,
			path: a.url("stakeholders", Some(a.project_a)),
			user: Some(a.user.clone()),
			body: Some(stakeholder("Village council")),
			expected_status: StatusCode::CREATED,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_create_in_unassigned_project",
			method: Method::POST,
			path: a.url("stakeholders", Some(a.project_b)),
			user: Some(a.user.clone()),
			body: Some(stakeholder("Fishing cooperative")),
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "user_can_read_tenant_records",
			method: Method::GET,
			path: a.url("documents", None),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_create_tenant_records",
			method: Method::POST,
			path: a.url("documents", None),
			user: Some(a.user.clone()),
			body: Some(document("EMP-01")),
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_can_create_tenant_records",
			method: Method::POST,
			path: a.url("documents", None),
			user: Some(a.manager.clone()),
			body: Some(document("EMP-01")),
			expected_status: StatusCode::CREATED,
			expected_error: None,
		},
		AuthzCase {
			name: "unknown_filter_column_is_rejected",
			method: Method::GET,
			path: a.url("documents?tenant_id=x", None),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("validation_error"),
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn bearer_token_is_accepted() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let (name, value) = a.manager.bearer_header();

	let request = Request::builder()
		.method(Method::GET)
		.uri(a.url("documents", None))
		.header(name, value)
		.body(Body::empty())
		.unwrap();
	assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn records_of_other_tenants_are_not_found() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;

	let doc = app.create(&a.url("documents", None), &a.admin, document("EMP-01")).await;
	let id = doc["id"].as_str().unwrap();
	assert_eq!(doc["tenant_id"], a.tenant.to_string());

	let response = app.get(&b.url(&format!("documents/{id}"), None), Some(&b.admin)).await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "not_found");

	let response = app
		.put(&b.url(&format!("documents/{id}"), None), Some(&b.admin), document("EMP-02"))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let response = app.delete(&b.url(&format!("documents/{id}"), None), Some(&b.admin)).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let (_, listed) = into_json(app.get(&b.url("documents", None), Some(&b.admin)).await).await;
	assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn records_of_other_projects_are_not_found() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let created = app
		.create(&a.url("stakeholders", Some(a.project_b)), &a.manager, stakeholder("NGO"))
		.await;
	let id = created["id"].as_str().unwrap();

	let response = app
		.get(&a.url(&format!("stakeholders/{id}"), Some(a.project_a)), Some(&a.admin))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_natural_key_is_reported_with_field() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;
	let resource = json!({ "reference": "R-001", "name": "Mangrove stand" });

	app.create(&a.url("biodiversity-resources", None), &a.admin, resource.clone())
		.await;

	let response = app
		.post(&a.url("biodiversity-resources", None), Some(&a.admin), resource.clone())
		.await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "duplicate_key");
	assert_eq!(body["details"]["field"], "reference");

	app.create(&b.url("biodiversity-resources", None), &b.admin, resource)
		.await;
}

#[tokio::test]
async fn referenced_record_cannot_be_deleted() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let doc = app.create(&a.url("documents", None), &a.admin, document("SOP-7")).await;
	let doc_id = doc["id"].as_str().unwrap();
	let log = app
		.create(
			&a.url("training-logs", Some(a.project_a)),
			&a.admin,
			json!({
				"document_id": doc_id,
				"topic": "Spill response",
				"held_on": "2025-03-04",
				"attendees": 12,
			}),
		)
		.await;
	let log_id = log["id"].as_str().unwrap();

	let response = app
		.delete(&a.url(&format!("documents/{doc_id}"), None), Some(&a.admin))
		.await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "referenced_by_other_records");
	assert_eq!(body["details"]["referrer"], "training_log");

	let response = app
		.delete(&a.url(&format!("training-logs/{log_id}"), Some(a.project_a)), Some(&a.admin))
		.await;
	assert_eq!(response.status(), StatusCode::NO_CONTENT);

	let response = app
		.delete(&a.url(&format!("documents/{doc_id}"), None), Some(&a.admin))
		.await;
	assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reference_to_other_tenant_is_a_validation_error() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;

	let foreign = app
		.create(
			&b.url("biodiversity-resources", None),
			&b.admin,
			json!({ "reference": "R-9", "name": "Reef" }),
		)
		.await;

	let response = app
		.post(
			&a.url("risk-identifications", Some(a.project_a)),
			Some(&a.admin),
			json!({
				"resource_id": foreign["id"],
				"description": "Sediment runoff",
				"likelihood": 3,
				"severity": 4,
			}),
		)
		.await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn update_replaces_payload_and_filters_apply() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let created = app
		.create(
			&a.url("biodiversity-resources", None),
			&a.admin,
			json!({ "reference": "R-1", "name": "Wetland", "category": "wetland" }),
		)
		.await;
	app.create(
		&a.url("biodiversity-resources", None),
		&a.admin,
		json!({ "reference": "R-2", "name": "Forest", "category": "forest" }),
	)
	.await;
	let id = created["id"].as_str().unwrap();

	let response = app
		.put(
			&a.url(&format!("biodiversity-resources/{id}"), None),
			Some(&a.manager),
			json!({ "reference": "R-1", "name": "Coastal wetland" }),
		)
		.await;
	let (status, updated) = into_json(response).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(updated["name"], "Coastal wetland");
	assert!(updated["category"].is_null());

	let (_, forests) = into_json(
		app.get(&a.url("biodiversity-resources?category=forest", None), Some(&a.user))
			.await,
	)
	.await;
	assert_eq!(forests.as_array().unwrap().len(), 1);
	assert_eq!(forests[0]["reference"], "R-2");

	let (_, page) = into_json(
		app.get(&a.url("biodiversity-resources?limit=1", None), Some(&a.user))
			.await,
	)
	.await;
	assert_eq!(page.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_and_id_are_validation_errors() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let response = app
		.post(&a.url("documents", None), Some(&a.admin), json!({ "title": "no code" }))
		.await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "validation_error");

	let response = app.get(&a.url("documents/not-an-id", None), Some(&a.admin)).await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn health_reports_database() {
	let app = TestApp::new().await;
	let (status, body) = into_json(app.get("/health", None).await).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["database"], "healthy");
}

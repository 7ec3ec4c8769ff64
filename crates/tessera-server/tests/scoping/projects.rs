// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::support::{into_json, run_authz_cases, AuthzCase, TestApp};

#[tokio::test]
async fn test_project_authorization() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;
	let pa = a.project_a;
	let pb = a.project_b;

	let cases = vec![
		AuthzCase {
			name: "user_can_get_assigned_project",
			method: Method::GET,
			path: a.url(&format!("projects/{pa}"), None),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_get_unassigned_project",
			method: Method::GET,
			path: a.url(&format!("projects/{pb}"), None),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "project_of_other_tenant_is_not_found",
			method: Method::GET,
			path: b.url(&format!("projects/{pa}"), None),
			user: Some(b.admin.clone()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_create_project",
			method: Method::POST,
			path: a.url("projects", None),
			user: Some(a.user.clone()),
			body: Some(json!({ "name": "Quarry" })),
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_can_create_project",
			method: Method::POST,
			path: a.url("projects", None),
			user: Some(a.manager.clone()),
			body: Some(json!({ "name": "Quarry" })),
			expected_status: StatusCode::CREATED,
			expected_error: None,
		},
		AuthzCase {
			name: "duplicate_project_name_is_rejected",
			method: Method::POST,
			path: a.url("projects", None),
			user: Some(a.admin.clone()),
			body: Some(json!({ "name": "Quarry" })),
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("duplicate_key"),
		},
		AuthzCase {
			name: "user_can_update_assigned_project",
			method: Method::PUT,
			path: a.url(&format!("projects/{pa}"), None),
			user: Some(a.user.clone()),
			body: Some(json!({ "name": "Project A", "description": "Phase 2" })),
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_cannot_delete_project",
			method: Method::DELETE,
			path: a.url(&format!("projects/{pb}"), None),
			user: Some(a.manager.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_assign_members",
			method: Method::POST,
			path: a.url(&format!("projects/{pb}/members"), None),
			user: Some(a.user.clone()),
			body: Some(json!({ "userId": a.user.id.to_string() })),
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_cannot_assign_other_tenant_user",
			method: Method::POST,
			path: a.url(&format!("projects/{pb}/members"), None),
			user: Some(a.manager.clone()),
			body: Some(json!({ "userId": b.user.id.to_string() })),
			expected_status: StatusCode::NOT_FOUND,
			expected_error: None,
		},
		AuthzCase {
			name: "admin_can_delete_empty_project",
			method: Method::DELETE,
			path: a.url(&format!("projects/{pb}"), None),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::NO_CONTENT,
			expected_error: None,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn user_lists_only_assigned_projects() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let (status, projects) = into_json(app.get(&a.url("projects", None), Some(&a.user)).await).await;
	assert_eq!(status, StatusCode::OK);
	let ids: Vec<_> = projects
		.as_array()
		.unwrap()
		.iter()
		.map(|p| p["id"].as_str().unwrap().to_string())
		.collect();
	assert_eq!(ids, vec![a.project_a.to_string()]);

	let (_, all) = into_json(app.get(&a.url("projects", None), Some(&a.manager)).await).await;
	assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn assignment_grants_and_revokes_project_access() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let pb = a.project_b;
	let stakeholders = a.url("stakeholders", Some(pb));

	assert_eq!(
		app.get(&stakeholders, Some(&a.user)).await.status(),
		StatusCode::FORBIDDEN
	);

	let response = app
		.post(
			&a.url(&format!("projects/{pb}/members"), None),
			Some(&a.manager),
			json!({ "userId": a.user.id.to_string() }),
		)
		.await;
	assert_eq!(response.status(), StatusCode::NO_CONTENT);
	assert_eq!(app.get(&stakeholders, Some(&a.user)).await.status(), StatusCode::OK);

	let (_, members) = into_json(
		app.get(&a.url(&format!("projects/{pb}/members"), None), Some(&a.user))
			.await,
	)
	.await;
	assert_eq!(members[0]["id"], a.user.id.to_string());

	let unassign = a.url(&format!("projects/{pb}/members/{}", a.user.id), None);
	assert_eq!(
		app.delete(&unassign, Some(&a.manager)).await.status(),
		StatusCode::NO_CONTENT
	);
	assert_eq!(
		app.delete(&unassign, Some(&a.manager)).await.status(),
		StatusCode::NOT_FOUND
	);
	assert_eq!(
		app.get(&stakeholders, Some(&a.user)).await.status(),
		StatusCode::FORBIDDEN
	);
}

#[tokio::test]
async fn project_with_records_cannot_be_deleted() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	app.create(
		&a.url("incident-reports", Some(a.project_a)),
		&a.user,
		json!({ "title": "Oil sheen", "occurred_on": "2025-02-01", "severity": "moderate" }),
	)
	.await;

	let response = app
		.delete(&a.url(&format!("projects/{}", a.project_a), None), Some(&a.admin))
		.await;
	let (status, body) = into_json(response).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "referenced_by_other_records");
	assert_eq!(body["details"]["referrer"], "incident_report");
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::support::{into_json, run_authz_cases, AuthzCase, TestApp};

#[tokio::test]
async fn test_member_authorization() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;
	let b = &app.fixtures.tenant_b;

	let cases = vec![
		AuthzCase {
			name: "admin_can_list_members",
			method: Method::GET,
			path: a.url("members", None),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
			expected_error: None,
		},
		AuthzCase {
			name: "user_cannot_list_members",
			method: Method::GET,
			path: a.url("members", None),
			user: Some(a.user.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "other_tenant_admin_cannot_list_members",
			method: Method::GET,
			path: a.url("members", None),
			user: Some(b.admin.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_cannot_invite_admin",
			method: Method::POST,
			path: a.url("members", None),
			user: Some(a.manager.clone()),
			body: Some(json!({ "email": "boss@example.com", "display_name": "Boss", "role": "admin" })),
			expected_status: StatusCode::FORBIDDEN,
			expected_error: None,
		},
		AuthzCase {
			name: "manager_can_invite_user",
			method: Method::POST,
			path: a.url("members", None),
			user: Some(a.manager.clone()),
			body: Some(json!({ "email": "field@example.com", "display_name": "Field Officer", "role": "USER" })),
			expected_status: StatusCode::CREATED,
			expected_error: None,
		},
		AuthzCase {
			name: "email_taken_in_any_tenant_is_rejected",
			method: Method::POST,
			path: b.url("members", None),
			user: Some(b.admin.clone()),
			body: Some(json!({ "email": "field@example.com", "display_name": "Someone", "role": "user" })),
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("duplicate_key"),
		},
		AuthzCase {
			name: "unknown_role_is_rejected",
			method: Method::POST,
			path: a.url("members", None),
			user: Some(a.admin.clone()),
			body: Some(json!({ "email": "x@example.com", "display_name": "X", "role": "owner" })),
			expected_status: StatusCode::BAD_REQUEST,
			expected_error: Some("validation_error"),
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn member_list_is_tenant_bounded() {
	let app = TestApp::new().await;
	let a = &app.fixtures.tenant_a;

	let (status, members) = into_json(app.get(&a.url("members", None), Some(&a.manager)).await).await;
	assert_eq!(status, StatusCode::OK);
	let members = members.as_array().unwrap();
	assert_eq!(members.len(), 3);
	assert!(members
		.iter()
		.all(|m| m["tenant_id"] == a.tenant.to_string()));
}

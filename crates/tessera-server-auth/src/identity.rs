// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Who is calling.
//!
//! A request moves through three identity shapes:
//!
//! ```text
//! session token ──► Principal ──► Identity ──► SubjectAttrs
//!                   (user id)     (+ role,     (+ assigned projects,
//!                                  tenant)      loaded per request)
//! ```
//!
//! None of these are cached beyond a single request: role and project
//! assignments can change between requests.

use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, Role, TenantId, UserId};

/// An authenticated caller as established by the session layer.
///
/// A principal says nothing about tenant membership; it only proves who the
/// caller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub user_id: UserId,
}

impl Principal {
	pub fn new(user_id: UserId) -> Self {
		Self { user_id }
	}
}

/// A principal resolved against its membership in a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub user_id: UserId,
	pub role: Role,
	pub tenant_id: TenantId,
}

/// Attributes describing the subject for policy evaluation.
///
/// All data is pre-loaded; policy evaluation never touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAttrs {
	pub user_id: UserId,
	pub tenant_id: TenantId,
	pub role: Role,
	pub assigned_projects: Vec<ProjectId>,
}

impl SubjectAttrs {
	/// Creates a subject with no project assignments.
	pub fn new(identity: Identity) -> Self {
		Self {
			user_id: identity.user_id,
			tenant_id: identity.tenant_id,
			role: identity.role,
			assigned_projects: Vec::new(),
		}
	}

	/// Builder: set the project assignment set.
	pub fn with_assignments(mut self, projects: Vec<ProjectId>) -> Self {
		self.assigned_projects = projects;
		self
	}

	/// Returns true if the subject is explicitly assigned to the project.
	pub fn is_assigned(&self, project_id: ProjectId) -> bool {
		self.assigned_projects.contains(&project_id)
	}

	/// Returns true if the subject may see the project at all.
	pub fn can_see_project(&self, project_id: ProjectId) -> bool {
		self.role.sees_all_projects() || self.is_assigned(project_id)
	}

	pub fn identity(&self) -> Identity {
		Identity {
			user_id: self.user_id,
			role: self.role,
			tenant_id: self.tenant_id,
		}
	}
}

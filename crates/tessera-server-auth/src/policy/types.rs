// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type definitions for policy evaluation.
//!
//! - [`Action`]: the operation being attempted
//! - [`Target`]: what the operation touches (tenant + optional project)
//! - [`Decision`]: allow, or deny with a [`DenyReason`]

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ProjectId, Role, TenantId};

/// Actions that can be performed on scoped resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Read,
	Create,
	Update,
	Delete,
	ManageMembers,
}

impl Action {
	pub fn all() -> &'static [Action] {
		&[
			Action::Read,
			Action::Create,
			Action::Update,
			Action::Delete,
			Action::ManageMembers,
		]
	}
}

/// The kind of thing an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
	/// A compliance record (tenant- or project-scoped).
	Record,
	/// A project itself.
	Project,
	/// Tenant or project membership. Carries the role being granted, if any.
	Membership { granted_role: Option<Role> },
}

/// Attributes describing what an action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
	pub kind: TargetKind,
	pub tenant_id: TenantId,
	/// The project the target belongs to; `None` for tenant-level targets.
	pub project_id: Option<ProjectId>,
}

impl Target {
	/// A tenant-level record (not bound to a project).
	pub fn tenant_record(tenant_id: TenantId) -> Self {
		Self {
			kind: TargetKind::Record,
			tenant_id,
			project_id: None,
		}
	}

	/// A record inside a project.
	pub fn project_record(tenant_id: TenantId, project_id: ProjectId) -> Self {
		Self {
			kind: TargetKind::Record,
			tenant_id,
			project_id: Some(project_id),
		}
	}

	/// A project. `None` means "a new project in this tenant".
	pub fn project(tenant_id: TenantId, project_id: Option<ProjectId>) -> Self {
		Self {
			kind: TargetKind::Project,
			tenant_id,
			project_id,
		}
	}

	/// Membership of a project (`Some`) or of the tenant (`None`).
	pub fn membership(
		tenant_id: TenantId,
		project_id: Option<ProjectId>,
		granted_role: Option<Role>,
	) -> Self {
		Self {
			kind: TargetKind::Membership { granted_role },
			tenant_id,
			project_id,
		}
	}
}

/// Why a request was denied. Logged, never sent to the caller verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
	/// The target belongs to a different tenant than the subject.
	CrossTenant,
	/// A USER acting on a project outside its assignment set.
	ProjectNotAssigned,
	/// The role may never perform this action.
	RoleInsufficient,
	/// Reserved for ADMIN.
	AdminOnly,
	/// The stored role value is not one of the known roles.
	UnrecognizedRole,
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			DenyReason::CrossTenant => "target belongs to another tenant",
			DenyReason::ProjectNotAssigned => "project not assigned to user",
			DenyReason::RoleInsufficient => "role does not permit this action",
			DenyReason::AdminOnly => "action reserved for admins",
			DenyReason::UnrecognizedRole => "unrecognized role",
		};
		f.write_str(s)
	}
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny(DenyReason),
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allow)
	}

	/// Converts the decision into a `Result`, for `?`-style call sites.
	pub fn into_result(self) -> Result<(), DenyReason> {
		match self {
			Decision::Allow => Ok(()),
			Decision::Deny(reason) => Err(reason),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn target_builders() {
		let tenant = TenantId::generate();
		let project = ProjectId::generate();

		let t = Target::project_record(tenant, project);
		assert_eq!(t.kind, TargetKind::Record);
		assert_eq!(t.project_id, Some(project));

		let t = Target::tenant_record(tenant);
		assert_eq!(t.project_id, None);

		let t = Target::membership(tenant, None, Some(Role::Admin));
		assert_eq!(
			t.kind,
			TargetKind::Membership {
				granted_role: Some(Role::Admin)
			}
		);
	}

	#[test]
	fn decision_into_result() {
		assert!(Decision::Allow.into_result().is_ok());
		assert_eq!(
			Decision::Deny(DenyReason::AdminOnly).into_result(),
			Err(DenyReason::AdminOnly)
		);
	}
}

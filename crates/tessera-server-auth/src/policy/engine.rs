// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation engine.
//!
//! [`authorize`] is a pure function over pre-loaded attributes. Evaluation is
//! two-phase:
//!
//! 1. **Tenant boundary**: a target outside the subject's tenant is always denied.
//! 2. **Role table**: ADMIN > MANAGER > USER, with USER limited to its assigned
//!    projects.
//!
//! Anything not explicitly allowed below is denied.

use tracing::instrument;

use super::types::{Action, Decision, DenyReason, Target, TargetKind};
use crate::identity::SubjectAttrs;
use crate::types::Role;

/// Evaluates whether `subject` may perform `action` on `target`.
#[instrument(
	level = "debug",
	skip(subject, target),
	fields(
		user_id = %subject.user_id,
		role = %subject.role,
		action = ?action,
		target_kind = ?target.kind,
	)
)]
pub fn authorize(subject: &SubjectAttrs, action: Action, target: &Target) -> Decision {
	let decision = if subject.tenant_id != target.tenant_id {
		Decision::Deny(DenyReason::CrossTenant)
	} else {
		match subject.role {
			Role::Admin => Decision::Allow,
			Role::Manager => evaluate_manager(action, target),
			Role::User => evaluate_user(subject, action, target),
		}
	};

	match decision {
		Decision::Allow => tracing::debug!("access allowed"),
		Decision::Deny(reason) => tracing::info!(
			reason = %reason,
			target_tenant = %target.tenant_id,
			target_project = ?target.project_id,
			"access denied"
		),
	}

	decision
}

/// Convenience wrapper returning `true` when allowed.
pub fn is_allowed(subject: &SubjectAttrs, action: Action, target: &Target) -> bool {
	authorize(subject, action, target).is_allowed()
}

/// Managers act tenant-wide, minus the destructive operations kept for admins.
fn evaluate_manager(action: Action, target: &Target) -> Decision {
	match (action, target.kind) {
		(Action::Delete, TargetKind::Project) => Decision::Deny(DenyReason::AdminOnly),
		(
			Action::ManageMembers,
			TargetKind::Membership {
				granted_role: Some(Role::Admin),
			},
		) => Decision::Deny(DenyReason::AdminOnly),
		_ => Decision::Allow,
	}
}

fn evaluate_user(subject: &SubjectAttrs, action: Action, target: &Target) -> Decision {
	match action {
		Action::Delete | Action::ManageMembers => Decision::Deny(DenyReason::RoleInsufficient),
		Action::Read | Action::Create | Action::Update => match target.project_id {
			Some(project_id) if subject.is_assigned(project_id) => Decision::Allow,
			Some(_) => Decision::Deny(DenyReason::ProjectNotAssigned),
			// Tenant-level records are readable by every member; nothing else
			// at tenant level is open to USER.
			None if action == Action::Read && target.kind == TargetKind::Record => Decision::Allow,
			None => Decision::Deny(DenyReason::RoleInsufficient),
		},
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for identity and scoping.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for tenants, projects,
//!   users, sessions and compliance records ([`TenantId`], [`ProjectId`], ...)
//!   so a project id can never be passed where a tenant id is expected.
//! - **Role**: the tenant-level role ladder ([`Role`]).
//!
//! All ID types serialize transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Parse an ID from its string form.
			pub fn parse(s: &str) -> Result<Self, uuid::Error> {
				Uuid::parse_str(s.trim()).map(Self)
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(TenantId, "Unique identifier for a tenant (organization).");
define_id_type!(ProjectId, "Unique identifier for a project within a tenant.");
define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(SessionId, "Unique identifier for a session.");
define_id_type!(RecordId, "Unique identifier for a compliance record.");

// =============================================================================
// Roles
// =============================================================================

/// Role of a user within their tenant.
///
/// ADMIN and MANAGER see every project of the tenant; USER only sees projects
/// it has been assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full tenant control, including destructive tenant-level operations.
	#[serde(alias = "ADMIN")]
	Admin,
	/// Tenant-wide access except operations reserved for admins.
	#[serde(alias = "MANAGER")]
	Manager,
	/// Access limited to assigned projects.
	#[serde(alias = "USER")]
	User,
}

impl Role {
	/// Returns all available roles, highest first.
	pub fn all() -> &'static [Role] {
		&[Role::Admin, Role::Manager, Role::User]
	}

	/// Returns true if this role has at least the permissions of the given role.
	pub fn has_permission_of(&self, other: &Role) -> bool {
		matches!(
			(self, other),
			(Role::Admin, _) | (Role::Manager, Role::Manager | Role::User) | (Role::User, Role::User)
		)
	}

	/// Returns true for roles that see every project in the tenant.
	pub fn sees_all_projects(&self) -> bool {
		matches!(self, Role::Admin | Role::Manager)
	}

	/// The storage/wire form of the role.
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::Manager => "manager",
			Role::User => "user",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role: {0}")]
pub struct UnrecognizedRole(pub String);

impl FromStr for Role {
	type Err = UnrecognizedRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"admin" => Ok(Role::Admin),
			"manager" => Ok(Role::Manager),
			"user" => Ok(Role::User),
			_ => Err(UnrecognizedRole(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_roundtrips_through_display_and_parse() {
		let id = TenantId::generate();
		assert_eq!(TenantId::parse(&id.to_string()).unwrap(), id);
	}

	#[test]
	fn id_parse_rejects_garbage() {
		assert!(ProjectId::parse("not-a-uuid").is_err());
	}

	#[test]
	fn id_serializes_transparently() {
		let id = RecordId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
	}

	#[test]
	fn role_ladder() {
		assert!(Role::Admin.has_permission_of(&Role::Manager));
		assert!(Role::Manager.has_permission_of(&Role::User));
		assert!(!Role::Manager.has_permission_of(&Role::Admin));
		assert!(!Role::User.has_permission_of(&Role::Manager));
	}

	#[test]
	fn role_parses_case_insensitively() {
		assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
		assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
		assert_eq!("user".parse::<Role>().unwrap(), Role::User);
	}

	#[test]
	fn unknown_role_is_rejected() {
		assert!("owner".parse::<Role>().is_err());
		assert!("".parse::<Role>().is_err());
	}

	#[test]
	fn only_admin_and_manager_see_all_projects() {
		assert!(Role::Admin.sees_all_projects());
		assert!(Role::Manager.sees_all_projects());
		assert!(!Role::User.sees_all_projects());
	}
}

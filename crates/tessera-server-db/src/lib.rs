// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant-scoped storage for Tessera.
//!
//! All tenant data is reached through a [`RequestScope`], which only
//! [`ScopeResolver::resolve`] can produce. Repositories bound every query by
//! the scope's tenant (and project, for project-scoped types), run the access
//! policy, and enforce natural-key uniqueness and referential integrity inside
//! a single write transaction.

pub mod entity;
pub mod error;
pub mod identity;
pub mod member;
pub mod pool;
pub mod project;
pub mod records;
pub mod referential;
pub mod repository;
mod row;
pub mod schema;
pub mod scope;
pub mod session;
pub mod tenant;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod uniqueness;
pub mod validation;

pub use entity::{
	Column, ColumnType, EntityRef, FieldValue, ForeignRef, KeyScope, NaturalKey, Record,
	RecordMeta, Referrer, ScopeLevel, ScopedEntity,
};
pub use error::{DbError, Result, ScopeError};
pub use identity::IdentityResolver;
pub use member::{Member, MemberRepository, NewMember};
pub use pool::create_pool;
pub use project::{Project, ProjectInput, ProjectRepository};
pub use records::{
	BiodiversityResource, Document, IncidentReport, RiskIdentification, RiskScreening,
	Stakeholder, Subproject, TrainingLog, PROJECT_REFERRERS,
};
pub use repository::{ListFilter, ScopedRepository, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use schema::run_migrations;
pub use scope::{RequestScope, ScopeParams, ScopeResolver, TenantContext};
pub use session::{Session, SessionRepository, SessionStore};
pub use tenant::{Onboarding, Tenant, TenantRepository};

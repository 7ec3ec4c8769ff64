// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity types and the authorization policy for Tessera.
//!
//! This crate is storage-free: everything needed to answer "may this subject
//! do this?" is passed in. Loading subjects and targets is the job of
//! `tessera-server-db`.

pub mod identity;
pub mod policy;
pub mod session;
pub mod types;

pub use identity::{Identity, Principal, SubjectAttrs};
pub use policy::{authorize, is_allowed, Action, Decision, DenyReason, Target, TargetKind};
pub use session::{generate_session_token, hash_token, session_expiry};
pub use types::{ProjectId, RecordId, Role, SessionId, TenantId, UnrecognizedRole, UserId};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant/project authorization policy.
//!
//! See [`engine::authorize`] for the decision table.

pub mod engine;
pub mod types;

pub use engine::{authorize, is_allowed};
pub use types::{Action, Decision, DenyReason, Target, TargetKind};

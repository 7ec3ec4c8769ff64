// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as produced by a single source.

use serde::Deserialize;

use crate::sections::{AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Unset sections stay `None` so a
/// later source only overrides what it actually provides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(slot: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (slot.as_mut(), other) {
		(Some(current), Some(other)) => merge(current, other),
		(None, Some(other)) => *slot = Some(other),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

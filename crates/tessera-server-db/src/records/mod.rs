// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compliance record types.
//!
//! | Type | Scope | Natural key | Referenced by |
//! |---|---|---|---|
//! | [`BiodiversityResource`] | tenant | `reference` per tenant | risk identifications |
//! | [`RiskIdentification`] | project | none | none |
//! | [`Subproject`] | project | `name` per project | risk screenings |
//! | [`RiskScreening`] | project | `risk_category` per subproject | none |
//! | [`IncidentReport`] | project | none | none |
//! | [`Stakeholder`] | project | `name` per project | none |
//! | [`Document`] | tenant | `code` per tenant | training logs |
//! | [`TrainingLog`] | project | none | none |
//!
//! Projects themselves are referenced by every project-scoped type; see
//! [`PROJECT_REFERRERS`].

mod document;
mod incident;
mod resource;
mod screening;
mod stakeholder;

pub use document::{Document, TrainingLog};
pub use incident::{IncidentReport, INCIDENT_SEVERITIES};
pub use resource::{BiodiversityResource, RiskIdentification};
pub use screening::{RiskScreening, Subproject};
pub use stakeholder::Stakeholder;

use crate::entity::{Referrer, ScopedEntity};

macro_rules! project_referrer {
	($ty:ty) => {
		Referrer {
			kind: <$ty>::KIND,
			table: <$ty>::TABLE,
			column: "project_id",
		}
	};
}

/// Every record table that holds a `project_id`.
pub const PROJECT_REFERRERS: &[Referrer] = &[
	project_referrer!(RiskIdentification),
	project_referrer!(Subproject),
	project_referrer!(RiskScreening),
	project_referrer!(IncidentReport),
	project_referrer!(Stakeholder),
	project_referrer!(TrainingLog),
];

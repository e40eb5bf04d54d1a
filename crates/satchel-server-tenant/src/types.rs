// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifier and role types for the tenant domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

define_id_type!(InstitutionId, "Unique identifier for an institution (tenant).");
define_id_type!(
	IdentityId,
	"Unique identifier for an authentication identity. Doubles as the profile key."
);
define_id_type!(OrderId, "Unique identifier for a payment order.");

// =============================================================================
// Profile Roles
// =============================================================================

/// Role a profile holds within the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
	/// Platform-wide administration, not bound to a single institution.
	SuperAdmin,
	/// Administrator of one institution. Must reference an institution.
	Admin,
	/// Learner account, optionally bound to an institution.
	Student,
}

impl ProfileRole {
	/// Returns all available profile roles.
	pub fn all() -> &'static [ProfileRole] {
		&[ProfileRole::SuperAdmin, ProfileRole::Admin, ProfileRole::Student]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ProfileRole::SuperAdmin => "super_admin",
			ProfileRole::Admin => "admin",
			ProfileRole::Student => "student",
		}
	}

	/// Returns true if a profile with this role must be bound to an institution.
	pub fn requires_institution(&self) -> bool {
		matches!(self, ProfileRole::Admin)
	}
}

impl fmt::Display for ProfileRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for ProfileRole {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"super_admin" => Ok(ProfileRole::SuperAdmin),
			"admin" => Ok(ProfileRole::Admin),
			"student" => Ok(ProfileRole::Student),
			_ => Err(format!("unknown profile role: {s}")),
		}
	}
}

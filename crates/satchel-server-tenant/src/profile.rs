// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Profile and identity entities.
//!
//! This module provides:
//! - [`Profile`] - binds an identity to an institution with a role
//! - [`IdentityRecord`] - a stored authentication identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{IdentityId, InstitutionId, ProfileRole};

/// A user profile, keyed by the identity that owns it.
///
/// Invariant: a profile with [`ProfileRole::Admin`] always references an
/// institution; referential integrity is enforced by the application, not
/// the stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
	pub user_id: IdentityId,
	pub email: String,
	pub full_name: String,
	pub role: ProfileRole,
	pub institution_id: Option<InstitutionId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Profile {
	/// Create an administrator profile bound to an institution.
	pub fn new_admin(
		user_id: IdentityId,
		email: impl Into<String>,
		full_name: impl Into<String>,
		institution_id: InstitutionId,
	) -> Self {
		let now = Utc::now();
		Self {
			user_id,
			email: email.into(),
			full_name: full_name.into(),
			role: ProfileRole::Admin,
			institution_id: Some(institution_id),
			created_at: now,
			updated_at: now,
		}
	}

	/// Create a student profile, not yet bound to an institution.
	pub fn new_student(
		user_id: IdentityId,
		email: impl Into<String>,
		full_name: impl Into<String>,
	) -> Self {
		let now = Utc::now();
		Self {
			user_id,
			email: email.into(),
			full_name: full_name.into(),
			role: ProfileRole::Student,
			institution_id: None,
			created_at: now,
			updated_at: now,
		}
	}
}

/// A stored authentication identity.
///
/// The raw credential never appears here; only its argon2 PHC hash is kept.
/// Not serializable so the hash cannot leak through a response payload.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
	pub id: IdentityId,
	pub email: String,
	pub credential_hash: String,
	pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
	/// Create a new identity record from an already-hashed credential.
	pub fn new(email: impl Into<String>, credential_hash: impl Into<String>) -> Self {
		Self {
			id: IdentityId::generate(),
			email: email.into(),
			credential_hash: credential_hash.into(),
			created_at: Utc::now(),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use satchel_server_db::DbError;

/// Errors that can occur during account provisioning.
///
/// These are the stable kinds callers branch on. Compensation failures are
/// never surfaced here; they are logged as orphan warnings and the
/// triggering step error is returned unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("email is already bound to an account")]
	DuplicateAccount,

	#[error("identity creation failed: {0}")]
	IdentityCreationFailed(DbError),

	#[error("institution creation failed: {0}")]
	InstitutionCreationFailed(DbError),

	#[error("profile creation failed: {0}")]
	ProfileCreationFailed(DbError),
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The public account-provisioning entry point.
//!
//! Validates the request shape, runs the saga once, and maps everything
//! into the stable [`ProvisioningError`] taxonomy. No retries happen here;
//! retry policy belongs to the caller.

use std::sync::Arc;

use satchel_server_db::{IdentityStore, InstitutionStore, ProfileStore};
use satchel_server_tenant::{check_credential_strength, is_valid_email};
use tracing::instrument;

use crate::error::ProvisioningError;
use crate::saga::{ProvisionInput, ProvisioningResult, ProvisioningSaga};

/// Composes validation with the provisioning saga.
pub struct AccountProvisioningService {
	saga: ProvisioningSaga,
}

impl AccountProvisioningService {
	/// Create the service over the given store handles.
	pub fn new(
		identities: Arc<dyn IdentityStore>,
		institutions: Arc<dyn InstitutionStore>,
		profiles: Arc<dyn ProfileStore>,
	) -> Self {
		Self {
			saga: ProvisioningSaga::new(identities, institutions, profiles),
		}
	}

	/// Provision an institution account.
	///
	/// # Errors
	/// - [`ProvisioningError::InvalidRequest`] for malformed input; nothing
	///   is created
	/// - [`ProvisioningError::DuplicateAccount`] if the email already has
	///   an identity
	/// - the step-failure kinds of [`ProvisioningError`], after the saga
	///   has attempted compensation
	// Note: request contents are intentionally not logged
	#[instrument(skip(self, input))]
	pub async fn provision_account(
		&self,
		input: ProvisionInput,
	) -> Result<ProvisioningResult, ProvisioningError> {
		validate(&input)?;
		self.saga.provision(&input).await
	}
}

fn validate(input: &ProvisionInput) -> Result<(), ProvisioningError> {
	if input.institution_name.trim().is_empty() {
		return Err(ProvisioningError::InvalidRequest(
			"institution name must not be empty".to_string(),
		));
	}
	if input.admin_full_name.trim().is_empty() {
		return Err(ProvisioningError::InvalidRequest(
			"admin full name must not be empty".to_string(),
		));
	}
	// The address itself is deliberately kept out of the error message.
	if !is_valid_email(&input.admin_email) {
		return Err(ProvisioningError::InvalidRequest(
			"admin email is not a valid address".to_string(),
		));
	}
	check_credential_strength(&input.admin_credential)
		.map_err(|e| ProvisioningError::InvalidRequest(e.to_string()))?;
	Ok(())
}

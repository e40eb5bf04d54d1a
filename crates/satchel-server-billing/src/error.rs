// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for subscription activation.

use satchel_server_db::DbError;
use satchel_server_tenant::{InstitutionId, TransitionError};
use thiserror::Error;

/// Errors that can occur when interacting with the remote billing endpoint.
#[derive(Debug, Error)]
pub enum BillingApiError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// The endpoint rejected our credentials.
	#[error("Unauthorized")]
	Unauthorized,

	/// Invalid or unparseable response from the billing endpoint.
	#[error("Invalid response from billing endpoint: {0}")]
	InvalidResponse(String),

	/// The billing endpoint returned an error status.
	#[error("Billing API error: {status} - {message}")]
	ApiError { status: u16, message: String },
}

/// Errors surfaced by the subscription activator.
///
/// These are the stable kinds callers branch on; raw store and API errors
/// never cross this boundary unclassified.
#[derive(Debug, Error)]
pub enum ActivationError {
	/// The requested transition is not in the legal-transition table.
	/// A programming or data error; retrying will not help.
	#[error(transparent)]
	IllegalTransition(#[from] TransitionError),

	/// Both the primary remote path and the fallback direct write failed.
	/// State is unchanged; the caller may retry under its own policy.
	#[error("activation failed for institution {institution_id}")]
	ActivationFailed { institution_id: InstitutionId },

	/// No institution exists with this ID.
	#[error("institution not found: {0}")]
	InstitutionNotFound(InstitutionId),

	/// The status read preceding the transition failed.
	#[error("store error: {0}")]
	Store(#[from] DbError),
}

/// Errors verifying or parsing a payment-confirmation webhook.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
	#[error("missing signature header")]
	MissingSignature,

	#[error("signature verification failed")]
	InvalidSignature,

	#[error("invalid payload: {0}")]
	InvalidPayload(String),
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The subscription activator.
//!
//! Activation runs in a fixed order:
//!
//! 1. Idempotency check - an institution that is already `Active` returns
//!    success without any side effect, so duplicate webhook delivery never
//!    double-applies
//! 2. Transition check - a state the machine cannot legally leave for
//!    `Active` (e.g. `Cancelled`) is rejected before anything is written
//! 3. Primary path - the remote billing endpoint confirms the order and
//!    performs the activation on its side
//! 4. Fallback path - if the endpoint declines or is unreachable, a
//!    guarded direct write activates the subscription locally
//!
//! Exactly one of the two paths commits a write. The fallback is a
//! conditional UPDATE, so a racing activator that got there first turns
//! this call into a converged no-op rather than a second write.

use std::sync::Arc;

use chrono::{Duration, Utc};
use satchel_server_db::InstitutionStore;
use satchel_server_tenant::{InstitutionId, OrderId, SubscriptionStatus, TransitionError};
use tracing::{debug, instrument, warn};

use crate::client::{ActivationEndpoint, ActivationOutcome};
use crate::config::BillingConfig;
use crate::error::ActivationError;
use crate::webhook::ActivationRequest;

/// Drives the subscription state machine for payment events.
pub struct SubscriptionActivator {
	endpoint: Arc<dyn ActivationEndpoint>,
	institutions: Arc<dyn InstitutionStore>,
	term: Duration,
}

impl SubscriptionActivator {
	/// Create an activator over the given endpoint and store handles.
	pub fn new(
		endpoint: Arc<dyn ActivationEndpoint>,
		institutions: Arc<dyn InstitutionStore>,
		config: &BillingConfig,
	) -> Self {
		Self {
			endpoint,
			institutions,
			term: Duration::days(config.term_days),
		}
	}

	/// Activate an institution's subscription for a confirmed order.
	///
	/// Idempotent: repeated delivery of the same confirmation is a no-op
	/// once the institution is `Active`.
	///
	/// # Errors
	/// - [`ActivationError::InstitutionNotFound`] for an unknown institution
	/// - [`ActivationError::IllegalTransition`] if the current state cannot
	///   legally become `Active`
	/// - [`ActivationError::ActivationFailed`] if both paths failed; state
	///   is unchanged and the caller may retry
	#[instrument(skip(self), fields(order_id = %order_id, institution_id = %institution_id))]
	pub async fn activate(
		&self,
		order_id: &OrderId,
		institution_id: &InstitutionId,
	) -> Result<(), ActivationError> {
		let institution = self
			.institutions
			.get(institution_id)
			.await?
			.ok_or(ActivationError::InstitutionNotFound(*institution_id))?;

		let current = institution.subscription_status;
		if current == SubscriptionStatus::Active {
			debug!(institution_id = %institution_id, "already active, no-op");
			return Ok(());
		}
		current.ensure_transition(SubscriptionStatus::Active)?;

		// Primary path: the provider applies the activation on its side.
		// Its response decides whether the fallback runs at all.
		match self.endpoint.activate_order(order_id).await {
			Ok(ActivationOutcome::Activated) => {
				debug!(order_id = %order_id, "activation applied by billing provider");
				return Ok(());
			}
			Ok(ActivationOutcome::Failed { reason }) => {
				warn!(
					order_id = %order_id,
					reason = reason.as_deref().unwrap_or("unspecified"),
					"billing provider declined activation, falling back to direct write"
				);
			}
			Err(e) => {
				warn!(
					order_id = %order_id,
					error = %e,
					"billing provider unreachable, falling back to direct write"
				);
			}
		}

		// Fallback path: one guarded write.
		let start = Utc::now();
		let end = start + self.term;
		match self
			.institutions
			.activate_subscription(institution_id, start, end)
			.await
		{
			Ok(true) => {
				debug!(institution_id = %institution_id, "activation applied by direct write");
				Ok(())
			}
			Ok(false) => {
				// The guard matched no row: either another writer already
				// activated, or the state moved somewhere activation cannot
				// leave from. Re-read to tell the two apart.
				match self.institutions.get(institution_id).await? {
					Some(i) if i.subscription_status == SubscriptionStatus::Active => {
						debug!(institution_id = %institution_id, "activation already applied elsewhere");
						Ok(())
					}
					Some(i) => match i.subscription_status.ensure_transition(SubscriptionStatus::Active) {
						// Still legally activatable: the state moved under us
						// mid-call. Surface as retryable, not as a dead end.
						Ok(_) => Err(ActivationError::ActivationFailed {
							institution_id: *institution_id,
						}),
						Err(e) => Err(e.into()),
					},
					None => Err(ActivationError::InstitutionNotFound(*institution_id)),
				}
			}
			Err(e) => {
				warn!(institution_id = %institution_id, error = %e, "fallback direct write failed");
				Err(ActivationError::ActivationFailed {
					institution_id: *institution_id,
				})
			}
		}
	}

	/// Activate from a verified payment-confirmation webhook.
	#[instrument(skip(self, request))]
	pub async fn handle_confirmation(&self, request: &ActivationRequest) -> Result<(), ActivationError> {
		self.activate(&request.order_id, &request.institution_id).await
	}

	/// Expire an active subscription (time-based, externally triggered).
	#[instrument(skip(self), fields(institution_id = %institution_id))]
	pub async fn expire(&self, institution_id: &InstitutionId) -> Result<(), ActivationError> {
		self.transition(institution_id, SubscriptionStatus::Expired).await
	}

	/// Cancel a pending or active subscription. `Cancelled` is terminal.
	#[instrument(skip(self), fields(institution_id = %institution_id))]
	pub async fn cancel(&self, institution_id: &InstitutionId) -> Result<(), ActivationError> {
		self.transition(institution_id, SubscriptionStatus::Cancelled).await
	}

	async fn transition(
		&self,
		institution_id: &InstitutionId,
		to: SubscriptionStatus,
	) -> Result<(), ActivationError> {
		let institution = self
			.institutions
			.get(institution_id)
			.await?
			.ok_or(ActivationError::InstitutionNotFound(*institution_id))?;

		let from = institution.subscription_status;
		from.ensure_transition(to)?;

		if self
			.institutions
			.transition_subscription(institution_id, from, to)
			.await?
		{
			return Ok(());
		}

		// Guard mismatch: another writer moved the state first.
		match self.institutions.get(institution_id).await? {
			Some(i) if i.subscription_status == to => Ok(()),
			Some(i) => Err(TransitionError {
				from: i.subscription_status,
				to,
			}
			.into()),
			None => Err(ActivationError::InstitutionNotFound(*institution_id)),
		}
	}
}

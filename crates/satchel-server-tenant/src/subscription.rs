// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subscription lifecycle state machine.
//!
//! An institution's subscription moves through a small set of states:
//!
//! - A subscription starts as [`Pending`](SubscriptionStatus::Pending) at
//!   provisioning time and becomes billable only once payment is confirmed
//! - `Pending → Active` on confirmed payment
//! - `Active → Expired` on time-based expiry
//! - `Active → Cancelled` and `Pending → Cancelled` on cancellation
//! - `Expired → Active` on renewal
//! - `Cancelled` is terminal; re-subscription goes through a fresh
//!   provisioning flow
//!
//! Any transition not listed above is rejected with [`TransitionError`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing state of an institution's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
	/// Created but not yet paid for. Not billable.
	Pending,
	/// Paid and in service.
	Active,
	/// Previously active, lapsed on its end date. Renewable.
	Expired,
	/// Cancelled. Terminal.
	Cancelled,
}

/// A rejected subscription state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal subscription transition: {from} -> {to}")]
pub struct TransitionError {
	pub from: SubscriptionStatus,
	pub to: SubscriptionStatus,
}

impl SubscriptionStatus {
	/// Returns all subscription states.
	pub fn all() -> &'static [SubscriptionStatus] {
		&[
			SubscriptionStatus::Pending,
			SubscriptionStatus::Active,
			SubscriptionStatus::Expired,
			SubscriptionStatus::Cancelled,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SubscriptionStatus::Pending => "pending",
			SubscriptionStatus::Active => "active",
			SubscriptionStatus::Expired => "expired",
			SubscriptionStatus::Cancelled => "cancelled",
		}
	}

	/// Returns true if the institution is currently billable.
	pub fn is_billable(&self) -> bool {
		matches!(self, SubscriptionStatus::Active)
	}

	/// Returns true if moving from `self` to `next` is a legal transition.
	pub fn can_transition_to(self, next: SubscriptionStatus) -> bool {
		use SubscriptionStatus::*;
		matches!(
			(self, next),
			(Pending, Active)
				| (Active, Expired)
				| (Active, Cancelled)
				| (Pending, Cancelled)
				| (Expired, Active)
		)
	}

	/// Validates a transition, returning the target state or [`TransitionError`].
	pub fn ensure_transition(self, next: SubscriptionStatus) -> Result<SubscriptionStatus, TransitionError> {
		if self.can_transition_to(next) {
			Ok(next)
		} else {
			Err(TransitionError { from: self, to: next })
		}
	}
}

impl fmt::Display for SubscriptionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for SubscriptionStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(SubscriptionStatus::Pending),
			"active" => Ok(SubscriptionStatus::Active),
			"expired" => Ok(SubscriptionStatus::Expired),
			"cancelled" => Ok(SubscriptionStatus::Cancelled),
			_ => Err(format!("unknown subscription status: {s}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn pending_activates() {
		assert!(SubscriptionStatus::Pending.can_transition_to(SubscriptionStatus::Active));
	}

	#[test]
	fn expired_renews() {
		assert!(SubscriptionStatus::Expired.can_transition_to(SubscriptionStatus::Active));
	}

	#[test]
	fn active_expires_and_cancels() {
		assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Expired));
		assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Cancelled));
	}

	#[test]
	fn pending_cancels() {
		assert!(SubscriptionStatus::Pending.can_transition_to(SubscriptionStatus::Cancelled));
	}

	#[test]
	fn cancelled_is_terminal() {
		for next in SubscriptionStatus::all() {
			assert!(!SubscriptionStatus::Cancelled.can_transition_to(*next));
		}
	}

	#[test]
	fn self_transitions_are_rejected() {
		for status in SubscriptionStatus::all() {
			assert!(!status.can_transition_to(*status));
		}
	}

	#[test]
	fn ensure_transition_reports_endpoints() {
		let err = SubscriptionStatus::Cancelled
			.ensure_transition(SubscriptionStatus::Active)
			.unwrap_err();
		assert_eq!(err.from, SubscriptionStatus::Cancelled);
		assert_eq!(err.to, SubscriptionStatus::Active);
	}

	#[test]
	fn only_active_is_billable() {
		assert!(SubscriptionStatus::Active.is_billable());
		assert!(!SubscriptionStatus::Pending.is_billable());
		assert!(!SubscriptionStatus::Expired.is_billable());
		assert!(!SubscriptionStatus::Cancelled.is_billable());
	}

	#[test]
	fn display_parses_back() {
		for status in SubscriptionStatus::all() {
			let parsed = SubscriptionStatus::from_str(status.as_str()).unwrap();
			assert_eq!(parsed, *status);
		}
	}

	#[test]
	fn serializes_snake_case() {
		let json = serde_json::to_string(&SubscriptionStatus::Pending).unwrap();
		assert_eq!(json, "\"pending\"");
	}

	#[test]
	fn unknown_status_fails_to_parse() {
		assert!(SubscriptionStatus::from_str("trial").is_err());
	}
}

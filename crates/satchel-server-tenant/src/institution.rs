// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The institution entity — the unit of subscription billing and tenancy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionStatus;
use crate::types::InstitutionId;

/// A tenant institution.
///
/// `subscription_status` starts at [`SubscriptionStatus::Pending`] at creation
/// and is mutated only through the subscription activator afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
	pub id: InstitutionId,
	pub name: String,
	pub contact_email: String,
	pub subscription_status: SubscriptionStatus,
	pub subscription_start: Option<DateTime<Utc>>,
	pub subscription_end: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Institution {
	/// Create a new institution with a pending subscription.
	pub fn new(name: impl Into<String>, contact_email: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: InstitutionId::generate(),
			name: name.into(),
			contact_email: contact_email.into(),
			subscription_status: SubscriptionStatus::Pending,
			subscription_start: None,
			subscription_end: None,
			created_at: now,
			updated_at: now,
		}
	}
}

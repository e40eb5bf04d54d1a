// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Billing configuration.

use serde::Deserialize;

/// Default subscription term granted on activation, in days.
pub const DEFAULT_TERM_DAYS: i64 = 365;

/// Default timeout for remote activation requests, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const DEFAULT_BASE_URL: &str = "https://billing.satchel.internal/api/v1";

/// Billing configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct BillingConfig {
	pub base_url: String,
	pub request_timeout_secs: u64,
	pub term_days: i64,
	pub webhook_secret: Option<String>,
}

impl Default for BillingConfig {
	fn default() -> Self {
		BillingConfigLayer::default().finalize(None)
	}
}

/// Billing configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub term_days: Option<i64>,
}

impl BillingConfigLayer {
	pub fn merge(&mut self, other: BillingConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.term_days.is_some() {
			self.term_days = other.term_days;
		}
	}

	pub fn finalize(self, webhook_secret: Option<String>) -> BillingConfig {
		BillingConfig {
			base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
			request_timeout_secs: self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			term_days: self.term_days.unwrap_or(DEFAULT_TERM_DAYS),
			webhook_secret,
		}
	}
}

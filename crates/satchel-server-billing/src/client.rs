// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Remote activation endpoint client.
//!
//! The billing provider confirms an order and, on success, performs the
//! subscription write on its side. The activator treats this client as the
//! primary path; a declined or unreachable endpoint triggers the fallback
//! direct write instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use satchel_server_tenant::OrderId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::BillingConfig;
use crate::error::BillingApiError;

/// Result of asking the billing provider to activate an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
	/// The provider confirmed the order and applied the activation.
	Activated,
	/// The provider declined the order.
	Failed { reason: Option<String> },
}

/// The remote activation endpoint, as a seam so tests can substitute fakes.
#[async_trait]
pub trait ActivationEndpoint: Send + Sync {
	async fn activate_order(&self, order_id: &OrderId) -> Result<ActivationOutcome, BillingApiError>;
}

/// HTTP client for the billing provider's activation endpoint.
#[derive(Debug, Clone)]
pub struct BillingClient {
	http_client: Client,
	base_url: String,
}

#[derive(Debug, Serialize)]
struct ActivateApiRequest {
	order_id: String,
}

#[derive(Debug, Deserialize)]
struct ActivateApiResponse {
	status: String,
	reason: Option<String>,
}

impl BillingClient {
	/// Creates a new billing client from resolved configuration.
	pub fn new(config: &BillingConfig) -> Self {
		let http_client = satchel_common_http::builder()
			.timeout(Duration::from_secs(config.request_timeout_secs))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			base_url: config.base_url.clone(),
		}
	}

	/// Sets a custom base URL for the API (useful for testing).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	fn activate_url(&self) -> String {
		format!("{}/activations", self.base_url.trim_end_matches('/'))
	}
}

#[async_trait]
impl ActivationEndpoint for BillingClient {
	#[instrument(skip(self), fields(order_id = %order_id))]
	async fn activate_order(&self, order_id: &OrderId) -> Result<ActivationOutcome, BillingApiError> {
		let api_request = ActivateApiRequest {
			order_id: order_id.to_string(),
		};

		let url = self.activate_url();
		debug!(url = %url, "Sending activation request to billing provider");

		let response = self
			.http_client
			.post(&url)
			.json(&api_request)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					error!("Activation request timed out");
					return BillingApiError::Timeout;
				}
				error!(error = %e, "Network error during activation request");
				BillingApiError::Network(e)
			})?;

		let status = response.status();
		debug!(status = %status, "Received response from billing provider");

		if !status.is_success() {
			let status_code = status.as_u16();
			let body = response.text().await.unwrap_or_default();

			if status_code == 401 || status_code == 403 {
				error!(status = status_code, "Unauthorized activation request");
				return Err(BillingApiError::Unauthorized);
			}

			error!(status = status_code, body = %body, "Billing API error");
			return Err(BillingApiError::ApiError {
				status: status_code,
				message: body,
			});
		}

		let body = response.text().await.map_err(|e| {
			error!(error = %e, "Failed to read response body");
			BillingApiError::Network(e)
		})?;

		let api_response: ActivateApiResponse = serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "Failed to parse billing response");
			BillingApiError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;

		match api_response.status.as_str() {
			"activated" => Ok(ActivationOutcome::Activated),
			"failed" => Ok(ActivationOutcome::Failed {
				reason: api_response.reason,
			}),
			other => Err(BillingApiError::InvalidResponse(format!(
				"unknown activation status: {other}"
			))),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Payment-confirmation webhook verification and parsing.
//!
//! Payment confirmations arrive with at-least-once delivery and an
//! HMAC-SHA256 signature over the raw payload. Verification happens before
//! parsing; an unsigned or tampered payload never reaches the activator.

use hmac::{Hmac, Mac};
use satchel_server_tenant::{InstitutionId, OrderId};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// A verified payment confirmation, ready to drive the activator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
	pub order_id: OrderId,
	pub institution_id: InstitutionId,
}

/// Compute an HMAC-SHA256 signature for a payload.
///
/// Returns the hex-encoded signature without any prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	let result = mac.finalize();
	hex::encode(result.into_bytes())
}

/// Verify an HMAC-SHA256 signature for a payload.
///
/// The `signature` should be the raw hex-encoded signature (no prefix).
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	let expected_bytes = match hex::decode(signature) {
		Ok(bytes) => bytes,
		Err(_) => return false,
	};

	let mut mac = match HmacSha256::new_from_slice(secret) {
		Ok(m) => m,
		Err(_) => return false,
	};

	mac.update(payload);
	mac.verify_slice(&expected_bytes).is_ok()
}

/// Verify a webhook signature and parse the confirmation payload.
///
/// # Errors
/// - [`WebhookError::MissingSignature`] if `signature` is `None`
/// - [`WebhookError::InvalidSignature`] if verification fails
/// - [`WebhookError::InvalidPayload`] if the body is not a confirmation
pub fn parse_confirmation(
	secret: &[u8],
	payload: &[u8],
	signature: Option<&str>,
) -> Result<ActivationRequest, WebhookError> {
	let signature = signature.ok_or(WebhookError::MissingSignature)?;
	if !verify_hmac_sha256(secret, payload, signature) {
		return Err(WebhookError::InvalidSignature);
	}
	serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn confirmation_payload() -> (ActivationRequest, Vec<u8>) {
		let request = ActivationRequest {
			order_id: OrderId::generate(),
			institution_id: InstitutionId::generate(),
		};
		let payload = serde_json::to_vec(&request).unwrap();
		(request, payload)
	}

	#[test]
	fn test_compute_hmac_sha256() {
		let sig = compute_hmac_sha256(b"test-secret", b"test payload");
		assert!(!sig.is_empty());
		assert_eq!(sig.len(), 64);
	}

	#[test]
	fn test_verify_hmac_sha256_valid() {
		let sig = compute_hmac_sha256(b"test-secret", b"test payload");
		assert!(verify_hmac_sha256(b"test-secret", b"test payload", &sig));
	}

	#[test]
	fn test_verify_hmac_sha256_invalid_hex() {
		assert!(!verify_hmac_sha256(b"test-secret", b"test payload", "not-valid-hex"));
	}

	#[test]
	fn test_verify_hmac_sha256_wrong_secret() {
		let sig = compute_hmac_sha256(b"test-secret", b"test payload");
		assert!(!verify_hmac_sha256(b"wrong-secret", b"test payload", &sig));
	}

	#[test]
	fn test_parse_confirmation_roundtrips() {
		let (request, payload) = confirmation_payload();
		let sig = compute_hmac_sha256(b"test-secret", &payload);

		let parsed = parse_confirmation(b"test-secret", &payload, Some(&sig)).unwrap();
		assert_eq!(parsed, request);
	}

	#[test]
	fn test_parse_confirmation_missing_signature() {
		let (_, payload) = confirmation_payload();
		assert_eq!(
			parse_confirmation(b"test-secret", &payload, None),
			Err(WebhookError::MissingSignature)
		);
	}

	#[test]
	fn test_parse_confirmation_tampered_payload() {
		let (_, payload) = confirmation_payload();
		let sig = compute_hmac_sha256(b"test-secret", &payload);
		let err = parse_confirmation(b"test-secret", b"{\"other\": true}", Some(&sig)).unwrap_err();
		assert_eq!(err, WebhookError::InvalidSignature);
	}

	#[test]
	fn test_parse_confirmation_bad_body_with_valid_signature() {
		let payload = b"{\"unexpected\": 1}";
		let sig = compute_hmac_sha256(b"test-secret", payload);
		let err = parse_confirmation(b"test-secret", payload, Some(&sig)).unwrap_err();
		assert!(matches!(err, WebhookError::InvalidPayload(_)));
	}
}

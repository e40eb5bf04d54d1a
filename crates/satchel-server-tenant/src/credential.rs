// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential handling: the zeroizing secret wrapper, the strength policy,
//! and argon2 hashing.
//!
//! # Security Note
//!
//! Raw credentials are wrapped in [`CredentialSecret`], which zeroizes its
//! memory on drop and redacts itself from `Debug` output. Only argon2 PHC
//! hashes are ever stored.
//!
//! Production hashing uses Argon2id with strong defaults. Tests use
//! reduced-cost parameters that MUST NOT be used in production.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum accepted credential length.
pub const MIN_CREDENTIAL_LENGTH: usize = 8;

/// A raw login credential.
///
/// Never logged, never serialized, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSecret(String);

impl CredentialSecret {
	/// Wrap a raw credential.
	pub fn new(secret: impl Into<String>) -> Self {
		Self(secret.into())
	}

	/// Expose the raw credential for hashing or verification.
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for CredentialSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CredentialSecret([REDACTED])")
	}
}

/// A credential rejected by the strength policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialPolicyError {
	#[error("credential must be at least {MIN_CREDENTIAL_LENGTH} characters")]
	TooShort,

	#[error("credential must contain at least one letter")]
	MissingLetter,

	#[error("credential must contain at least one digit")]
	MissingDigit,
}

/// Credential hashing failed.
#[derive(Debug, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct CredentialHashError(String);

/// Check a credential against the strength policy.
pub fn check_credential_strength(secret: &CredentialSecret) -> Result<(), CredentialPolicyError> {
	let raw = secret.expose();
	if raw.chars().count() < MIN_CREDENTIAL_LENGTH {
		return Err(CredentialPolicyError::TooShort);
	}
	if !raw.chars().any(|c| c.is_alphabetic()) {
		return Err(CredentialPolicyError::MissingLetter);
	}
	if !raw.chars().any(|c| c.is_ascii_digit()) {
		return Err(CredentialPolicyError::MissingDigit);
	}
	Ok(())
}

/// Hash a credential into an argon2 PHC string.
pub fn hash_credential(secret: &CredentialSecret) -> Result<String, CredentialHashError> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = argon2_instance()
		.hash_password(secret.expose().as_bytes(), &salt)
		.map_err(|e| CredentialHashError(e.to_string()))?;
	Ok(hash.to_string())
}

/// Verify a credential against a stored PHC hash.
///
/// An unparseable hash verifies as false rather than erroring; a corrupt
/// stored hash must never let a caller in.
pub fn verify_credential(secret: &CredentialSecret, credential_hash: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(credential_hash) else {
		return false;
	};
	argon2_instance()
		.verify_password(secret.expose().as_bytes(), &parsed)
		.is_ok()
}

/// Returns an Argon2 instance configured appropriately for the build context.
#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		// Fast, insecure parameters for tests ONLY.
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		// Production: Argon2id with memory=19456 KiB, iterations=2, parallelism=1
		Argon2::default()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Input validation helpers used at the service boundary.

/// Maximum accepted email length (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Syntactic email check: one `@`, non-empty local part, dotted domain,
/// no whitespace. Uniqueness is the identity store's job, not this one.
pub fn is_valid_email(email: &str) -> bool {
	if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
		return false;
	}
	if email.chars().any(char::is_whitespace) {
		return false;
	}
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	if local.is_empty() || domain.is_empty() {
		return false;
	}
	if domain.contains('@') {
		return false;
	}
	let Some((host, tld)) = domain.rsplit_once('.') else {
		return false;
	};
	!host.is_empty() && !tld.is_empty()
}

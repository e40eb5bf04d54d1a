// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant, identity and subscription domain types for Satchel.
//!
//! This crate holds the pure domain layer shared by the store, provisioning
//! and billing crates:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`InstitutionId`],
//!   [`IdentityId`], [`OrderId`]) preventing accidental mixing
//! - **Subscription state machine**: [`SubscriptionStatus`] and its
//!   legal-transition table
//! - **Entities**: [`Institution`], [`Profile`], [`IdentityRecord`]
//! - **Credentials**: [`CredentialSecret`] (zeroizing, never logged),
//!   strength policy and argon2 hashing
//! - **Validation**: email syntax checks used at the service boundary
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

pub mod credential;
pub mod institution;
pub mod profile;
pub mod subscription;
pub mod types;
pub mod validate;

pub use credential::{
	check_credential_strength, hash_credential, verify_credential, CredentialHashError,
	CredentialPolicyError, CredentialSecret,
};
pub use institution::Institution;
pub use profile::{IdentityRecord, Profile};
pub use subscription::{SubscriptionStatus, TransitionError};
pub use types::{IdentityId, InstitutionId, OrderId, ProfileRole};
pub use validate::is_valid_email;

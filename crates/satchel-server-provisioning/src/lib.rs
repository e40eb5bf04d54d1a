// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Institution account provisioning for Satchel.
//!
//! Provisioning creates an admin identity, an institution and a linked
//! profile across three stores that offer no shared transaction. This
//! crate provides:
//!
//! - [`ProvisioningSaga`] - the ordered three-step creation with
//!   enumerated compensations, unwound in reverse on failure
//! - [`AccountProvisioningService`] - the public entry point: input
//!   validation, saga invocation, stable error taxonomy
//!
//! Error payloads carry opaque identifiers only; email addresses never
//! appear in errors or trace fields.

pub mod error;
pub mod saga;
pub mod service;

pub use error::ProvisioningError;
pub use saga::{ProvisionInput, ProvisioningResult, ProvisioningSaga};
pub use service::AccountProvisioningService;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subscription activation for Satchel.
//!
//! This crate drives the subscription state machine once payment is
//! confirmed:
//!
//! - [`SubscriptionActivator`] - idempotent activation with a primary
//!   remote path and a fallback direct write, plus the expiry and
//!   cancellation legs of the state machine
//! - [`BillingClient`] - client for the remote activation endpoint
//! - [`BillingConfig`] - layered billing configuration
//! - [`webhook`] - HMAC-SHA256 verification and parsing of
//!   payment-confirmation payloads

pub mod activator;
pub mod client;
pub mod config;
pub mod error;
pub mod webhook;

pub use activator::SubscriptionActivator;
pub use client::{ActivationEndpoint, ActivationOutcome, BillingClient};
pub use config::{BillingConfig, BillingConfigLayer};
pub use error::{ActivationError, BillingApiError, WebhookError};
pub use webhook::ActivationRequest;

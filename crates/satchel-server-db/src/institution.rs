// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Institution repository for database operations.
//!
//! This module provides database access for tenant management including:
//! - Institution create/read/delete
//! - Guarded subscription-state writes
//!
//! Subscription transitions are conditional UPDATEs checked with
//! `rows_affected()`, so duplicate activations and racing writers resolve
//! at the database rather than in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use satchel_server_tenant::{Institution, InstitutionId, SubscriptionStatus};
use sqlx::{sqlite::SqlitePool, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait InstitutionStore: Send + Sync {
	/// Create a new institution.
	async fn create(&self, institution: &Institution) -> Result<(), DbError>;

	/// Get an institution by ID, including its current subscription status.
	async fn get(&self, id: &InstitutionId) -> Result<Option<Institution>, DbError>;

	/// Delete an institution. Used only as saga compensation.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if no institution exists with this ID.
	async fn delete(&self, id: &InstitutionId) -> Result<(), DbError>;

	/// Activate the subscription and stamp its window, guarded on the
	/// current status being one activation can legally leave from.
	///
	/// Returns false if no row transitioned (already active, cancelled,
	/// or missing) — the caller decides what that means.
	async fn activate_subscription(
		&self,
		id: &InstitutionId,
		start: DateTime<Utc>,
		end: DateTime<Utc>,
	) -> Result<bool, DbError>;

	/// Move the subscription from `from` to `to`, guarded on the current
	/// status still being `from`.
	///
	/// Returns false if another writer got there first.
	async fn transition_subscription(
		&self,
		id: &InstitutionId,
		from: SubscriptionStatus,
		to: SubscriptionStatus,
	) -> Result<bool, DbError>;
}

/// SQLite-backed institution store.
#[derive(Clone)]
pub struct InstitutionRepository {
	pool: SqlitePool,
}

impl InstitutionRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_institution(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Institution, DbError> {
		let id_str: String = row.get("id");
		let status_str: String = row.get("subscription_status");
		let start: Option<String> = row.get("subscription_start");
		let end: Option<String> = row.get("subscription_end");
		let created_at: String = row.get("created_at");
		let updated_at: String = row.get("updated_at");

		let id = Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid institution ID: {e}")))?;
		let subscription_status = SubscriptionStatus::from_str(&status_str)
			.map_err(|e| DbError::Internal(format!("Invalid subscription_status: {e}")))?;

		Ok(Institution {
			id: InstitutionId::new(id),
			name: row.get("name"),
			contact_email: row.get("contact_email"),
			subscription_status,
			subscription_start: start.and_then(|d| {
				chrono::DateTime::parse_from_rfc3339(&d)
					.map(|dt| dt.with_timezone(&Utc))
					.ok()
			}),
			subscription_end: end.and_then(|d| {
				chrono::DateTime::parse_from_rfc3339(&d)
					.map(|dt| dt.with_timezone(&Utc))
					.ok()
			}),
			created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
				.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
				.with_timezone(&Utc),
			updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
				.map_err(|e| DbError::Internal(format!("Invalid updated_at: {e}")))?
				.with_timezone(&Utc),
		})
	}
}

#[async_trait]
impl InstitutionStore for InstitutionRepository {
	#[tracing::instrument(skip(self, institution), fields(institution_id = %institution.id))]
	async fn create(&self, institution: &Institution) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO institutions (
				id, name, contact_email, subscription_status,
				subscription_start, subscription_end, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(institution.id.to_string())
		.bind(&institution.name)
		.bind(&institution.contact_email)
		.bind(institution.subscription_status.as_str())
		.bind(institution.subscription_start.map(|d| d.to_rfc3339()))
		.bind(institution.subscription_end.map(|d| d.to_rfc3339()))
		.bind(institution.created_at.to_rfc3339())
		.bind(institution.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(institution_id = %institution.id, "institution created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(institution_id = %id))]
	async fn get(&self, id: &InstitutionId) -> Result<Option<Institution>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, contact_email, subscription_status,
				subscription_start, subscription_end, created_at, updated_at
			FROM institutions
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_institution(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(institution_id = %id))]
	async fn delete(&self, id: &InstitutionId) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM institutions
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("institution {id}")));
		}

		tracing::debug!(institution_id = %id, "institution deleted");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(institution_id = %id))]
	async fn activate_subscription(
		&self,
		id: &InstitutionId,
		start: DateTime<Utc>,
		end: DateTime<Utc>,
	) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE institutions
			SET subscription_status = 'active',
				subscription_start = ?,
				subscription_end = ?,
				updated_at = ?
			WHERE id = ? AND subscription_status IN ('pending', 'expired')
			"#,
		)
		.bind(start.to_rfc3339())
		.bind(end.to_rfc3339())
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let activated = result.rows_affected() > 0;
		if activated {
			tracing::debug!(institution_id = %id, "subscription activated");
		}
		Ok(activated)
	}

	#[tracing::instrument(skip(self), fields(institution_id = %id, from = %from, to = %to))]
	async fn transition_subscription(
		&self,
		id: &InstitutionId,
		from: SubscriptionStatus,
		to: SubscriptionStatus,
	) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE institutions
			SET subscription_status = ?, updated_at = ?
			WHERE id = ? AND subscription_status = ?
			"#,
		)
		.bind(to.as_str())
		.bind(&now)
		.bind(id.to_string())
		.bind(from.as_str())
		.execute(&self.pool)
		.await?;

		let transitioned = result.rows_affected() > 0;
		if transitioned {
			tracing::debug!(institution_id = %id, from = %from, to = %to, "subscription transitioned");
		}
		Ok(transitioned)
	}
}

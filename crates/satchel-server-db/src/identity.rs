// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity repository for database operations.
//!
//! Identities are the store of record for email uniqueness: concurrent
//! provisioning of the same email is serialized by the UNIQUE constraint
//! here, not by an in-process lock.

use async_trait::async_trait;
use chrono::Utc;
use satchel_server_tenant::{
	hash_credential, verify_credential, CredentialSecret, IdentityId, IdentityRecord,
};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait IdentityStore: Send + Sync {
	/// Create an identity for `email`. The credential is hashed before
	/// storage; the raw secret never reaches the database.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the email is already bound.
	async fn create(&self, email: &str, credential: &CredentialSecret)
		-> Result<IdentityId, DbError>;

	/// Delete an identity. Used only as saga compensation.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if no identity exists with this ID.
	async fn delete(&self, id: &IdentityId) -> Result<(), DbError>;

	/// Look up an identity by email.
	async fn get_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, DbError>;

	/// Verify a credential against the stored hash for `email`.
	///
	/// Returns false for unknown emails; callers cannot distinguish a
	/// missing account from a wrong credential.
	async fn verify_credential(
		&self,
		email: &str,
		credential: &CredentialSecret,
	) -> Result<bool, DbError>;
}

/// SQLite-backed identity store.
#[derive(Clone)]
pub struct IdentityRepository {
	pool: SqlitePool,
}

impl IdentityRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_identity(&self, row: &sqlx::sqlite::SqliteRow) -> Result<IdentityRecord, DbError> {
		let id_str: String = row.get("id");
		let created_at: String = row.get("created_at");

		let id = Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid identity ID: {e}")))?;

		Ok(IdentityRecord {
			id: IdentityId::new(id),
			email: row.get("email"),
			credential_hash: row.get("credential_hash"),
			created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
				.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
				.with_timezone(&Utc),
		})
	}
}

#[async_trait]
impl IdentityStore for IdentityRepository {
	// Note: email and credential are intentionally not logged
	#[tracing::instrument(skip(self, email, credential))]
	async fn create(
		&self,
		email: &str,
		credential: &CredentialSecret,
	) -> Result<IdentityId, DbError> {
		let credential_hash =
			hash_credential(credential).map_err(|e| DbError::Internal(e.to_string()))?;
		let record = IdentityRecord::new(email, credential_hash);

		sqlx::query(
			r#"
			INSERT INTO identities (id, email, credential_hash, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(record.id.to_string())
		.bind(&record.email)
		.bind(&record.credential_hash)
		.bind(record.created_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_insert(e, "email already bound to an identity"))?;

		tracing::debug!(identity_id = %record.id, "identity created");
		Ok(record.id)
	}

	#[tracing::instrument(skip(self), fields(identity_id = %id))]
	async fn delete(&self, id: &IdentityId) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM identities
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("identity {id}")));
		}

		tracing::debug!(identity_id = %id, "identity deleted");
		Ok(())
	}

	#[tracing::instrument(skip(self, email))]
	async fn get_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, credential_hash, created_at
			FROM identities
			WHERE email = ?
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_identity(&r)).transpose()
	}

	#[tracing::instrument(skip(self, email, credential))]
	async fn verify_credential(
		&self,
		email: &str,
		credential: &CredentialSecret,
	) -> Result<bool, DbError> {
		let Some(record) = self.get_by_email(email).await? else {
			return Ok(false);
		};
		Ok(verify_credential(credential, &record.credential_hash))
	}
}

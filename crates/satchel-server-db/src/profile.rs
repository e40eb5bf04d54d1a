// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Profile repository for database operations.

use async_trait::async_trait;
use chrono::Utc;
use satchel_server_tenant::{IdentityId, InstitutionId, Profile, ProfileRole};
use sqlx::{sqlite::SqlitePool, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait ProfileStore: Send + Sync {
	/// Insert or update a profile, keyed on `user_id`.
	async fn upsert(&self, profile: &Profile) -> Result<(), DbError>;

	/// Get a profile by its owning identity.
	async fn get(&self, user_id: &IdentityId) -> Result<Option<Profile>, DbError>;
}

/// SQLite-backed profile store.
#[derive(Clone)]
pub struct ProfileRepository {
	pool: SqlitePool,
}

impl ProfileRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_profile(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Profile, DbError> {
		let user_id_str: String = row.get("user_id");
		let role_str: String = row.get("role");
		let institution_id_str: Option<String> = row.get("institution_id");
		let created_at: String = row.get("created_at");
		let updated_at: String = row.get("updated_at");

		let user_id = Uuid::parse_str(&user_id_str)
			.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?;
		let role = ProfileRole::from_str(&role_str)
			.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))?;
		let institution_id = institution_id_str
			.map(|s| {
				Uuid::parse_str(&s)
					.map(InstitutionId::new)
					.map_err(|e| DbError::Internal(format!("Invalid institution_id: {e}")))
			})
			.transpose()?;

		Ok(Profile {
			user_id: IdentityId::new(user_id),
			email: row.get("email"),
			full_name: row.get("full_name"),
			role,
			institution_id,
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
impl ProfileStore for ProfileRepository {
	// Note: email and full_name are intentionally not logged
	#[tracing::instrument(skip(self, profile), fields(user_id = %profile.user_id, role = %profile.role))]
	async fn upsert(&self, profile: &Profile) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			INSERT INTO profiles (user_id, email, full_name, role, institution_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(user_id) DO UPDATE SET
				email = excluded.email,
				full_name = excluded.full_name,
				role = excluded.role,
				institution_id = excluded.institution_id,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(profile.user_id.to_string())
		.bind(&profile.email)
		.bind(&profile.full_name)
		.bind(profile.role.as_str())
		.bind(profile.institution_id.map(|id| id.to_string()))
		.bind(profile.created_at.to_rfc3339())
		.bind(&now)
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %profile.user_id, role = %profile.role, "profile upserted");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	async fn get(&self, user_id: &IdentityId) -> Result<Option<Profile>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT user_id, email, full_name, role, institution_id, created_at, updated_at
			FROM profiles
			WHERE user_id = ?
			"#,
		)
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_profile(&r)).transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_profiles_table, create_test_pool};

	async fn make_repo() -> ProfileRepository {
		let pool = create_test_pool().await;
		create_profiles_table(&pool).await;
		ProfileRepository::new(pool)
	}

	#[tokio::test]
	async fn upsert_and_get_admin_profile() {
		let repo = make_repo().await;
		let institution_id = InstitutionId::generate();
		let profile = Profile::new_admin(
			IdentityId::generate(),
			"admin@test.edu",
			"Ada Admin",
			institution_id,
		);

		repo.upsert(&profile).await.unwrap();

		let fetched = repo.get(&profile.user_id).await.unwrap().unwrap();
		assert_eq!(fetched.user_id, profile.user_id);
		assert_eq!(fetched.role, ProfileRole::Admin);
		assert_eq!(fetched.institution_id, Some(institution_id));
	}

	#[tokio::test]
	async fn get_unknown_returns_none() {
		let repo = make_repo().await;
		assert!(repo.get(&IdentityId::generate()).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn upsert_replaces_on_conflict() {
		let repo = make_repo().await;
		let user_id = IdentityId::generate();
		let student = Profile::new_student(user_id, "kid@test.edu", "Kay Kid");
		repo.upsert(&student).await.unwrap();

		let institution_id = InstitutionId::generate();
		let admin = Profile::new_admin(user_id, "kid@test.edu", "Kay Kid", institution_id);
		repo.upsert(&admin).await.unwrap();

		let fetched = repo.get(&user_id).await.unwrap().unwrap();
		assert_eq!(fetched.role, ProfileRole::Admin);
		assert_eq!(fetched.institution_id, Some(institution_id));
	}

	#[tokio::test]
	async fn student_profile_stores_null_institution() {
		let repo = make_repo().await;
		let profile = Profile::new_student(IdentityId::generate(), "kid@test.edu", "Kay Kid");
		repo.upsert(&profile).await.unwrap();

		let fetched = repo.get(&profile.user_id).await.unwrap().unwrap();
		assert_eq!(fetched.role, ProfileRole::Student);
		assert!(fetched.institution_id.is_none());
	}
}

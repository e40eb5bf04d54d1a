// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The provisioning saga.
//!
//! Creation order is identity → institution → profile; each step depends
//! on the previous step's output. Every committed step pushes a named
//! compensation onto a stack, and a failed step unwinds that stack in
//! reverse creation order before returning the step's error.
//!
//! Compensation is best-effort: if a compensating delete itself fails, the
//! orphan is logged with its opaque ID and the original error is still the
//! one surfaced. A store that is down during compensation can therefore
//! leave a record behind; this is a stated limitation, not a silent one.

use std::sync::Arc;

use futures::future::BoxFuture;
use satchel_server_db::{DbError, IdentityStore, InstitutionStore, ProfileStore};
use satchel_server_tenant::{
	CredentialSecret, IdentityId, Institution, InstitutionId, Profile, SubscriptionStatus,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::ProvisioningError;

/// Input to one provisioning run.
pub struct ProvisionInput {
	pub institution_name: String,
	pub admin_email: String,
	pub admin_full_name: String,
	pub admin_credential: CredentialSecret,
}

/// What a successful provisioning run hands back to the caller.
///
/// Ephemeral; never persisted. The credential is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProvisioningResult {
	pub institution_id: InstitutionId,
	pub admin_identity_id: IdentityId,
	pub subscription_status: SubscriptionStatus,
}

type CompensationFuture = BoxFuture<'static, Result<(), DbError>>;

/// The stack of compensations for steps that have committed so far.
///
/// Pushed in creation order, unwound in reverse.
struct Compensations {
	stack: Vec<(&'static str, String, CompensationFuture)>,
}

impl Compensations {
	fn new() -> Self {
		Self { stack: Vec::new() }
	}

	fn push(&mut self, step: &'static str, entity_id: String, action: CompensationFuture) {
		self.stack.push((step, entity_id, action));
	}

	/// Run every compensation, newest first. Failures become orphan
	/// warnings; they never replace the error that triggered the unwind.
	async fn unwind(self) {
		for (step, entity_id, action) in self.stack.into_iter().rev() {
			match action.await {
				Ok(()) => debug!(step, entity = %entity_id, "compensation applied"),
				Err(e) => {
					warn!(step, entity = %entity_id, error = %e, "compensation failed, orphan record may remain");
				}
			}
		}
	}
}

/// Creates one identity, one institution and one profile as a single
/// logical unit of work, or compensates so none of them durably remain.
pub struct ProvisioningSaga {
	identities: Arc<dyn IdentityStore>,
	institutions: Arc<dyn InstitutionStore>,
	profiles: Arc<dyn ProfileStore>,
}

impl ProvisioningSaga {
	/// Create a saga over the given store handles.
	pub fn new(
		identities: Arc<dyn IdentityStore>,
		institutions: Arc<dyn InstitutionStore>,
		profiles: Arc<dyn ProfileStore>,
	) -> Self {
		Self {
			identities,
			institutions,
			profiles,
		}
	}

	/// Run the saga.
	///
	/// On success all three records exist and are mutually consistent; on
	/// failure the committed prefix has been compensated in reverse order.
	/// A second run for an email that already has an identity fails fast
	/// with [`ProvisioningError::DuplicateAccount`].
	// Note: the email, name and credential are intentionally not logged
	#[instrument(skip(self, input))]
	pub async fn provision(&self, input: &ProvisionInput) -> Result<ProvisioningResult, ProvisioningError> {
		// Advisory duplicate check. A race past this point is caught by the
		// identity store's uniqueness constraint below.
		match self.identities.get_by_email(&input.admin_email).await {
			Ok(Some(_)) => return Err(ProvisioningError::DuplicateAccount),
			Ok(None) => {}
			Err(e) => return Err(ProvisioningError::IdentityCreationFailed(e)),
		}

		let mut compensations = Compensations::new();

		// Step 1: identity. Nothing committed yet, so no compensation runs
		// on failure.
		let admin_identity_id = match self
			.identities
			.create(&input.admin_email, &input.admin_credential)
			.await
		{
			Ok(id) => id,
			Err(e) if e.is_conflict() => return Err(ProvisioningError::DuplicateAccount),
			Err(e) => return Err(ProvisioningError::IdentityCreationFailed(e)),
		};
		{
			let identities = Arc::clone(&self.identities);
			compensations.push(
				"identity",
				admin_identity_id.to_string(),
				Box::pin(async move { identities.delete(&admin_identity_id).await }),
			);
		}

		// Step 2: institution, starting out pending.
		let institution = Institution::new(
			input.institution_name.as_str(),
			input.admin_email.as_str(),
		);
		let institution_id = institution.id;
		if let Err(e) = self.institutions.create(&institution).await {
			compensations.unwind().await;
			return Err(ProvisioningError::InstitutionCreationFailed(e));
		}
		{
			let institutions = Arc::clone(&self.institutions);
			compensations.push(
				"institution",
				institution_id.to_string(),
				Box::pin(async move { institutions.delete(&institution_id).await }),
			);
		}

		// Step 3: profile, binding the identity to the institution.
		let profile = Profile::new_admin(
			admin_identity_id,
			input.admin_email.as_str(),
			input.admin_full_name.as_str(),
			institution_id,
		);
		if let Err(e) = self.profiles.upsert(&profile).await {
			compensations.unwind().await;
			return Err(ProvisioningError::ProfileCreationFailed(e));
		}

		debug!(
			institution_id = %institution_id,
			admin_identity_id = %admin_identity_id,
			"account provisioned"
		);
		Ok(ProvisioningResult {
			institution_id,
			admin_identity_id,
			subscription_status: institution.subscription_status,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use satchel_server_db::testing::create_provisioning_test_pool;
	use satchel_server_db::{IdentityRepository, InstitutionRepository, ProfileRepository};
	use satchel_server_tenant::{IdentityRecord, ProfileRole};
	use sqlx::SqlitePool;

	fn input() -> ProvisionInput {
		ProvisionInput {
			institution_name: "Test School".to_string(),
			admin_email: "admin@test.edu".to_string(),
			admin_full_name: "Ada Admin".to_string(),
			admin_credential: CredentialSecret::new("Secret123!"),
		}
	}

	struct Repos {
		pool: SqlitePool,
		identities: Arc<IdentityRepository>,
		institutions: Arc<InstitutionRepository>,
		profiles: Arc<ProfileRepository>,
	}

	async fn make_repos() -> Repos {
		let pool = create_provisioning_test_pool().await;
		Repos {
			identities: Arc::new(IdentityRepository::new(pool.clone())),
			institutions: Arc::new(InstitutionRepository::new(pool.clone())),
			profiles: Arc::new(ProfileRepository::new(pool.clone())),
			pool,
		}
	}

	async fn count(pool: &SqlitePool, table: &str) -> i64 {
		let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
			.fetch_one(pool)
			.await
			.unwrap();
		row.0
	}

	/// Identity store that can be told to fail its operations.
	struct FailingIdentityStore {
		inner: IdentityRepository,
		fail_create: bool,
		fail_delete: bool,
	}

	#[async_trait]
	impl IdentityStore for FailingIdentityStore {
		async fn create(
			&self,
			email: &str,
			credential: &CredentialSecret,
		) -> Result<IdentityId, DbError> {
			if self.fail_create {
				return Err(DbError::Internal("identity store unavailable".to_string()));
			}
			self.inner.create(email, credential).await
		}

		async fn delete(&self, id: &IdentityId) -> Result<(), DbError> {
			if self.fail_delete {
				return Err(DbError::Internal("identity store unavailable".to_string()));
			}
			self.inner.delete(id).await
		}

		async fn get_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, DbError> {
			self.inner.get_by_email(email).await
		}

		async fn verify_credential(
			&self,
			email: &str,
			credential: &CredentialSecret,
		) -> Result<bool, DbError> {
			self.inner.verify_credential(email, credential).await
		}
	}

	/// Institution store that can be told to fail creation.
	struct FailingInstitutionStore {
		inner: InstitutionRepository,
		fail_create: bool,
	}

	#[async_trait]
	impl InstitutionStore for FailingInstitutionStore {
		async fn create(&self, institution: &Institution) -> Result<(), DbError> {
			if self.fail_create {
				return Err(DbError::Internal("institution store unavailable".to_string()));
			}
			self.inner.create(institution).await
		}

		async fn get(&self, id: &InstitutionId) -> Result<Option<Institution>, DbError> {
			self.inner.get(id).await
		}

		async fn delete(&self, id: &InstitutionId) -> Result<(), DbError> {
			self.inner.delete(id).await
		}

		async fn activate_subscription(
			&self,
			id: &InstitutionId,
			start: chrono::DateTime<chrono::Utc>,
			end: chrono::DateTime<chrono::Utc>,
		) -> Result<bool, DbError> {
			self.inner.activate_subscription(id, start, end).await
		}

		async fn transition_subscription(
			&self,
			id: &InstitutionId,
			from: SubscriptionStatus,
			to: SubscriptionStatus,
		) -> Result<bool, DbError> {
			self.inner.transition_subscription(id, from, to).await
		}
	}

	/// Profile store that always reports the backend as unavailable.
	struct UnavailableProfileStore;

	#[async_trait]
	impl ProfileStore for UnavailableProfileStore {
		async fn upsert(&self, _profile: &Profile) -> Result<(), DbError> {
			Err(DbError::Internal("profile store unavailable".to_string()))
		}

		async fn get(&self, _user_id: &IdentityId) -> Result<Option<Profile>, DbError> {
			Err(DbError::Internal("profile store unavailable".to_string()))
		}
	}

	#[tokio::test]
	async fn provision_creates_identity_institution_and_profile() {
		let repos = make_repos().await;
		let saga = ProvisioningSaga::new(
			repos.identities.clone(),
			repos.institutions.clone(),
			repos.profiles.clone(),
		);

		let result = saga.provision(&input()).await.unwrap();
		assert_eq!(result.subscription_status, SubscriptionStatus::Pending);

		let identity = repos
			.identities
			.get_by_email("admin@test.edu")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(identity.id, result.admin_identity_id);

		let institution = repos
			.institutions
			.get(&result.institution_id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(institution.subscription_status, SubscriptionStatus::Pending);
		assert_eq!(institution.name, "Test School");

		let profile = repos
			.profiles
			.get(&result.admin_identity_id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(profile.role, ProfileRole::Admin);
		assert_eq!(profile.institution_id, Some(result.institution_id));

		assert_eq!(count(&repos.pool, "identities").await, 1);
		assert_eq!(count(&repos.pool, "institutions").await, 1);
		assert_eq!(count(&repos.pool, "profiles").await, 1);
	}

	#[tokio::test]
	async fn second_provision_for_same_email_fails_fast() {
		let repos = make_repos().await;
		let saga = ProvisioningSaga::new(
			repos.identities.clone(),
			repos.institutions.clone(),
			repos.profiles.clone(),
		);

		saga.provision(&input()).await.unwrap();
		let err = saga.provision(&input()).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::DuplicateAccount));

		// The failed run left no partial artifacts behind.
		assert_eq!(count(&repos.pool, "identities").await, 1);
		assert_eq!(count(&repos.pool, "institutions").await, 1);
		assert_eq!(count(&repos.pool, "profiles").await, 1);
	}

	#[tokio::test]
	async fn identity_failure_needs_no_compensation() {
		let repos = make_repos().await;
		let saga = ProvisioningSaga::new(
			Arc::new(FailingIdentityStore {
				inner: (*repos.identities).clone(),
				fail_create: true,
				fail_delete: false,
			}),
			repos.institutions.clone(),
			repos.profiles.clone(),
		);

		let err = saga.provision(&input()).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::IdentityCreationFailed(_)));

		assert_eq!(count(&repos.pool, "identities").await, 0);
		assert_eq!(count(&repos.pool, "institutions").await, 0);
	}

	#[tokio::test]
	async fn institution_failure_compensates_identity() {
		let repos = make_repos().await;
		let saga = ProvisioningSaga::new(
			repos.identities.clone(),
			Arc::new(FailingInstitutionStore {
				inner: (*repos.institutions).clone(),
				fail_create: true,
			}),
			repos.profiles.clone(),
		);

		let err = saga.provision(&input()).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::InstitutionCreationFailed(_)));

		assert_eq!(count(&repos.pool, "identities").await, 0);
		assert_eq!(count(&repos.pool, "institutions").await, 0);
		assert_eq!(count(&repos.pool, "profiles").await, 0);
	}

	#[tokio::test]
	async fn profile_failure_compensates_institution_then_identity() {
		let repos = make_repos().await;
		let saga = ProvisioningSaga::new(
			repos.identities.clone(),
			repos.institutions.clone(),
			Arc::new(UnavailableProfileStore),
		);

		let err = saga.provision(&input()).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::ProfileCreationFailed(_)));

		assert!(repos
			.identities
			.get_by_email("admin@test.edu")
			.await
			.unwrap()
			.is_none());
		assert_eq!(count(&repos.pool, "identities").await, 0);
		assert_eq!(count(&repos.pool, "institutions").await, 0);
		assert_eq!(count(&repos.pool, "profiles").await, 0);
	}

	#[tokio::test]
	async fn compensation_failure_never_masks_the_step_error() {
		let repos = make_repos().await;
		// Profile creation fails; the identity compensation also fails.
		// The caller still sees the profile failure, and the identity is
		// left behind as a logged orphan.
		let saga = ProvisioningSaga::new(
			Arc::new(FailingIdentityStore {
				inner: (*repos.identities).clone(),
				fail_create: false,
				fail_delete: true,
			}),
			repos.institutions.clone(),
			Arc::new(UnavailableProfileStore),
		);

		let err = saga.provision(&input()).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::ProfileCreationFailed(_)));

		// Institution compensation still ran; the identity orphan remains.
		assert_eq!(count(&repos.pool, "institutions").await, 0);
		assert_eq!(count(&repos.pool, "identities").await, 1);
	}
}

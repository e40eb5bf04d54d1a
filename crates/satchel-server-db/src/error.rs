// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
	/// Map an insert error, surfacing unique-constraint violations as `Conflict`.
	pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
		if let sqlx::Error::Database(db) = &e {
			if db.is_unique_violation() {
				return DbError::Conflict(what.to_string());
			}
		}
		DbError::Sqlx(e)
	}

	/// Returns true if this error is a uniqueness conflict.
	pub fn is_conflict(&self) -> bool {
		matches!(self, DbError::Conflict(_))
	}
}

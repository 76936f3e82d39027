use thiserror::Error;

/// Errors that can occur in the generic many-to-many system
#[derive(Debug, Error)]
pub enum GenericM2mError {
	/// A lookup without a disambiguating primary key matched more than one record
	#[error("Multiple {model} objects returned; supply a primary key to disambiguate")]
	MultipleObjectsReturned { model: String },

	/// No association stored under the given name (named variant)
	#[error("No related object stored under name '{0}'")]
	NameNotFound(String),

	/// The stored content type does not match the requested model type
	#[error("Related object has content type id {found}, expected {expected}")]
	ContentTypeMismatch { expected: String, found: i64 },

	/// The stored content type id is not present in the registry
	#[error("Unknown content type id: {0}")]
	UnknownContentType(i64),

	/// The text-stored object id cannot be cast to the target's primary key type
	#[error("Cannot cast stored object id '{value}' to the target primary key type")]
	PkCast { value: String },

	/// Database error from sqlx
	#[error("Database error: {0}")]
	DatabaseError(String),
}

/// Result type for generic many-to-many operations
pub type Result<T> = std::result::Result<T, GenericM2mError>;

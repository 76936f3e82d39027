//! The association record and the lazily-resolving target handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_query::{Alias, Asterisk, Expr, ExprTrait, Query, SqliteQueryBuilder, Value};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};

use crate::contenttypes::{CONTENT_TYPE_REGISTRY, ContentType};
use crate::error::{GenericM2mError, Result};
use crate::models::related_model::{ObjectRef, PkKind, RelatedModel};
use crate::schema::AssociationTable;

/// Association record: owner X is linked to target Y
///
/// `owner_id` and `object_id` are text renderings of the respective primary
/// keys; `content_type_id` identifies Y's model type via the registry.
/// `name` is populated only by the named variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedObject {
	/// Record primary key
	pub id: Option<i64>,
	/// Owning instance's primary key, rendered to text
	pub owner_id: String,
	/// Content type id of the target
	pub content_type_id: i64,
	/// Target primary key, stored as text
	pub object_id: String,
	/// String key of this association (named variant only)
	pub name: Option<String>,
	/// Creation timestamp
	pub created_at: DateTime<Utc>,
	/// Last modification timestamp
	pub changed_at: DateTime<Utc>,
}

impl RelatedObject {
	/// Hydrate a record from a row of the given association table
	pub(crate) fn from_any_row(row: &AnyRow, table: &AssociationTable) -> Result<Self> {
		let id: i64 = row
			.try_get("id")
			.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid id: {e}")))?;
		let owner_id = match table.owner_pk_kind {
			PkKind::AutoInt => row
				.try_get::<i64, _>(table.owner_column.as_str())
				.map_err(|e| {
					GenericM2mError::DatabaseError(format!("Invalid owner id: {e}"))
				})?
				.to_string(),
			PkKind::Text => row
				.try_get::<String, _>(table.owner_column.as_str())
				.map_err(|e| {
					GenericM2mError::DatabaseError(format!("Invalid owner id: {e}"))
				})?,
		};
		let content_type_id: i64 = row
			.try_get("object_ct_id")
			.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid object_ct_id: {e}")))?;
		let object_id: String = row
			.try_get("object_id")
			.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid object_id: {e}")))?;
		let name = if table.has_name_column() {
			Some(row.try_get::<String, _>("name").map_err(|e| {
				GenericM2mError::DatabaseError(format!("Invalid name: {e}"))
			})?)
		} else {
			None
		};

		Ok(Self {
			id: Some(id),
			owner_id,
			content_type_id,
			object_id,
			name,
			created_at: parse_timestamp(row, "created_at")?,
			changed_at: parse_timestamp(row, "changed_at")?,
		})
	}

	/// Reference to the target this record points at
	pub fn object_ref(&self) -> ObjectRef {
		ObjectRef {
			content_type_id: self.content_type_id,
			object_id: self.object_id.clone(),
		}
	}

	/// Lazily-resolving handle to the target
	pub fn object(&self, pool: Arc<AnyPool>) -> ObjectHandle {
		ObjectHandle {
			pool,
			content_type_id: self.content_type_id,
			object_id: self.object_id.clone(),
		}
	}
}

/// Lazily-resolving handle to a stored target instance
///
/// Resolution of the content type goes through the registry, and resolution
/// of the target row is deferred until [`ObjectHandle::resolve`] is called,
/// so handles can be produced without touching the target's database.
#[derive(Debug, Clone)]
pub struct ObjectHandle {
	pool: Arc<AnyPool>,
	/// Content type id of the target
	pub content_type_id: i64,
	/// Target primary key, rendered to text
	pub object_id: String,
}

impl ObjectHandle {
	/// Content type of the target, resolved from the registry
	pub fn content_type(&self) -> Result<ContentType> {
		CONTENT_TYPE_REGISTRY
			.get_by_id(self.content_type_id)
			.ok_or(GenericM2mError::UnknownContentType(self.content_type_id))
	}

	/// Reference form of this handle
	pub fn object_ref(&self) -> ObjectRef {
		ObjectRef {
			content_type_id: self.content_type_id,
			object_id: self.object_id.clone(),
		}
	}

	/// Fetch the target instance as `T`
	///
	/// Fails with [`GenericM2mError::ContentTypeMismatch`] when the stored
	/// content type is not `T`'s; returns `Ok(None)` when the target row no
	/// longer exists.
	pub async fn resolve<T: RelatedModel>(&self) -> Result<Option<T>> {
		let expected = CONTENT_TYPE_REGISTRY.id_for_model::<T>();
		if expected != self.content_type_id {
			return Err(GenericM2mError::ContentTypeMismatch {
				expected: T::model_name().to_string(),
				found: self.content_type_id,
			});
		}
		fetch_by_pk::<T>(&self.pool, &self.object_id).await
	}
}

impl PartialEq for ObjectHandle {
	fn eq(&self, other: &Self) -> bool {
		self.content_type_id == other.content_type_id && self.object_id == other.object_id
	}
}

/// Fetch a model instance by its text-rendered primary key
pub(crate) async fn fetch_by_pk<T: RelatedModel>(
	pool: &AnyPool,
	object_id: &str,
) -> Result<Option<T>> {
	let pk_value: Value = match T::pk_kind() {
		PkKind::AutoInt => object_id
			.parse::<i64>()
			.map_err(|_| GenericM2mError::PkCast {
				value: object_id.to_string(),
			})?
			.into(),
		PkKind::Text => object_id.into(),
	};

	let mut stmt = Query::select();
	stmt.from(Alias::new(T::table_name()))
		.column(Asterisk)
		.and_where(Expr::col(Alias::new(T::pk_column())).eq(pk_value));

	let sql = stmt.to_string(SqliteQueryBuilder);
	let row = sqlx::query(&sql)
		.fetch_optional(pool)
		.await
		.map_err(|e| GenericM2mError::DatabaseError(format!("Failed to fetch object: {e}")))?;

	row.as_ref().map(T::from_row).transpose()
}

fn parse_timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>> {
	let raw: String = row
		.try_get(column)
		.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid {column}: {e}")))?;
	DateTime::parse_from_rfc3339(&raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid {column} timestamp: {e}")))
}

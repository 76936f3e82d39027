//! The relation fields declared on owning models.
//!
//! Declaring a field runs the association table factory for the owning model
//! (idempotent; see [`crate::schema`]). The field then hands out exactly two
//! kinds of handles:
//!
//! - [`GenericManyToManyField::of`]: the bound manager for one owner
//!   instance, carrying the mutation operations;
//! - [`GenericManyToManyField::query`]: the unbound, read-only handle over
//!   the whole association table.
//!
//! There is no assignment surface: all mutation goes through the bound
//! manager, so duplicate checking and the uniqueness rules cannot be
//! bypassed. Wholesale replacement is `of(...).set(...)`.

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::AnyPool;

use crate::error::Result;
use crate::manager::{NamedRelatedObjectsManager, RelatedObjectsManager};
use crate::models::RelatedModel;
use crate::query::RelatedObjectQuery;
use crate::schema::{AssociationTable, Uniqueness};

/// Generic many-to-many relation field (plain variant)
///
/// Associates instances of the owning model `O` with heterogeneous target
/// objects through a single per-owner association table.
///
/// # Example
///
/// ```rust,ignore
/// use reinhardt_generic_m2m::{GenericManyToManyField, ObjectRef};
///
/// let related_objects = GenericManyToManyField::<Article>::new();
/// related_objects.ensure_schema(&pool).await?;
///
/// let manager = related_objects.of(&article, pool.clone());
/// manager.add([ObjectRef::of(&author), ObjectRef::of(&attachment)]).await?;
/// ```
pub struct GenericManyToManyField<O: RelatedModel> {
	through: Arc<AssociationTable>,
	_owner: PhantomData<O>,
}

impl<O: RelatedModel> GenericManyToManyField<O> {
	/// Declare the field, manufacturing the association table on first use
	pub fn new() -> Self {
		Self {
			through: AssociationTable::for_owner::<O>(Uniqueness::ByObject),
			_owner: PhantomData,
		}
	}

	/// Declare the field over a preexisting association table
	///
	/// The factory step is skipped entirely. The table must be keyed by
	/// object, not by name.
	pub fn with_through(through: Arc<AssociationTable>) -> Self {
		debug_assert_eq!(
			through.uniqueness,
			Uniqueness::ByObject,
			"table {} is name-keyed, expected an object-keyed table",
			through.table_name
		);
		Self {
			through,
			_owner: PhantomData,
		}
	}

	/// The association table backing this field
	pub fn through(&self) -> &Arc<AssociationTable> {
		&self.through
	}

	/// Create the association table if it does not exist yet
	pub async fn ensure_schema(&self, pool: &AnyPool) -> Result<()> {
		self.through.ensure_schema(pool).await
	}

	/// Bound manager for one owner instance
	pub fn of(&self, owner: &O, pool: Arc<AnyPool>) -> RelatedObjectsManager {
		RelatedObjectsManager::new(pool, self.through.clone(), owner.pk())
	}

	/// Unbound, read-only query over the whole association table
	pub fn query(&self, pool: Arc<AnyPool>) -> RelatedObjectQuery {
		RelatedObjectQuery::new(pool, self.through.clone())
	}
}

impl<O: RelatedModel> Default for GenericManyToManyField<O> {
	fn default() -> Self {
		Self::new()
	}
}

impl<O: RelatedModel> Clone for GenericManyToManyField<O> {
	fn clone(&self) -> Self {
		Self {
			through: self.through.clone(),
			_owner: PhantomData,
		}
	}
}

/// Generic many-to-many relation field (named variant)
///
/// Each association is keyed by a caller-chosen string: adding under an
/// existing name re-points it (upsert), lookup is by name, and the same
/// target may be stored under several names.
pub struct NamedGenericManyToManyField<O: RelatedModel> {
	through: Arc<AssociationTable>,
	_owner: PhantomData<O>,
}

impl<O: RelatedModel> NamedGenericManyToManyField<O> {
	/// Declare the field, manufacturing the association table on first use
	pub fn new() -> Self {
		Self {
			through: AssociationTable::for_owner::<O>(Uniqueness::ByName),
			_owner: PhantomData,
		}
	}

	/// Declare the field over a preexisting association table
	///
	/// The table must be keyed by name.
	pub fn with_through(through: Arc<AssociationTable>) -> Self {
		debug_assert_eq!(
			through.uniqueness,
			Uniqueness::ByName,
			"table {} is object-keyed, expected a name-keyed table",
			through.table_name
		);
		Self {
			through,
			_owner: PhantomData,
		}
	}

	/// The association table backing this field
	pub fn through(&self) -> &Arc<AssociationTable> {
		&self.through
	}

	/// Create the association table if it does not exist yet
	pub async fn ensure_schema(&self, pool: &AnyPool) -> Result<()> {
		self.through.ensure_schema(pool).await
	}

	/// Bound manager for one owner instance
	pub fn of(&self, owner: &O, pool: Arc<AnyPool>) -> NamedRelatedObjectsManager {
		NamedRelatedObjectsManager::new(pool, self.through.clone(), owner.pk())
	}

	/// Unbound, read-only query over the whole association table
	pub fn query(&self, pool: Arc<AnyPool>) -> RelatedObjectQuery {
		RelatedObjectQuery::new(pool, self.through.clone())
	}
}

impl<O: RelatedModel> Default for NamedGenericManyToManyField<O> {
	fn default() -> Self {
		Self::new()
	}
}

impl<O: RelatedModel> Clone for NamedGenericManyToManyField<O> {
	fn clone(&self) -> Self {
		Self {
			through: self.through.clone(),
			_owner: PhantomData,
		}
	}
}

//! # reinhardt-generic-m2m
//!
//! Django-style generic many-to-many relation fields for the Reinhardt
//! framework.
//!
//! A single declared field associates instances of an owning model with
//! heterogeneous related objects (instances of arbitrary other model types),
//! through one per-owner association table instead of one junction table per
//! target type.
//!
//! ## Features
//!
//! - `GenericManyToManyField`: set-style associations keyed by
//!   (owner, content type, object id), with idempotent `add`
//! - `NamedGenericManyToManyField`: associations keyed by a caller-chosen
//!   string, with upsert-by-name semantics and `get_by_name` lookup
//! - `ContentTypeRegistry`: in-process content type registry with lazy,
//!   join-free resolution of stored content type ids
//! - Association table factory: per-owner tables derived deterministically
//!   from the owning model's name, registered once and reused
//! - Bound vs. unbound handles: an instance-scoped manager carries the
//!   mutation operations, the table-wide query handle is read-only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reinhardt_generic_m2m::prelude::*;
//!
//! // Declare the field for an owning model (runs the table factory)
//! let related_objects = GenericManyToManyField::<Article>::new();
//! related_objects.ensure_schema(&pool).await?;
//!
//! // Bound manager: mutations + queries for one owner instance
//! let manager = related_objects.of(&article, pool.clone());
//! manager.add([ObjectRef::of(&author), ObjectRef::of(&review)]).await?;
//! let authors: Vec<Author> = manager.get_objects().await?;
//!
//! // Unbound handle: read-only, table-wide
//! let count = related_objects.query(pool).count().await?;
//! ```

// Public modules
pub mod contenttypes;
pub mod error;
pub mod field;
pub mod manager;
pub mod models;
pub mod naming;
pub mod query;
pub mod schema;

// Re-exports for convenient access
pub use contenttypes::{CONTENT_TYPE_REGISTRY, ContentType, ContentTypeRegistry};
pub use error::{GenericM2mError, Result};
pub use field::{GenericManyToManyField, NamedGenericManyToManyField};
pub use manager::{NamedRelatedObjectsManager, RelatedObjectsManager};
pub use models::{ObjectHandle, ObjectPk, ObjectRef, PkKind, RelatedModel, RelatedObject};
pub use query::RelatedObjectQuery;
pub use schema::{AssociationTable, Uniqueness};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::contenttypes::{CONTENT_TYPE_REGISTRY, ContentType, ContentTypeRegistry};
	pub use crate::error::{GenericM2mError, Result};
	pub use crate::field::{GenericManyToManyField, NamedGenericManyToManyField};
	pub use crate::manager::{NamedRelatedObjectsManager, RelatedObjectsManager};
	pub use crate::models::{
		ObjectHandle, ObjectPk, ObjectRef, PkKind, RelatedModel, RelatedObject,
	};
	pub use crate::query::RelatedObjectQuery;
	pub use crate::schema::{AssociationTable, Uniqueness};
}

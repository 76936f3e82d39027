//! The model seam: trait implemented by every type that can appear on either
//! side of a generic relation.

use std::fmt;

use sqlx::any::AnyRow;

use crate::contenttypes::{CONTENT_TYPE_REGISTRY, ContentType};
use crate::error::Result;
use crate::naming::to_snake_case;

/// Primary key storage class of a model
///
/// Object ids are persisted as text to support heterogeneous key types;
/// `PkKind` records what that text casts back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkKind {
	/// Auto-incrementing integer key; cast back to `i64` on read
	AutoInt,
	/// Arbitrary textual key; returned as stored
	Text,
}

/// Trait for models that can participate in generic relations
///
/// Implement this for every owning model and every target model. The trait
/// provides the content type discriminator, table metadata, and row hydration
/// needed for the polymorphic many-to-many relationship.
///
/// # Examples
///
/// ```rust,ignore
/// use reinhardt_generic_m2m::{PkKind, RelatedModel};
///
/// struct Author {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl RelatedModel for Author {
///     fn app_label() -> &'static str {
///         "library"
///     }
///
///     fn model_name() -> &'static str {
///         "Author"
///     }
///
///     fn pk(&self) -> String {
///         self.id.unwrap_or(0).to_string()
///     }
///
///     fn from_row(row: &sqlx::any::AnyRow) -> reinhardt_generic_m2m::Result<Self> {
///         // hydrate from the row's columns
///         # unimplemented!()
///     }
/// }
/// ```
pub trait RelatedModel: Sized {
	/// Application label, the first half of the content type key
	fn app_label() -> &'static str;

	/// Model name, the second half of the content type key
	///
	/// Typically the struct name (e.g., "Author", "Article").
	fn model_name() -> &'static str;

	/// Database table backing this model
	fn table_name() -> String {
		format!("{}_{}", Self::app_label(), to_snake_case(Self::model_name()))
	}

	/// Primary key column name
	fn pk_column() -> &'static str {
		"id"
	}

	/// Storage class of the primary key
	fn pk_kind() -> PkKind {
		PkKind::AutoInt
	}

	/// Primary key of this instance, rendered to text
	fn pk(&self) -> String;

	/// Hydrate an instance from a database row
	fn from_row(row: &AnyRow) -> Result<Self>;

	/// Content type of this model, registered on first use
	fn content_type() -> ContentType {
		CONTENT_TYPE_REGISTRY.get_for_model::<Self>()
	}
}

/// Value handle for "some target instance"
///
/// Carries the content type id and the text-rendered primary key. Mutation
/// methods accept `ObjectRef`s so a single call can mix target types, and
/// queries filtered "by object" are rewritten into this content-type + id
/// pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
	/// Content type id of the target model
	pub content_type_id: i64,
	/// Target primary key, rendered to text
	pub object_id: String,
}

impl ObjectRef {
	/// Build a reference to a model instance
	pub fn of<T: RelatedModel>(object: &T) -> Self {
		Self {
			content_type_id: CONTENT_TYPE_REGISTRY.id_for_model::<T>(),
			object_id: object.pk(),
		}
	}
}

/// A primary key cast from the generic text storage into its concrete type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectPk {
	/// Auto-incrementing integer key
	Int(i64),
	/// Textual key
	Text(String),
}

impl fmt::Display for ObjectPk {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ObjectPk::Int(v) => write!(f, "{v}"),
			ObjectPk::Text(v) => write!(f, "{v}"),
		}
	}
}

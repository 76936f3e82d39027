//! Unit tests for object references, pk casting, and model trait defaults.

use reinhardt_generic_m2m::{ObjectPk, ObjectRef, PkKind, RelatedModel, Result};
use rstest::*;
use sqlx::any::AnyRow;

struct BlogPost {
	id: i64,
}

impl RelatedModel for BlogPost {
	fn app_label() -> &'static str {
		"press"
	}

	fn model_name() -> &'static str {
		"BlogPost"
	}

	fn pk(&self) -> String {
		self.id.to_string()
	}

	fn from_row(_row: &AnyRow) -> Result<Self> {
		Ok(BlogPost { id: 0 })
	}
}

struct Document {
	key: String,
}

impl RelatedModel for Document {
	fn app_label() -> &'static str {
		"press"
	}

	fn model_name() -> &'static str {
		"Document"
	}

	fn pk_kind() -> PkKind {
		PkKind::Text
	}

	fn pk(&self) -> String {
		self.key.clone()
	}

	fn from_row(_row: &AnyRow) -> Result<Self> {
		Ok(Document {
			key: String::new(),
		})
	}
}

#[rstest]
fn test_trait_defaults() {
	assert_eq!(BlogPost::table_name(), "press_blog_post");
	assert_eq!(BlogPost::pk_column(), "id");
	assert_eq!(BlogPost::pk_kind(), PkKind::AutoInt);
}

#[rstest]
fn test_object_ref_renders_pk_to_text() {
	// Arrange
	let post = BlogPost { id: 42 };

	// Act
	let object_ref = ObjectRef::of(&post);

	// Assert
	assert_eq!(object_ref.object_id, "42");
}

#[rstest]
fn test_object_refs_share_content_type_per_model() {
	// Arrange
	let first = BlogPost { id: 1 };
	let second = BlogPost { id: 2 };
	let other = Document {
		key: "contract".to_string(),
	};

	// Act
	let ref1 = ObjectRef::of(&first);
	let ref2 = ObjectRef::of(&second);
	let ref3 = ObjectRef::of(&other);

	// Assert: same model type shares an id, different types do not
	assert_eq!(ref1.content_type_id, ref2.content_type_id);
	assert_ne!(ref1.content_type_id, ref3.content_type_id);
	assert_ne!(ref1, ref2);
}

#[rstest]
fn test_content_type_registered_on_first_use() {
	let content_type = BlogPost::content_type();
	assert_eq!(content_type.app_label, "press");
	assert_eq!(content_type.model, "BlogPost");
	assert!(content_type.id.is_some());
}

#[rstest]
#[case(ObjectPk::Int(7), "7")]
#[case(ObjectPk::Text("scan-001".to_string()), "scan-001")]
fn test_object_pk_display(#[case] pk: ObjectPk, #[case] expected: &str) {
	assert_eq!(pk.to_string(), expected);
}

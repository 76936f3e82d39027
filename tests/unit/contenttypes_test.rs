//! Unit tests for the content type registry.

use reinhardt_generic_m2m::{ContentType, ContentTypeRegistry, RelatedModel, Result};
use rstest::*;
use sqlx::any::AnyRow;

struct Invoice;

impl RelatedModel for Invoice {
	fn app_label() -> &'static str {
		"billing"
	}

	fn model_name() -> &'static str {
		"Invoice"
	}

	fn pk(&self) -> String {
		"1".to_string()
	}

	fn from_row(_row: &AnyRow) -> Result<Self> {
		Ok(Invoice)
	}
}

#[rstest]
fn test_register_assigns_id_once() {
	// Arrange
	let registry = ContentTypeRegistry::new();

	// Act
	let first = registry.register(ContentType::new("billing", "Invoice"));
	let second = registry.register(ContentType::new("billing", "Invoice"));

	// Assert
	assert_eq!(first.id, Some(1));
	assert_eq!(second, first);
}

#[rstest]
fn test_lookup_by_key_and_id() {
	// Arrange
	let registry = ContentTypeRegistry::new();
	let registered = registry.register(ContentType::new("billing", "Invoice"));

	// Act & Assert
	assert_eq!(
		registry.get("billing", "Invoice"),
		Some(registered.clone())
	);
	assert_eq!(registry.get_by_id(registered.id.unwrap()), Some(registered));
	assert_eq!(registry.get("billing", "Receipt"), None);
	assert_eq!(registry.get_by_id(999), None);
}

#[rstest]
fn test_get_or_create_creates_then_reuses() {
	// Arrange
	let registry = ContentTypeRegistry::new();

	// Act
	let created = registry.get_or_create("billing", "Receipt");
	let reused = registry.get_or_create("billing", "Receipt");

	// Assert
	assert!(created.id.is_some());
	assert_eq!(reused, created);
}

#[rstest]
fn test_model_registration_via_trait() {
	// Arrange
	let registry = ContentTypeRegistry::new();

	// Act
	let content_type = registry.get_for_model::<Invoice>();
	let id = registry.id_for_model::<Invoice>();

	// Assert
	assert_eq!(content_type.app_label, "billing");
	assert_eq!(content_type.model, "Invoice");
	assert_eq!(content_type.id, Some(id));
}

//! Unit tests for declaring fields over preexisting association tables.

use reinhardt_generic_m2m::{
	AssociationTable, GenericManyToManyField, NamedGenericManyToManyField, RelatedModel, Result,
	Uniqueness,
};
use rstest::*;
use sqlx::any::AnyRow;

struct Memo;

impl RelatedModel for Memo {
	fn app_label() -> &'static str {
		"office"
	}

	fn model_name() -> &'static str {
		"Memo"
	}

	fn pk(&self) -> String {
		"1".to_string()
	}

	fn from_row(_row: &AnyRow) -> Result<Self> {
		Ok(Memo)
	}
}

#[rstest]
fn test_with_through_accepts_matching_table() {
	let plain_table = AssociationTable::for_owner::<Memo>(Uniqueness::ByObject);
	let named_table = AssociationTable::for_owner::<Memo>(Uniqueness::ByName);

	let plain = GenericManyToManyField::<Memo>::with_through(plain_table.clone());
	let named = NamedGenericManyToManyField::<Memo>::with_through(named_table.clone());

	assert_eq!(plain.through().table_name, plain_table.table_name);
	assert_eq!(named.through().table_name, named_table.table_name);
}

#[rstest]
#[should_panic(expected = "expected an object-keyed table")]
fn test_plain_field_rejects_name_keyed_table() {
	let named_table = AssociationTable::for_owner::<Memo>(Uniqueness::ByName);

	let _ = GenericManyToManyField::<Memo>::with_through(named_table);
}

#[rstest]
#[should_panic(expected = "expected a name-keyed table")]
fn test_named_field_rejects_object_keyed_table() {
	let plain_table = AssociationTable::for_owner::<Memo>(Uniqueness::ByObject);

	let _ = NamedGenericManyToManyField::<Memo>::with_through(plain_table);
}

//! Integration tests for the plain relation field: add, remove, set, clear.

use std::sync::Arc;

use reinhardt_generic_m2m::{GenericManyToManyField, ObjectPk, ObjectRef};
use rstest::*;
use sqlx::AnyPool;

use crate::fixtures::*;

#[rstest]
#[tokio::test]
async fn test_add_creates_associations(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Generic relations").await;
	let alice = create_author(&pool, "Alice").await;
	let bob = create_author(&pool, "Bob").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());

	// Act
	manager
		.add([ObjectRef::of(&alice), ObjectRef::of(&bob)])
		.await
		.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 2);
	assert!(
		manager
			.query()
			.filter_object(&ObjectRef::of(&alice))
			.exists()
			.await
			.unwrap()
	);
}

#[rstest]
#[tokio::test]
async fn test_add_is_idempotent(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Dedup").await;
	let alice = create_author(&pool, "Alice").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());

	// Act
	manager.add_object(&alice).await.unwrap();
	manager.add_object(&alice).await.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_add_mixed_target_types(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Mixed").await;
	let alice = create_author(&pool, "Alice").await;
	let scan = create_attachment(&pool, "scan-001", "Scanned draft").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());

	// Act
	manager
		.add([ObjectRef::of(&alice), ObjectRef::of(&scan)])
		.await
		.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 2);
	assert_eq!(manager.get_objects::<Author>().await.unwrap(), vec![alice]);
	assert_eq!(
		manager.get_objects::<Attachment>().await.unwrap(),
		vec![scan]
	);
}

#[rstest]
#[tokio::test]
async fn test_remove_unlinks_target(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Removal").await;
	let alice = create_author(&pool, "Alice").await;
	let bob = create_author(&pool, "Bob").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());
	manager
		.add([ObjectRef::of(&alice), ObjectRef::of(&bob)])
		.await
		.unwrap();

	// Act
	manager.remove([ObjectRef::of(&alice)]).await.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 1);
	assert_eq!(manager.get_objects::<Author>().await.unwrap(), vec![bob]);

	// Removing an already-unlinked target is a no-op
	manager.remove([ObjectRef::of(&alice)]).await.unwrap();
	assert_eq!(manager.count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_set_replaces_all_associations(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Replace").await;
	let alice = create_author(&pool, "Alice").await;
	let bob = create_author(&pool, "Bob").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());
	manager.add_object(&alice).await.unwrap();

	// Act
	manager.set([ObjectRef::of(&bob)]).await.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 1);
	assert_eq!(
		manager.get_object_pks::<Author>().await.unwrap(),
		vec![ObjectPk::Int(bob.id.unwrap())]
	);
}

#[rstest]
#[tokio::test]
async fn test_clear_deletes_all_associations(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let article = create_article(&pool, "Clear").await;
	let alice = create_author(&pool, "Alice").await;
	let bob = create_author(&pool, "Bob").await;
	let field = GenericManyToManyField::<Article>::new();
	let manager = field.of(&article, pool.clone());
	manager
		.add([ObjectRef::of(&alice), ObjectRef::of(&bob)])
		.await
		.unwrap();

	// Act
	manager.clear().await.unwrap();

	// Assert
	assert_eq!(manager.count().await.unwrap(), 0);

	// Clearing an empty relation is fine
	manager.clear().await.unwrap();
	assert_eq!(manager.count().await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_owners_are_isolated(#[future] m2m_db: Arc<AnyPool>) {
	// Arrange
	let pool = m2m_db.await;
	let first = create_article(&pool, "First").await;
	let second = create_article(&pool, "Second").await;
	let alice = create_author(&pool, "Alice").await;
	let bob = create_author(&pool, "Bob").await;
	let field = GenericManyToManyField::<Article>::new();

	// Act
	field
		.of(&first, pool.clone())
		.add([ObjectRef::of(&alice), ObjectRef::of(&bob)])
		.await
		.unwrap();
	field
		.of(&second, pool.clone())
		.add_object(&alice)
		.await
		.unwrap();

	// Assert: bound managers see only their owner's rows
	assert_eq!(field.of(&first, pool.clone()).count().await.unwrap(), 2);
	assert_eq!(field.of(&second, pool.clone()).count().await.unwrap(), 1);

	// The unbound handle sees the whole table
	assert_eq!(field.query(pool.clone()).count().await.unwrap(), 3);
}

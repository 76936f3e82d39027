//! In-memory database fixture for integration tests.
//!
//! Each test gets a fresh SQLite in-memory database through the sqlx `Any`
//! driver, with the target model tables and both association tables for
//! `Article` already created. The pool is capped at a single connection so
//! every statement sees the same in-memory database.

use std::sync::{Arc, Once};

use reinhardt_generic_m2m::{AssociationTable, Uniqueness};
use rstest::*;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use super::model_fixture::Article;

static DRIVERS: Once = Once::new();

/// Create a fresh in-memory database with all test tables
#[fixture]
pub async fn m2m_db() -> Arc<AnyPool> {
	DRIVERS.call_once(sqlx::any::install_default_drivers);

	let pool = AnyPoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.expect("Failed to create in-memory database");

	for sql in [
		"CREATE TABLE blog_article (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)",
		"CREATE TABLE blog_author (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
		"CREATE TABLE blog_attachment (id TEXT PRIMARY KEY, label TEXT NOT NULL)",
	] {
		sqlx::query(sql)
			.execute(&pool)
			.await
			.expect("Failed to create model table");
	}

	AssociationTable::for_owner::<Article>(Uniqueness::ByObject)
		.ensure_schema(&pool)
		.await
		.expect("Failed to create association table");
	AssociationTable::for_owner::<Article>(Uniqueness::ByName)
		.ensure_schema(&pool)
		.await
		.expect("Failed to create named association table");

	Arc::new(pool)
}

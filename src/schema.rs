//! Association table factory and registry.
//!
//! Each owning model gets one concrete association table per variant,
//! manufactured deterministically from the owning model's name. Registration
//! happens at field construction time and is idempotent: declaring the same
//! field on the same owner twice yields the same table descriptor.
//!
//! Schema creation is an explicit startup step
//! ([`AssociationTable::ensure_schema`]), not an implicit runtime operation.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use sea_query::{Alias, ColumnDef, Index, SqliteQueryBuilder, Table};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::error::{GenericM2mError, Result};
use crate::models::{PkKind, RelatedModel};
use crate::naming::to_snake_case;

/// Registry of manufactured association tables, keyed by table name
static ASSOCIATION_TABLES: Lazy<RwLock<HashMap<String, Arc<AssociationTable>>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

/// Uniqueness rule of an association table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Uniqueness {
	/// One record per (owner, content type, object id) triple
	ByObject,
	/// One record per (owner, name) pair; the same target may appear under
	/// several names
	ByName,
}

/// Descriptor of one concrete per-owner association table
///
/// Built by [`AssociationTable::for_owner`]; all names are derived from the
/// owning model's name, converted from camel case to snake case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationTable {
	/// Owning model's name (e.g., "Article")
	pub owner_model: String,
	/// Relation type name (e.g., "ArticleGenericManyToManyRelation")
	pub relation_name: String,
	/// Database table name (e.g., "blog_article_generic_many_to_many_relation")
	pub table_name: String,
	/// Owner foreign key column (e.g., "article_id")
	pub owner_column: String,
	/// Storage class of the owner's primary key
	pub owner_pk_kind: PkKind,
	/// Uniqueness rule of this table
	pub uniqueness: Uniqueness,
}

impl AssociationTable {
	/// Return the association table for an owning model, manufacturing and
	/// registering it on first use
	pub fn for_owner<O: RelatedModel>(uniqueness: Uniqueness) -> Arc<Self> {
		let relation_name = match uniqueness {
			Uniqueness::ByObject => format!("{}GenericManyToManyRelation", O::model_name()),
			Uniqueness::ByName => format!("{}NamedGenericManyToManyRelation", O::model_name()),
		};
		let table_name = format!("{}_{}", O::app_label(), to_snake_case(&relation_name));

		let mut tables = ASSOCIATION_TABLES.write();
		if let Some(existing) = tables.get(&table_name) {
			return existing.clone();
		}

		let table = Arc::new(Self {
			owner_model: O::model_name().to_string(),
			owner_column: format!("{}_id", to_snake_case(O::model_name())),
			owner_pk_kind: O::pk_kind(),
			relation_name,
			table_name: table_name.clone(),
			uniqueness,
		});
		tables.insert(table_name, table.clone());
		table
	}

	/// Whether this table carries the `name` column
	pub fn has_name_column(&self) -> bool {
		self.uniqueness == Uniqueness::ByName
	}

	/// Columns selected when hydrating records from this table
	pub(crate) fn select_columns(&self) -> Vec<Alias> {
		let mut columns = vec![
			Alias::new("id"),
			Alias::new(&self.owner_column),
			Alias::new("object_ct_id"),
			Alias::new("object_id"),
		];
		if self.has_name_column() {
			columns.push(Alias::new("name"));
		}
		columns.push(Alias::new("created_at"));
		columns.push(Alias::new("changed_at"));
		columns
	}

	/// DDL statements for this table: CREATE TABLE plus the unique index
	/// enforcing the variant's uniqueness rule and an object id index
	pub fn create_statements(&self) -> Vec<String> {
		let mut table = Table::create();
		table
			.table(Alias::new(&self.table_name))
			.if_not_exists()
			.col(
				ColumnDef::new(Alias::new("id"))
					.integer()
					.not_null()
					.auto_increment()
					.primary_key(),
			);

		let mut owner_col = ColumnDef::new(Alias::new(&self.owner_column));
		match self.owner_pk_kind {
			PkKind::AutoInt => owner_col.integer(),
			PkKind::Text => owner_col.text(),
		};
		table.col(owner_col.not_null());

		table
			.col(
				ColumnDef::new(Alias::new("object_ct_id"))
					.integer()
					.not_null(),
			)
			.col(ColumnDef::new(Alias::new("object_id")).text().not_null());
		if self.has_name_column() {
			table.col(ColumnDef::new(Alias::new("name")).text().not_null());
		}
		table
			.col(ColumnDef::new(Alias::new("created_at")).text().not_null())
			.col(ColumnDef::new(Alias::new("changed_at")).text().not_null());

		let mut unique = Index::create();
		unique
			.if_not_exists()
			.name(format!("{}_uniq", self.table_name))
			.table(Alias::new(&self.table_name))
			.unique()
			.col(Alias::new(&self.owner_column));
		match self.uniqueness {
			Uniqueness::ByObject => {
				unique
					.col(Alias::new("object_ct_id"))
					.col(Alias::new("object_id"));
			}
			Uniqueness::ByName => {
				unique.col(Alias::new("name"));
			}
		}

		let mut object_id_idx = Index::create();
		object_id_idx
			.if_not_exists()
			.name(format!("{}_object_id_idx", self.table_name))
			.table(Alias::new(&self.table_name))
			.col(Alias::new("object_id"));

		vec![
			table.to_string(SqliteQueryBuilder),
			unique.to_string(SqliteQueryBuilder),
			object_id_idx.to_string(SqliteQueryBuilder),
		]
	}

	/// Create the table and its indexes if they do not exist yet
	pub async fn ensure_schema(&self, pool: &AnyPool) -> Result<()> {
		for sql in self.create_statements() {
			sqlx::query(&sql).execute(pool).await.map_err(|e| {
				GenericM2mError::DatabaseError(format!(
					"Failed to create association table {}: {e}",
					self.table_name
				))
			})?;
		}
		tracing::debug!(table = %self.table_name, "association table schema ensured");
		Ok(())
	}
}

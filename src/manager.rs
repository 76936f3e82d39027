//! Instance-scoped relation managers.
//!
//! A bound manager is obtained from a field via `field.of(&owner, pool)` and
//! carries the mutation operations (`add`, `remove`, `set`, `clear`) on top
//! of the read surface. The table-wide, read-only capability set lives in
//! [`crate::query::RelatedObjectQuery`]; which of the two a caller holds is
//! fixed at construction time.
//!
//! Multi-object mutations issue one statement per object, sequentially and
//! without a transaction wrapper, so a failure partway through leaves the
//! earlier statements applied.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use sea_query::{
	Alias, Asterisk, Expr, ExprTrait, OnConflict, Query, SimpleExpr, SqliteQueryBuilder, Value,
};
use sqlx::AnyPool;

use crate::contenttypes::CONTENT_TYPE_REGISTRY;
use crate::error::{GenericM2mError, Result};
use crate::models::related_object::fetch_by_pk;
use crate::models::{ObjectHandle, ObjectPk, ObjectRef, PkKind, RelatedModel};
use crate::query::RelatedObjectQuery;
use crate::schema::AssociationTable;

/// Relation manager bound to one owning instance (plain variant)
///
/// Associations form a set keyed by (owner, content type, object id):
/// adding an already-linked target is a silent no-op.
#[derive(Clone)]
pub struct RelatedObjectsManager {
	pool: Arc<AnyPool>,
	through: Arc<AssociationTable>,
	owner_pk: String,
}

impl RelatedObjectsManager {
	pub(crate) fn new(pool: Arc<AnyPool>, through: Arc<AssociationTable>, owner_pk: String) -> Self {
		Self {
			pool,
			through,
			owner_pk,
		}
	}

	/// Read-only query over this owner's associations
	pub fn query(&self) -> RelatedObjectQuery {
		RelatedObjectQuery::new(self.pool.clone(), self.through.clone())
			.filter_owner(self.owner_pk.clone())
	}

	/// Link the given targets to the owner
	///
	/// Creates an association per object unless one already exists for that
	/// (owner, content type, id) triple; duplicates are silently ignored.
	pub async fn add(&self, objects: impl IntoIterator<Item = ObjectRef>) -> Result<()> {
		for object in objects {
			self.insert_ignore(&object).await?;
		}
		Ok(())
	}

	/// Link a single target instance to the owner
	pub async fn add_object<T: RelatedModel>(&self, object: &T) -> Result<()> {
		self.insert_ignore(&ObjectRef::of(object)).await
	}

	/// Unlink the given targets from the owner
	///
	/// A target with no association is a no-op.
	pub async fn remove(&self, objects: impl IntoIterator<Item = ObjectRef>) -> Result<()> {
		for object in objects {
			let mut stmt = Query::delete();
			stmt.from_table(Alias::new(&self.through.table_name))
				.and_where(
					Expr::col(Alias::new(&self.through.owner_column)).eq(self.owner_value()),
				)
				.and_where(Expr::col(Alias::new("object_ct_id")).eq(object.content_type_id))
				.and_where(Expr::col(Alias::new("object_id")).eq(object.object_id.as_str()));

			let sql = stmt.to_string(SqliteQueryBuilder);
			sqlx::query(&sql).execute(&*self.pool).await.map_err(|e| {
				GenericM2mError::DatabaseError(format!("Failed to remove association: {e}"))
			})?;
		}
		tracing::debug!(table = %self.through.table_name, owner = %self.owner_pk, "associations removed");
		Ok(())
	}

	/// Replace all associations with the given targets (clear, then add)
	pub async fn set(&self, objects: impl IntoIterator<Item = ObjectRef>) -> Result<()> {
		self.clear().await?;
		self.add(objects).await
	}

	/// Delete all associations of the owner
	pub async fn clear(&self) -> Result<()> {
		let mut stmt = Query::delete();
		stmt.from_table(Alias::new(&self.through.table_name))
			.and_where(Expr::col(Alias::new(&self.through.owner_column)).eq(self.owner_value()));

		let sql = stmt.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&*self.pool).await.map_err(|e| {
			GenericM2mError::DatabaseError(format!("Failed to clear associations: {e}"))
		})?;
		tracing::debug!(table = %self.through.table_name, owner = %self.owner_pk, "associations cleared");
		Ok(())
	}

	/// Count the owner's associations
	pub async fn count(&self) -> Result<i64> {
		self.query().count().await
	}

	/// Target instances of type `T`, in association order
	pub async fn get_objects<T: RelatedModel>(&self) -> Result<Vec<T>> {
		let content_type_id = CONTENT_TYPE_REGISTRY.id_for_model::<T>();
		let records = self
			.query()
			.filter_content_type(content_type_id)
			.all()
			.await?;
		if records.is_empty() {
			return Ok(Vec::new());
		}

		let mut pk_values = Vec::with_capacity(records.len());
		for record in &records {
			pk_values.push(typed_pk_value::<T>(&record.object_id)?);
		}

		let mut stmt = Query::select();
		stmt.from(Alias::new(T::table_name()))
			.column(Asterisk)
			.and_where(Expr::col(Alias::new(T::pk_column())).is_in(pk_values));

		let sql = stmt.to_string(SqliteQueryBuilder);
		let rows = sqlx::query(&sql)
			.fetch_all(&*self.pool)
			.await
			.map_err(|e| GenericM2mError::DatabaseError(format!("Failed to fetch objects: {e}")))?;

		let mut by_pk: HashMap<String, T> = HashMap::with_capacity(rows.len());
		for row in &rows {
			let object = T::from_row(row)?;
			by_pk.insert(object.pk(), object);
		}

		// Reorder to association order; a target referenced twice (named
		// variant) is returned once.
		Ok(records
			.iter()
			.filter_map(|record| by_pk.remove(&record.object_id))
			.collect())
	}

	/// Primary keys of associated targets of type `T`, cast to the target's
	/// concrete key type, in association order
	pub async fn get_object_pks<T: RelatedModel>(&self) -> Result<Vec<ObjectPk>> {
		let content_type_id = CONTENT_TYPE_REGISTRY.id_for_model::<T>();
		let records = self
			.query()
			.filter_content_type(content_type_id)
			.all()
			.await?;

		records
			.iter()
			.map(|record| cast_pk::<T>(&record.object_id))
			.collect()
	}

	/// Single associated target of type `T`, or `None` if there is none
	///
	/// An explicit `pk` narrows the lookup to one association. Without it,
	/// more than one matching association is an error
	/// ([`GenericM2mError::MultipleObjectsReturned`]).
	pub async fn get_object_or_none<T: RelatedModel>(&self, pk: Option<&str>) -> Result<Option<T>> {
		let content_type_id = CONTENT_TYPE_REGISTRY.id_for_model::<T>();
		let mut query = self.query().filter_content_type(content_type_id);
		if let Some(pk) = pk {
			query = query.filter_object_id(pk);
		}

		let records = query.all().await?;
		match records.as_slice() {
			[] => Ok(None),
			[record] => fetch_by_pk::<T>(&self.pool, &record.object_id).await,
			_ => Err(GenericM2mError::MultipleObjectsReturned {
				model: T::model_name().to_string(),
			}),
		}
	}

	fn owner_value(&self) -> Value {
		match self.through.owner_pk_kind {
			PkKind::AutoInt => match self.owner_pk.parse::<i64>() {
				Ok(v) => v.into(),
				Err(_) => self.owner_pk.as_str().into(),
			},
			PkKind::Text => self.owner_pk.as_str().into(),
		}
	}

	async fn insert_ignore(&self, object: &ObjectRef) -> Result<()> {
		let now = Utc::now().to_rfc3339();
		let values: Vec<SimpleExpr> = vec![
			self.owner_value().into(),
			object.content_type_id.into(),
			object.object_id.clone().into(),
			now.clone().into(),
			now.into(),
		];

		let mut stmt = Query::insert();
		stmt.into_table(Alias::new(&self.through.table_name))
			.columns([
				Alias::new(&self.through.owner_column),
				Alias::new("object_ct_id"),
				Alias::new("object_id"),
				Alias::new("created_at"),
				Alias::new("changed_at"),
			])
			.values(values)
			.map_err(|e| {
				GenericM2mError::DatabaseError(format!("Failed to build insert: {e}"))
			})?
			.on_conflict(
				OnConflict::columns([
					Alias::new(&self.through.owner_column),
					Alias::new("object_ct_id"),
					Alias::new("object_id"),
				])
				.do_nothing()
				.to_owned(),
			);

		let sql = stmt.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&*self.pool).await.map_err(|e| {
			GenericM2mError::DatabaseError(format!("Failed to add association: {e}"))
		})?;
		tracing::debug!(
			table = %self.through.table_name,
			owner = %self.owner_pk,
			object_ct_id = object.content_type_id,
			object_id = %object.object_id,
			"association added"
		);
		Ok(())
	}
}

/// Relation manager bound to one owning instance (named variant)
///
/// Associations are keyed by (owner, name): adding under an existing name
/// re-points that name at the new target (upsert), the same target may be
/// stored under several names, and removal is by name.
#[derive(Clone)]
pub struct NamedRelatedObjectsManager {
	core: RelatedObjectsManager,
}

impl NamedRelatedObjectsManager {
	pub(crate) fn new(pool: Arc<AnyPool>, through: Arc<AssociationTable>, owner_pk: String) -> Self {
		Self {
			core: RelatedObjectsManager::new(pool, through, owner_pk),
		}
	}

	/// Read-only query over this owner's associations
	pub fn query(&self) -> RelatedObjectQuery {
		self.core.query()
	}

	/// Store the given targets under their names
	///
	/// Each entry upserts: an existing name has its target replaced, a new
	/// name creates a record.
	pub async fn add(&self, objects: impl IntoIterator<Item = (String, ObjectRef)>) -> Result<()> {
		for (name, object) in objects {
			self.upsert(&name, &object).await?;
		}
		Ok(())
	}

	/// Store a single target under a name
	pub async fn add_named<T: RelatedModel>(&self, name: &str, object: &T) -> Result<()> {
		self.upsert(name, &ObjectRef::of(object)).await
	}

	/// Delete the associations stored under the given names
	///
	/// Absent names are no-ops.
	pub async fn remove(&self, names: &[&str]) -> Result<()> {
		if names.is_empty() {
			return Ok(());
		}
		let mut stmt = Query::delete();
		stmt.from_table(Alias::new(&self.core.through.table_name))
			.and_where(
				Expr::col(Alias::new(&self.core.through.owner_column)).eq(self.core.owner_value()),
			)
			.and_where(
				Expr::col(Alias::new("name"))
					.is_in(names.iter().map(|name| name.to_string())),
			);

		let sql = stmt.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&*self.core.pool).await.map_err(|e| {
			GenericM2mError::DatabaseError(format!("Failed to remove named associations: {e}"))
		})?;
		tracing::debug!(
			table = %self.core.through.table_name,
			owner = %self.core.owner_pk,
			"named associations removed"
		);
		Ok(())
	}

	/// Replace all associations with the given named targets (clear, then add)
	pub async fn set(&self, objects: impl IntoIterator<Item = (String, ObjectRef)>) -> Result<()> {
		self.core.clear().await?;
		self.add(objects).await
	}

	/// Delete all associations of the owner
	pub async fn clear(&self) -> Result<()> {
		self.core.clear().await
	}

	/// Count the owner's associations
	pub async fn count(&self) -> Result<i64> {
		self.core.count().await
	}

	/// Handle to the target stored under `name`
	///
	/// Fails with [`GenericM2mError::NameNotFound`] when no association with
	/// that name exists.
	pub async fn get_by_name(&self, name: &str) -> Result<ObjectHandle> {
		let record = self.query().filter_name(name).first().await?;
		record
			.map(|r| r.object(self.core.pool.clone()))
			.ok_or_else(|| GenericM2mError::NameNotFound(name.to_string()))
	}

	/// Ordered mapping from every stored name to its target handle
	pub async fn to_attr_map(&self) -> Result<IndexMap<String, ObjectHandle>> {
		let records = self.query().all().await?;
		let mut map = IndexMap::with_capacity(records.len());
		for record in records {
			let handle = record.object(self.core.pool.clone());
			if let Some(name) = record.name {
				map.insert(name, handle);
			}
		}
		Ok(map)
	}

	/// Target instances of type `T`, in association order
	pub async fn get_objects<T: RelatedModel>(&self) -> Result<Vec<T>> {
		self.core.get_objects::<T>().await
	}

	/// Primary keys of associated targets of type `T`
	pub async fn get_object_pks<T: RelatedModel>(&self) -> Result<Vec<ObjectPk>> {
		self.core.get_object_pks::<T>().await
	}

	/// Single associated target of type `T`, or `None`
	pub async fn get_object_or_none<T: RelatedModel>(&self, pk: Option<&str>) -> Result<Option<T>> {
		self.core.get_object_or_none::<T>(pk).await
	}

	async fn upsert(&self, name: &str, object: &ObjectRef) -> Result<()> {
		let now = Utc::now().to_rfc3339();
		let values: Vec<SimpleExpr> = vec![
			self.core.owner_value().into(),
			object.content_type_id.into(),
			object.object_id.clone().into(),
			name.into(),
			now.clone().into(),
			now.into(),
		];

		let mut stmt = Query::insert();
		stmt.into_table(Alias::new(&self.core.through.table_name))
			.columns([
				Alias::new(&self.core.through.owner_column),
				Alias::new("object_ct_id"),
				Alias::new("object_id"),
				Alias::new("name"),
				Alias::new("created_at"),
				Alias::new("changed_at"),
			])
			.values(values)
			.map_err(|e| {
				GenericM2mError::DatabaseError(format!("Failed to build upsert: {e}"))
			})?
			.on_conflict(
				OnConflict::columns([
					Alias::new(&self.core.through.owner_column),
					Alias::new("name"),
				])
				.update_columns([
					Alias::new("object_ct_id"),
					Alias::new("object_id"),
					Alias::new("changed_at"),
				])
				.to_owned(),
			);

		let sql = stmt.to_string(SqliteQueryBuilder);
		sqlx::query(&sql).execute(&*self.core.pool).await.map_err(|e| {
			GenericM2mError::DatabaseError(format!("Failed to upsert named association: {e}"))
		})?;
		tracing::debug!(
			table = %self.core.through.table_name,
			owner = %self.core.owner_pk,
			name = %name,
			"named association upserted"
		);
		Ok(())
	}
}

fn typed_pk_value<T: RelatedModel>(object_id: &str) -> Result<Value> {
	match T::pk_kind() {
		PkKind::AutoInt => object_id
			.parse::<i64>()
			.map(Value::from)
			.map_err(|_| GenericM2mError::PkCast {
				value: object_id.to_string(),
			}),
		PkKind::Text => Ok(object_id.into()),
	}
}

fn cast_pk<T: RelatedModel>(object_id: &str) -> Result<ObjectPk> {
	match T::pk_kind() {
		PkKind::AutoInt => object_id
			.parse::<i64>()
			.map(ObjectPk::Int)
			.map_err(|_| GenericM2mError::PkCast {
				value: object_id.to_string(),
			}),
		PkKind::Text => Ok(ObjectPk::Text(object_id.to_string())),
	}
}

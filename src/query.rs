//! Read-only query builder over an association table.
//!
//! [`RelatedObjectQuery`] is the "manager bound to the table as a whole"
//! capability set: filtering and retrieval, no mutation. Instance-scoped
//! mutation lives on the bound managers in [`crate::manager`].

use std::sync::Arc;

use sea_query::{Alias, BinOper, Condition, Expr, ExprTrait, Func, Order, Query, SqliteQueryBuilder};
use sqlx::{AnyPool, Row};

use crate::error::{GenericM2mError, Result};
use crate::models::{ObjectRef, PkKind, RelatedObject};
use crate::schema::AssociationTable;

#[derive(Clone)]
enum RelatedObjectFilter {
	Owner(String),
	ContentTypeId(i64),
	ObjectId(String),
	Name(String),
}

#[derive(Clone)]
enum OrderBy {
	Id(OrderDirection),
	CreatedAt(OrderDirection),
}

#[derive(Clone)]
enum OrderDirection {
	Asc,
	Desc,
}

/// Query builder for association records
///
/// Results come back in association order (ascending record id) unless an
/// explicit ordering is requested.
///
/// ## Example
///
/// ```rust,ignore
/// let records = field
///     .query(pool)
///     .filter_object(&ObjectRef::of(&author))
///     .all()
///     .await?;
/// ```
#[derive(Clone)]
pub struct RelatedObjectQuery {
	pool: Arc<AnyPool>,
	through: Arc<AssociationTable>,
	filters: Vec<RelatedObjectFilter>,
	order_by: Vec<OrderBy>,
	limit: Option<u64>,
	offset: Option<u64>,
}

impl RelatedObjectQuery {
	/// Create a query over the given association table
	pub fn new(pool: Arc<AnyPool>, through: Arc<AssociationTable>) -> Self {
		Self {
			pool,
			through,
			filters: Vec::new(),
			order_by: Vec::new(),
			limit: None,
			offset: None,
		}
	}

	/// Filter by owning instance primary key
	pub fn filter_owner(mut self, owner_pk: impl Into<String>) -> Self {
		self.filters.push(RelatedObjectFilter::Owner(owner_pk.into()));
		self
	}

	/// Filter by target content type id
	pub fn filter_content_type(mut self, content_type_id: i64) -> Self {
		self.filters
			.push(RelatedObjectFilter::ContentTypeId(content_type_id));
		self
	}

	/// Filter by target object id (text form)
	pub fn filter_object_id(mut self, object_id: impl Into<String>) -> Self {
		self.filters
			.push(RelatedObjectFilter::ObjectId(object_id.into()));
		self
	}

	/// Filter by target instance
	///
	/// Rewritten internally into the content-type + object-id filter pair.
	pub fn filter_object(self, object: &ObjectRef) -> Self {
		self.filter_content_type(object.content_type_id)
			.filter_object_id(object.object_id.clone())
	}

	/// Filter by association name (named variant)
	pub fn filter_name(mut self, name: impl Into<String>) -> Self {
		self.filters.push(RelatedObjectFilter::Name(name.into()));
		self
	}

	/// Sort by record id in ascending order
	pub fn order_by_id(mut self) -> Self {
		self.order_by.push(OrderBy::Id(OrderDirection::Asc));
		self
	}

	/// Sort by record id in descending order
	pub fn order_by_id_desc(mut self) -> Self {
		self.order_by.push(OrderBy::Id(OrderDirection::Desc));
		self
	}

	/// Sort by creation timestamp in ascending order
	pub fn order_by_created_at(mut self) -> Self {
		self.order_by.push(OrderBy::CreatedAt(OrderDirection::Asc));
		self
	}

	/// Sort by creation timestamp in descending order
	pub fn order_by_created_at_desc(mut self) -> Self {
		self.order_by.push(OrderBy::CreatedAt(OrderDirection::Desc));
		self
	}

	/// Limit the number of results
	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Set result offset
	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn filter_condition(&self, filter: &RelatedObjectFilter) -> Condition {
		match filter {
			RelatedObjectFilter::Owner(owner_pk) => {
				// Compare with the owner column's storage class so non-SQLite
				// backends do not reject an integer/text mismatch.
				let expr = match self.through.owner_pk_kind {
					PkKind::AutoInt => match owner_pk.parse::<i64>() {
						Ok(v) => Expr::col(Alias::new(&self.through.owner_column))
							.binary(BinOper::Equal, Expr::val(v)),
						Err(_) => Expr::col(Alias::new(&self.through.owner_column))
							.binary(BinOper::Equal, Expr::val(owner_pk.as_str())),
					},
					PkKind::Text => Expr::col(Alias::new(&self.through.owner_column))
						.binary(BinOper::Equal, Expr::val(owner_pk.as_str())),
				};
				Condition::all().add(expr)
			}
			RelatedObjectFilter::ContentTypeId(id) => Condition::all().add(
				Expr::col(Alias::new("object_ct_id")).binary(BinOper::Equal, Expr::val(*id)),
			),
			RelatedObjectFilter::ObjectId(object_id) => Condition::all().add(
				Expr::col(Alias::new("object_id"))
					.binary(BinOper::Equal, Expr::val(object_id.as_str())),
			),
			RelatedObjectFilter::Name(name) => Condition::all().add(
				Expr::col(Alias::new("name")).binary(BinOper::Equal, Expr::val(name.as_str())),
			),
		}
	}

	fn build_query(&self) -> String {
		let mut query = Query::select()
			.columns(self.through.select_columns())
			.from(Alias::new(&self.through.table_name))
			.to_owned();

		for filter in &self.filters {
			query.cond_where(self.filter_condition(filter));
		}

		if self.order_by.is_empty() {
			// Association order
			query.order_by(Alias::new("id"), Order::Asc);
		}
		for order in &self.order_by {
			match order {
				OrderBy::Id(direction) => {
					query.order_by(
						Alias::new("id"),
						match direction {
							OrderDirection::Asc => Order::Asc,
							OrderDirection::Desc => Order::Desc,
						},
					);
				}
				OrderBy::CreatedAt(direction) => {
					query.order_by(
						Alias::new("created_at"),
						match direction {
							OrderDirection::Asc => Order::Asc,
							OrderDirection::Desc => Order::Desc,
						},
					);
				}
			}
		}

		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}

		query.to_string(SqliteQueryBuilder)
	}

	/// Retrieve all matching records
	pub async fn all(&self) -> Result<Vec<RelatedObject>> {
		let sql = self.build_query();
		let rows = sqlx::query(&sql)
			.fetch_all(&*self.pool)
			.await
			.map_err(|e| GenericM2mError::DatabaseError(format!("Failed to execute query: {e}")))?;

		rows.iter()
			.map(|row| RelatedObject::from_any_row(row, &self.through))
			.collect()
	}

	/// Retrieve the first matching record
	pub async fn first(&self) -> Result<Option<RelatedObject>> {
		let mut query = self.clone();
		query.limit = Some(1);

		let results = query.all().await?;
		Ok(results.into_iter().next())
	}

	/// Count matching records
	pub async fn count(&self) -> Result<i64> {
		let mut count_query = Query::select()
			.expr_as(Func::count(Expr::col(Alias::new("id"))), Alias::new("count"))
			.from(Alias::new(&self.through.table_name))
			.to_owned();

		for filter in &self.filters {
			count_query.cond_where(self.filter_condition(filter));
		}

		let sql = count_query.to_string(SqliteQueryBuilder);
		let row = sqlx::query(&sql)
			.fetch_one(&*self.pool)
			.await
			.map_err(|e| GenericM2mError::DatabaseError(format!("Failed to count: {e}")))?;

		row.try_get("count")
			.map_err(|e| GenericM2mError::DatabaseError(format!("Invalid count: {e}")))
	}

	/// Check whether any record matches
	pub async fn exists(&self) -> Result<bool> {
		let count = self.count().await?;
		Ok(count > 0)
	}
}

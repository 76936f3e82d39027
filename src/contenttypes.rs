//! Content type registry for polymorphic relationships.
//!
//! A content type is a tag identifying which target model a given association
//! record points to. Association records persist the numeric content type id
//! only; resolving it back to a [`ContentType`] goes through the in-process
//! registry and never requires a database join.
//!
//! Model types are registered lazily the first time they participate in a
//! relation, via [`ContentTypeRegistry::get_or_create`]. Registration must
//! therefore happen in a deterministic order at startup if stable ids across
//! processes are required.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::RelatedModel;

/// Global content type registry
pub static CONTENT_TYPE_REGISTRY: Lazy<ContentTypeRegistry> = Lazy::new(ContentTypeRegistry::new);

/// A registered model type
///
/// `id` is `None` for a content type that has not been registered yet;
/// [`ContentTypeRegistry::register`] assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
	/// Registry-assigned identifier, stored in association records
	pub id: Option<i64>,
	/// Application label (e.g., "blog")
	pub app_label: String,
	/// Model name (e.g., "Post")
	pub model: String,
}

impl ContentType {
	/// Create an unregistered content type
	pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			id: None,
			app_label: app_label.into(),
			model: model.into(),
		}
	}
}

#[derive(Default)]
struct RegistryInner {
	by_key: HashMap<(String, String), i64>,
	by_id: HashMap<i64, ContentType>,
	next_id: i64,
}

/// Thread-safe in-memory content type registry
///
/// Ids are assigned sequentially starting at 1. Registering the same
/// (app_label, model) pair twice returns the existing entry.
pub struct ContentTypeRegistry {
	inner: RwLock<RegistryInner>,
}

impl ContentTypeRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self {
			inner: RwLock::new(RegistryInner::default()),
		}
	}

	/// Register a content type, assigning an id if it has none
	///
	/// Idempotent: an already-registered (app_label, model) pair returns the
	/// stored entry unchanged.
	pub fn register(&self, content_type: ContentType) -> ContentType {
		let mut inner = self.inner.write();
		let key = (content_type.app_label.clone(), content_type.model.clone());
		if let Some(id) = inner.by_key.get(&key) {
			return inner.by_id[id].clone();
		}
		inner.next_id += 1;
		let id = inner.next_id;
		let registered = ContentType {
			id: Some(id),
			..content_type
		};
		inner.by_key.insert(key, id);
		inner.by_id.insert(id, registered.clone());
		registered
	}

	/// Look up a content type by app label and model name
	pub fn get(&self, app_label: &str, model: &str) -> Option<ContentType> {
		let inner = self.inner.read();
		let id = inner
			.by_key
			.get(&(app_label.to_string(), model.to_string()))?;
		inner.by_id.get(id).cloned()
	}

	/// Look up a content type by id
	pub fn get_by_id(&self, id: i64) -> Option<ContentType> {
		self.inner.read().by_id.get(&id).cloned()
	}

	/// Return the registered content type, creating it if absent
	pub fn get_or_create(&self, app_label: &str, model: &str) -> ContentType {
		if let Some(existing) = self.get(app_label, model) {
			return existing;
		}
		self.register(ContentType::new(app_label, model))
	}

	/// Return the content type for a model type
	pub fn get_for_model<T: RelatedModel>(&self) -> ContentType {
		self.get_or_create(T::app_label(), T::model_name())
	}

	/// Return the content type id for a model type, registering it if absent
	pub fn id_for_model<T: RelatedModel>(&self) -> i64 {
		let mut inner = self.inner.write();
		let key = (T::app_label().to_string(), T::model_name().to_string());
		if let Some(id) = inner.by_key.get(&key) {
			return *id;
		}
		inner.next_id += 1;
		let id = inner.next_id;
		inner.by_key.insert(key, id);
		inner.by_id.insert(
			id,
			ContentType {
				id: Some(id),
				app_label: T::app_label().to_string(),
				model: T::model_name().to_string(),
			},
		);
		id
	}
}

impl Default for ContentTypeRegistry {
	fn default() -> Self {
		Self::new()
	}
}

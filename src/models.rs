//! Model definitions for the generic many-to-many system
//!
//! This module contains the core data models:
//! - `RelatedModel`: Trait for model types that can participate in relations
//! - `ObjectRef` / `ObjectPk`: Value handles for target instances and their keys
//! - `RelatedObject`: The association record linking an owner to a target
//! - `ObjectHandle`: Lazily-resolving handle to a stored target

pub mod related_model;
pub mod related_object;

pub use related_model::{ObjectPk, ObjectRef, PkKind, RelatedModel};
pub use related_object::{ObjectHandle, RelatedObject};

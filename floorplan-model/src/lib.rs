//! Core entity/state model for the floorplan document.
//!
//! Defines the machinery every mutable design object is built on:
//! - [`StateField`] / [`StateArena`]: uniquely identified, shareable values
//! - [`EntityClass`] / [`EntityRegistry`]: class-tag dispatch to concrete entity kinds
//! - [`Entity`] / [`Document`]: the document graph and its single notification path
//! - dirty propagation ([`DirtyEvent`], [`DirtyObserver`], [`GenerationToken`])
//! - [`io`]: the versioned dump/load contract with shared-state resolution
//!
//! Mutation of field values only happens through [`Document`], which notifies
//! every bound owner via [`EntityClass::on_field_changed`] and dirties it when
//! the change affects derived data.

mod class;
mod dirty;
mod document;
mod entity;
mod error;
mod field;
pub mod io;
mod registry;
mod state;

pub use class::{EntityClass, FieldChange, VerifyFailure, verify_fields};
pub use dirty::{DirtyEvent, DirtyObserver, DirtyState, GenerationToken};
pub use document::Document;
pub use entity::{Entity, EntityLifecycle};
pub use error::{ModelError, ModelResult};
pub use field::{
    Constraint, FieldDefault, FieldKey, FieldSpec, FieldStorage, NUMBER_TOLERANCE,
    values_nearly_equal,
};
pub use registry::EntityRegistry;
pub use state::{FieldBinding, StateArena, StateField};

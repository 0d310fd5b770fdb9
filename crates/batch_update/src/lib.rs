//! # batch_update
//!
//! Declarative batch updates for element handles.
//!
//! A [`Descriptor`] says what should change; the engine works out how:
//! - [`classify`] splits index-targeted keys (`"0"`, `"-1"`) from bulk keys
//! - [`index`] resolves negative positions against a snapshot length
//! - [`ElementApplier`] turns each bulk key into an [`UpdateOperation`] and
//!   applies it, confining failures to the key that caused them
//! - [`update_collection`] applies bulk entries to every element, then
//!   indexed entries to their resolved elements, and reports counts
//! - [`EnhancementGuard`] attaches update capability at most once per handle
//!   or collection
//!
//! The host side (how handles are stored, found and mutated) sits behind
//! [`ElementHandle`], [`HandleCollection`] and [`HandleSource`].

pub mod classify;
pub mod index;
pub mod operation;

mod apply;
mod collection;
mod config;
mod enhance;
mod error;
mod handle;
mod value;

#[cfg(test)]
mod test_support;

pub use crate::apply::{ElementApplier, ElementReport, PlannedUpdate, apply_element};
pub use crate::classify::{Classified, IndexedEntry, classify, is_index_key, parse_index_key};
pub use crate::collection::{
    ApplyFn, ApplyResult, ApplyStats, CollectionUpdater, IndexedStats, update_collection,
};
pub use crate::config::ApplyConfig;
pub use crate::enhance::{
    Enhanced, EnhancedBy, EnhancedCollection, EnhancementFacility, EnhancementGuard,
};
pub use crate::error::{ApplyError, StructuralInputError};
pub use crate::handle::{
    ElementHandle, HandleCollection, HandleError, HandleSource, LifeToken, ListenerOptions, Query,
    Slot, StaticCollection,
};
pub use crate::operation::{
    AttributeChange, ClassAction, EventOp, ListenerSpec, UpdateOperation, classify_operation,
};
pub use crate::value::{Descriptor, Event, EventHandler, Value, format_number};
pub use core_types::{CollectionKey, HandleKey};

//! Collection-wide updates.
//!
//! Ordering contract: every bulk entry is applied to every element before
//! any indexed entry runs, so an indexed entry always overrides a bulk entry
//! for the same property at that position. Indices are resolved against the
//! snapshot taken at the start of the call, never against the live source.

use crate::apply::ElementApplier;
use crate::classify::classify;
use crate::error::{ApplyError, StructuralInputError};
use crate::handle::{ElementHandle, HandleCollection, HandleSource, Query, Slot};
use crate::index::resolve_checked;
use crate::value::{Descriptor, Value};

const LOG_TARGET: &str = "batch_update.collection";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexedStats {
    pub successful: usize,
    pub failed: usize,
    pub out_of_bounds: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ApplyStats {
    /// Elements that received the bulk portion.
    pub bulk_update_count: usize,
    pub indexed: IndexedStats,
    pub collection_length: usize,
}

/// Outcome of one collection update.
///
/// `success` is false only for structural input errors; element-level
/// problems show up in `stats`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ApplyResult {
    pub success: bool,
    pub error: Option<StructuralInputError>,
    pub is_empty: bool,
    pub stats: ApplyStats,
}

impl ApplyResult {
    fn structural(error: StructuralInputError) -> Self {
        Self {
            success: false,
            error: Some(error),
            is_empty: false,
            stats: ApplyStats::default(),
        }
    }

    fn empty() -> Self {
        Self {
            success: true,
            error: None,
            is_empty: true,
            stats: ApplyStats::default(),
        }
    }

    pub fn into_result(self) -> Result<ApplyStats, StructuralInputError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }
}

/// Per-element apply step used by the orchestrator.
pub type ApplyFn<'a, H> = dyn FnMut(&mut H, &Descriptor) -> Result<(), ApplyError> + 'a;

/// Apply `descriptor` across `collection`.
///
/// Never panics on bad input: a missing collection, a non-map descriptor
/// or a missing apply step come back as a structural error in the result.
pub fn update_collection<C: HandleCollection + ?Sized>(
    collection: Option<&C>,
    descriptor: &Value,
    apply: Option<&mut ApplyFn<'_, C::Handle>>,
) -> ApplyResult {
    let Some(collection) = collection else {
        return ApplyResult::structural(StructuralInputError::MissingCollection);
    };
    let Some(descriptor) = descriptor.as_map() else {
        return ApplyResult::structural(StructuralInputError::DescriptorNotObject);
    };
    let Some(apply) = apply else {
        return ApplyResult::structural(StructuralInputError::MissingApplyFn);
    };

    let mut slots = collection.materialize();
    if slots.is_empty() {
        log::debug!(target: LOG_TARGET, "empty collection; nothing to update");
        return ApplyResult::empty();
    }

    let length = slots.len();
    let classified = classify(descriptor);
    let mut stats = ApplyStats {
        collection_length: length,
        ..ApplyStats::default()
    };

    if classified.has_bulk() {
        for (position, slot) in slots.iter_mut().enumerate() {
            let Some(element) = slot.as_element_mut() else {
                log::debug!(target: LOG_TARGET, "slot {position} holds no element; bulk skipped");
                continue;
            };
            match apply(element, &classified.bulk) {
                Ok(()) => stats.bulk_update_count += 1,
                Err(err) => {
                    log::warn!(target: LOG_TARGET, "bulk update failed at {position}: {err}")
                }
            }
        }
    }

    for entry in &classified.indexed {
        let Some(position) = resolve_checked(entry.index, length) else {
            log::warn!(
                target: LOG_TARGET,
                "index {} out of bounds for collection of length {length}",
                entry.key
            );
            stats.indexed.out_of_bounds += 1;
            continue;
        };
        let Some(nested) = entry.value.as_map() else {
            log::warn!(
                target: LOG_TARGET,
                "index {} expects a nested descriptor, got {}",
                entry.key,
                entry.value.kind()
            );
            stats.indexed.failed += 1;
            continue;
        };
        let Slot::Element(element) = &mut slots[position] else {
            log::warn!(
                target: LOG_TARGET,
                "index {} resolved to {position}, which holds no element",
                entry.key
            );
            stats.indexed.failed += 1;
            continue;
        };
        match apply(element, nested) {
            Ok(()) => stats.indexed.successful += 1,
            Err(err) => {
                log::warn!(target: LOG_TARGET, "indexed update {} failed: {err}", entry.key);
                stats.indexed.failed += 1;
            }
        }
    }

    log::debug!(
        target: LOG_TARGET,
        "updated collection of {length}: bulk={} indexed={:?}",
        stats.bulk_update_count,
        stats.indexed
    );
    ApplyResult {
        success: true,
        error: None,
        is_empty: false,
        stats,
    }
}

/// Orchestrator bound to an [`ElementApplier`].
#[derive(Clone, Debug, Default)]
pub struct CollectionUpdater {
    applier: ElementApplier,
}

impl CollectionUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_applier(applier: ElementApplier) -> Self {
        Self { applier }
    }

    pub fn applier(&self) -> &ElementApplier {
        &self.applier
    }

    pub fn update<C: HandleCollection + ?Sized>(
        &self,
        collection: &C,
        descriptor: &Descriptor,
    ) -> ApplyResult {
        self.update_value(Some(collection), &Value::Map(descriptor.clone()))
    }

    /// Entry point for untyped input, e.g. descriptors decoded from JSON.
    pub fn update_value<C: HandleCollection + ?Sized>(
        &self,
        collection: Option<&C>,
        descriptor: &Value,
    ) -> ApplyResult {
        let mut apply = |element: &mut C::Handle, d: &Descriptor| -> Result<(), ApplyError> {
            self.applier.apply(element, d);
            Ok(())
        };
        update_collection(collection, descriptor, Some(&mut apply))
    }

    pub fn update_element<'h, H: ElementHandle + ?Sized>(
        &self,
        element: &'h mut H,
        descriptor: &Descriptor,
    ) -> &'h mut H {
        self.applier.apply(element, descriptor)
    }

    /// Resolve `query` through `source`, then update the resulting collection.
    pub fn update_query<S: HandleSource>(
        &self,
        source: &S,
        query: &Query,
        descriptor: &Descriptor,
    ) -> ApplyResult {
        let collection = source.collection(query);
        self.update(&collection, descriptor)
    }

    /// Returns `false` when no element has that id.
    pub fn update_by_id<S: HandleSource>(
        &self,
        source: &S,
        id: &str,
        descriptor: &Descriptor,
    ) -> bool {
        let Some(mut element) = source.element_by_id(id) else {
            log::warn!(target: LOG_TARGET, "no element with id '{id}'");
            return false;
        };
        self.applier.apply(&mut element, descriptor);
        true
    }
}
